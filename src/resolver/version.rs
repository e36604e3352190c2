//! Tolerant semantic-version parsing and "latest" selection.

use semver::Version;

/// Parses `input` as a semantic version, accepting common sloppy forms.
///
/// Leading/trailing whitespace and a leading `v` are stripped, missing minor or
/// patch components are filled with `0`, and leading zeros in numeric
/// components are dropped. `"v2.26"` parses as `2.26.0`.
///
/// # Errors
///
/// Returns the [`semver::Error`] from parsing the normalized string.
pub fn parse_tolerant(input: &str) -> Result<Version, semver::Error> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let split_at = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split_at);

    let mut parts: Vec<String> = core.split('.').map(strip_leading_zeros).collect();
    while parts.len() < 3 {
        parts.push("0".to_string());
    }

    Version::parse(&format!("{}{suffix}", parts.join(".")))
}

fn strip_leading_zeros(part: &str) -> String {
    if part.len() > 1 && part.chars().all(|c| c.is_ascii_digit()) {
        let stripped = part.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        part.to_string()
    }
}

/// Returns the candidate with the strictly greatest version.
///
/// Ties keep the earliest candidate.
pub fn pick_latest<T>(candidates: impl IntoIterator<Item = (Version, T)>) -> Option<(Version, T)> {
    let mut latest: Option<(Version, T)> = None;
    for (version, item) in candidates {
        let newer = latest
            .as_ref()
            .is_none_or(|(current, _)| version > *current);
        if newer {
            latest = Some((version, item));
        }
    }
    latest
}
