//! Application configuration loading and merging with CLI flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use testprep::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use testprep::resolver::{
    DEFAULT_GITHUB_API_URL, DEFAULT_STORAGE_API_URL, RESOLVER_CONNECT_TIMEOUT_SECS,
    RESOLVER_REQUEST_TIMEOUT_SECS, ResolverEndpoints,
};
use url::Url;

use crate::cli::Args;

const APP_DIR: &str = "testprep";

/// `key = value` file configuration for testprep defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    /// Whether browser builds are downloaded.
    pub download_browsers: Option<bool>,
    /// Directory to download and extract into.
    pub work_dir: Option<PathBuf>,
    /// Releases API base URL.
    pub github_api_url: Option<String>,
    /// Object-store API base URL.
    pub storage_api_url: Option<String>,
    /// Download client connect timeout in seconds.
    pub download_connect_timeout_secs: Option<u64>,
    /// Download client read timeout in seconds.
    pub download_read_timeout_secs: Option<u64>,
    /// Resolver client connect timeout in seconds.
    pub resolver_connect_timeout_secs: Option<u64>,
    /// Resolver client read timeout in seconds.
    pub resolver_request_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        validate_timeout_secs(
            "download_connect_timeout_secs",
            self.download_connect_timeout_secs,
        )?;
        validate_timeout_secs("download_read_timeout_secs", self.download_read_timeout_secs)?;
        validate_timeout_secs(
            "resolver_connect_timeout_secs",
            self.resolver_connect_timeout_secs,
        )?;
        validate_timeout_secs("resolver_request_timeout_secs", self.resolver_request_timeout_secs)?;
        validate_base_url("github_api_url", self.github_api_url.as_deref())?;
        validate_base_url("storage_api_url", self.storage_api_url.as_deref())?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

fn validate_base_url(field: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    let parsed = Url::parse(value)
        .with_context(|| format!("Invalid config value for `{field}`: '{value}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("Invalid config value for `{field}`: '{value}'. Expected an http(s) URL");
    }
    Ok(())
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Config path that was consulted, if any.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/testprep/config.toml`
/// 2. `$HOME/.config/testprep/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let config = match path.as_deref() {
        Some(path_ref) if path_ref.exists() => Some(load_file_config(path_ref)?),
        _ => None,
    };
    Ok(LoadedConfig { path, config })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_number = line_index + 1;
        let invalid = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "download_browsers" => {
                cfg.download_browsers = Some(parse_boolean(value).with_context(invalid)?);
            }
            "work_dir" => {
                let parsed = parse_string_literal(value).with_context(invalid)?;
                cfg.work_dir = Some(PathBuf::from(parsed));
            }
            "github_api_url" => {
                cfg.github_api_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "storage_api_url" => {
                cfg.storage_api_url = Some(parse_string_literal(value).with_context(invalid)?);
            }
            "download_connect_timeout_secs" => {
                cfg.download_connect_timeout_secs =
                    Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "download_read_timeout_secs" => {
                cfg.download_read_timeout_secs =
                    Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "resolver_connect_timeout_secs" => {
                cfg.resolver_connect_timeout_secs =
                    Some(parse_integer_u64(value).with_context(invalid)?);
            }
            "resolver_request_timeout_secs" => {
                cfg.resolver_request_timeout_secs =
                    Some(parse_integer_u64(value).with_context(invalid)?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

/// Effective settings for one run: CLI flags over file values over defaults.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Whether browser builds are downloaded.
    pub download_browsers: bool,
    /// Directory to download and extract into.
    pub work_dir: PathBuf,
    /// Resolver endpoints (the token is filled in by the caller).
    pub endpoints: ResolverEndpoints,
    /// Download client `(connect, read)` timeouts in seconds.
    pub download_timeouts: (u64, u64),
    /// Resolver client `(connect, read)` timeouts in seconds.
    pub resolver_timeouts: (u64, u64),
}

impl RunSettings {
    /// Merges CLI arguments with an optional file config.
    #[must_use]
    pub fn merge(args: &Args, file: Option<&FileConfig>) -> Self {
        let file = file.cloned().unwrap_or_default();
        Self {
            download_browsers: args
                .download_browsers
                .or(file.download_browsers)
                .unwrap_or(true),
            work_dir: args
                .work_dir
                .clone()
                .or(file.work_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            endpoints: ResolverEndpoints {
                github_api_url: file
                    .github_api_url
                    .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
                storage_api_url: file
                    .storage_api_url
                    .unwrap_or_else(|| DEFAULT_STORAGE_API_URL.to_string()),
                github_token: None,
            },
            download_timeouts: (
                file.download_connect_timeout_secs
                    .unwrap_or(CONNECT_TIMEOUT_SECS),
                file.download_read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
            ),
            resolver_timeouts: (
                file.resolver_connect_timeout_secs
                    .unwrap_or(RESOLVER_CONNECT_TIMEOUT_SECS),
                file.resolver_request_timeout_secs
                    .unwrap_or(RESOLVER_REQUEST_TIMEOUT_SECS),
            ),
        }
    }
}
