//! Archive kinds, chosen purely from the file name.

use std::fmt;

const UNZIP_ARGS: &[&str] = &["-o"];
const GZIP_TAR_ARGS: &[&str] = &["-xzf"];
const BZIP2_TAR_ARGS: &[&str] = &["-xjf"];

/// Archive formats the postprocessor knows how to unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// `.zip`
    Zip,
    /// `.tar.gz`, `.gz`
    GzipTar,
    /// `.tar.bz2`, `.bz2`
    Bzip2Tar,
}

impl ArchiveKind {
    /// Maps a file name to its archive kind.
    ///
    /// Suffixes match case-sensitively. Returns `None` for anything else
    /// (e.g. a `.jar` or `.tgz`), which is used as-is.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        if file_name.ends_with(".zip") {
            Some(Self::Zip)
        } else if file_name.ends_with(".gz") {
            Some(Self::GzipTar)
        } else if file_name.ends_with(".bz2") {
            Some(Self::Bzip2Tar)
        } else {
            None
        }
    }

    /// External tool and its fixed leading arguments; the archive path follows.
    #[must_use]
    pub fn command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Zip => ("unzip", UNZIP_ARGS),
            Self::GzipTar => ("tar", GZIP_TAR_ARGS),
            Self::Bzip2Tar => ("tar", BZIP2_TAR_ARGS),
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Zip => "zip",
            Self::GzipTar => "tar.gz",
            Self::Bzip2Tar => "tar.bz2",
        };
        f.write_str(label)
    }
}
