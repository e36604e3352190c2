//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Fetch the browsers, drivers and Selenium server integration tests need.
///
/// Pinned artifacts are verified against their SHA-256 digests; the latest
/// geckodriver, Selenium server and Chromium snapshot are looked up at run
/// time. Files already present and valid are not downloaded again.
#[derive(Parser, Debug)]
#[command(name = "testprep")]
#[command(author, version, about)]
pub struct Args {
    /// Download the Firefox and Chrome browser builds (default: true)
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub download_browsers: Option<bool>,

    /// Directory to download and extract into (default: current directory)
    #[arg(short = 'C', long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Config file (default: $XDG_CONFIG_HOME/testprep/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Resolve every artifact and print the plan without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
