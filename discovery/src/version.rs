//! Version probing used to key cached trees.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::fetch::ProcessHelpFetcher;

/// Reported when the version cannot be determined.
pub const UNKNOWN_VERSION: &str = "unknown";

const MAX_VERSION_LEN: usize = 64;

/// Runs `<binary> --version` and returns the first non-empty output line,
/// truncated to 64 characters, or [`UNKNOWN_VERSION`].
pub fn cli_version(binary: &Path, timeout: Duration) -> String {
    let fetcher = ProcessHelpFetcher::new(binary).with_timeout(timeout);
    match fetcher.run_once(&["--version".to_string()], &CancelToken::new()) {
        Ok(output) => version_line(&output),
        Err(e) => {
            debug!(binary = %binary.display(), error = %e, "Version probe failed");
            UNKNOWN_VERSION.to_string()
        }
    }
}

/// Extracts the version line from `--version` output.
pub fn version_line(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(MAX_VERSION_LEN).collect())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}
