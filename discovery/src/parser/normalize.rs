//! Help-text normalization.

use regex::Regex;
use std::sync::LazyLock;

/// Strips ANSI escapes and man-page overstrike sequences, unifies line
/// endings, and trims trailing whitespace from every line.
pub fn normalize_help_output(raw: &str) -> String {
    // SAFETY: These regexes are compile-time constants and are validated by tests.
    static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("static regex must compile")
    });
    static OVERSTRIKE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r".\x08").expect("static regex must compile"));

    let stripped = ANSI_RE.replace_all(raw, "");
    let mut cleaned = stripped.into_owned();
    while OVERSTRIKE_RE.is_match(&cleaned) {
        cleaned = OVERSTRIKE_RE.replace_all(&cleaned, "").into_owned();
    }
    cleaned
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', "        ")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_ansi_and_overstrike() {
        let raw = "\x1b[1mUsage:\x1b[0m tool\r\nN\x08NA\x08AM\x08ME\x08E  \n";
        assert_eq!(normalize_help_output(raw), "Usage: tool\nNAME");
    }

    #[test]
    fn test_expands_tabs() {
        assert_eq!(normalize_help_output("\t-v\tverbose"), "        -v        verbose");
    }
}
