//! Shared line-classification helpers.

use regex::Regex;
use std::sync::LazyLock;

/// Returns `true` if `trimmed` matches a rendered man page title banner token
/// (e.g. `GIT-REBASE(1)` or `STAT(1)`).
///
/// Only the first whitespace-separated token is inspected so full title lines
/// like `GIT-REBASE(1)  Git Manual  GIT-REBASE(1)` also match.
pub fn looks_like_man_title_line(trimmed: &str) -> bool {
    let first = trimmed.split_whitespace().next().unwrap_or_default();
    is_man_title_token(first)
}

fn is_man_title_token(token: &str) -> bool {
    if !token.ends_with(')') {
        return false;
    }
    let Some(paren_idx) = token.rfind('(') else {
        return false;
    };
    if paren_idx == 0 {
        return false;
    }
    let name = &token[..paren_idx];
    let section = &token[paren_idx + 1..token.len() - 1];
    name.chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '+'))
        && !section.is_empty()
        && section
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch.is_ascii_alphabetic())
}

/// Returns `true` for man page header/footer banners: lines ending in `()`
/// (as `AWS()` renders) or whose first or last token is a `NAME(1)` title.
pub fn is_man_banner(trimmed: &str) -> bool {
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.ends_with("()") {
        return true;
    }
    looks_like_man_title_line(trimmed)
        || trimmed
            .split_whitespace()
            .last()
            .is_some_and(is_man_title_token)
}

/// Returns the first `http://` or `https://` URL in `text`.
pub fn first_url(text: &str) -> Option<String> {
    // SAFETY: This regex is a compile-time constant and is validated by tests.
    static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"https?://[^\s<>"'`)\]]+"#).expect("static regex must compile")
    });
    URL_RE
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':']).to_string())
}

/// Strips a leading single-letter availability marker (`D  text`) from a
/// flag description.
pub fn strip_availability_marker(description: &str) -> &str {
    let mut chars = description.char_indices();
    match (chars.next(), chars.next(), chars.next()) {
        (Some((_, marker)), Some((_, ' ')), Some((_, ' '))) if marker.is_ascii_uppercase() => {
            description[2..].trim_start()
        }
        _ => description,
    }
}

/// Number of leading ASCII whitespace characters.
pub fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Returns `true` for an unindented all-caps heading such as `OPTIONS` or
/// `SEE ALSO`.
pub fn is_uppercase_heading(line: &str) -> bool {
    let trimmed = line.trim_end();
    indent_width(trimmed) == 0
        && trimmed.len() >= 3
        && trimmed.chars().any(|ch| ch.is_ascii_uppercase())
        && trimmed
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch == ' ' || ch == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_title_token() {
        assert!(looks_like_man_title_line("GIT-REBASE(1)"));
        assert!(looks_like_man_title_line("STAT(1)"));
        assert!(looks_like_man_title_line(
            "GIT-REBASE(1)                     Git Manual                     GIT-REBASE(1)"
        ));
    }

    #[test]
    fn test_rejects_empty_and_invalid_titles() {
        assert!(!looks_like_man_title_line(""));
        assert!(!looks_like_man_title_line("no-parens"));
        assert!(!looks_like_man_title_line("(1)"));
    }

    #[test]
    fn test_man_banner_footer_forms() {
        assert!(is_man_banner("AWS()"));
        assert!(is_man_banner("                                 AWS()"));
        assert!(is_man_banner("GNU coreutils 9.4       March 2024       LS(1)"));
        assert!(!is_man_banner("Use \"kubectl [command] --help\" for more information."));
    }

    #[test]
    fn test_first_url_trims_trailing_punctuation() {
        assert_eq!(
            first_url("Find more information at: https://kubernetes.io/docs/reference/kubectl/."),
            Some("https://kubernetes.io/docs/reference/kubectl/".to_string())
        );
        assert_eq!(first_url("(see <https://example.com/x>)").as_deref(), Some("https://example.com/x"));
        assert_eq!(first_url("no links here"), None);
    }

    #[test]
    fn test_strip_availability_marker() {
        assert_eq!(strip_availability_marker("D  deprecated flag"), "deprecated flag");
        assert_eq!(strip_availability_marker("Do the thing"), "Do the thing");
        assert_eq!(strip_availability_marker("A"), "A");
    }

    #[test]
    fn test_uppercase_heading() {
        assert!(is_uppercase_heading("OPTIONS"));
        assert!(is_uppercase_heading("AVAILABLE SERVICES"));
        assert!(!is_uppercase_heading("   OPTIONS"));
        assert!(!is_uppercase_heading("Options"));
        assert!(!is_uppercase_heading("ID"));
    }
}
