//! Section header recognition.
//!
//! A header is either a trimmed line ending in `:` (`Available Commands:`,
//! `General options:`) or, in man-page output, an unindented all-caps line
//! (`OPTIONS`, `AVAILABLE SERVICES`). Header text is matched against
//! [`HEADER_KEYWORDS`] exactly, then by suffix, then by prefix.

use super::ParseState;
use super::util::is_uppercase_heading;

/// Headers longer than this only match exactly, so long prose or usage lines
/// that happen to end with `:` are not mistaken for section headers.
const MAX_FUZZY_HEADER_LEN: usize = 30;

/// Header keywords and the state they switch to. Order matters for suffix
/// and prefix matching: the first hit wins.
pub const HEADER_KEYWORDS: &[(&str, ParseState)] = &[
    ("usage", ParseState::Usage),
    ("use", ParseState::Usage),
    ("synopsis", ParseState::Usage),
    ("description", ParseState::Description),
    ("available commands", ParseState::Commands),
    ("management commands", ParseState::Commands),
    ("available services", ParseState::Commands),
    ("subcommands", ParseState::Commands),
    ("commands", ParseState::Commands),
    ("global flags", ParseState::Flags),
    ("global options", ParseState::Flags),
    ("optional arguments", ParseState::Flags),
    ("flags", ParseState::Flags),
    ("options", ParseState::Flags),
    ("positional arguments", ParseState::Arguments),
    ("arguments", ParseState::Arguments),
    ("examples", ParseState::Examples),
    ("example", ParseState::Examples),
    ("aliases", ParseState::Aliases),
];

/// Flag headers that name no particular group; entering `Flags` through one
/// of these does not start a named section.
const GENERIC_FLAG_HEADERS: &[&str] = &[
    "flags",
    "options",
    "global flags",
    "global options",
    "optional arguments",
];

/// A recognized section header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub state: ParseState,
    /// Set for human-readable flag headers such as `General options`.
    pub section: Option<String>,
}

/// Classifies `line` as a section header, if it is one.
pub fn classify_header(line: &str) -> Option<Header> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return None;
    }

    let text = if let Some(stripped) = trimmed.strip_suffix(':') {
        stripped.trim_end()
    } else if is_uppercase_heading(line) {
        trimmed
    } else {
        return None;
    };
    if text.is_empty() {
        return None;
    }

    let lower = text.to_ascii_lowercase();
    let state = match_keyword(&lower)?;
    let section = (state == ParseState::Flags && !GENERIC_FLAG_HEADERS.contains(&lower.as_str()))
        .then(|| text.to_string());
    Some(Header { state, section })
}

fn match_keyword(lower: &str) -> Option<ParseState> {
    if let Some((_, state)) = HEADER_KEYWORDS.iter().find(|(kw, _)| *kw == lower) {
        return Some(*state);
    }
    if lower.len() > MAX_FUZZY_HEADER_LEN {
        return None;
    }
    HEADER_KEYWORDS
        .iter()
        .find(|(kw, _)| {
            lower
                .strip_suffix(kw)
                .is_some_and(|head| head.ends_with(' '))
        })
        .or_else(|| {
            HEADER_KEYWORDS.iter().find(|(kw, _)| {
                lower
                    .strip_prefix(kw)
                    .is_some_and(|tail| tail.starts_with(' '))
            })
        })
        .map(|(_, state)| *state)
}
