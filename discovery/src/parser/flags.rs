//! Flag line extractors.
//!
//! Each extractor recognizes one dialect of flag row and is tried in
//! [`FLAG_EXTRACTORS`] order; the first match wins.

use regex::Regex;
use std::sync::LazyLock;

use treemand_core::Flag;

use super::util::strip_availability_marker;

/// A flag recognized on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagLine {
    pub flag: Flag,
    /// The description is on a following line (man-page bulleted dialect).
    pub description_follows: bool,
}

pub type FlagExtractor = fn(&str) -> Option<FlagLine>;

/// Extractors in priority order.
pub const FLAG_EXTRACTORS: &[FlagExtractor] = &[man_bulleted_flag, long_flag, short_only_flag];

/// Runs [`FLAG_EXTRACTORS`] against `line`.
pub fn extract_flag(line: &str) -> Option<FlagLine> {
    FLAG_EXTRACTORS.iter().find_map(|extract| extract(line))
}

static PATTERNS: LazyLock<FlagPatterns> = LazyLock::new(FlagPatterns::new);

struct FlagPatterns {
    man_bulleted: Regex,
    long: Regex,
    short_only: Regex,
}

impl FlagPatterns {
    fn new() -> Self {
        Self {
            // --endpoint-url (string)
            man_bulleted: Regex::new(r"^\s*(--[A-Za-z0-9][A-Za-z0-9_.-]*)\s+\(([^)]+)\)\s*$")
                .expect("static regex must compile"),
            // -n, --namespace string   desc
            // --color[=WHEN]           desc
            // --log <path>             desc
            long: Regex::new(concat!(
                r"^\s*(?:-([A-Za-z0-9?])(?:,\s*|\s+))?",
                r"(--[A-Za-z0-9][A-Za-z0-9_.-]*)",
                r"(?:",
                r"\[=([^\]]+)\]",
                r"|=<([^>]+)>",
                r"|=([A-Za-z][A-Za-z0-9_-]*)",
                r"|\s<([^>]+)>",
                r"|\s\[([^\]]+)\]",
                r"|\s([A-Za-z][A-Za-z0-9_.|-]*)",
                r")?",
                r"(?:\s{2,}(\S.*?))?\s*$",
            ))
            .expect("static regex must compile"),
            // -l                       desc
            // -C <path>                desc
            short_only: Regex::new(concat!(
                r"^\s*-([A-Za-z0-9?])",
                r"(?:\s<([^>]+)>|\s\[<?([^\]>]+)>?\]|\s([A-Z][A-Z0-9_-]*))?",
                r"(?:\s{2,}(\S.*?))?\s*$",
            ))
            .expect("static regex must compile"),
        }
    }
}

/// Man-page bulleted dialect: `--flag (type)` with the description on a
/// later line.
pub fn man_bulleted_flag(line: &str) -> Option<FlagLine> {
    let caps = PATTERNS.man_bulleted.captures(line)?;
    let flag = Flag::new(&caps[1]).with_value_type(normalize_value_type(&caps[2]));
    Some(FlagLine {
        flag,
        description_follows: true,
    })
}

/// Long flag with optional short alias and value slot.
pub fn long_flag(line: &str) -> Option<FlagLine> {
    let caps = PATTERNS.long.captures(line)?;
    let mut flag = Flag::new(&caps[2]);
    if let Some(short) = caps.get(1) {
        flag.short_name = Some(short.as_str().to_string());
    }
    if let Some(value) = (3..=8).find_map(|i| caps.get(i)) {
        flag.value_type = normalize_value_type(value.as_str());
    }
    if let Some(desc) = caps.get(9) {
        flag.description = clean_description(desc.as_str());
    }
    Some(FlagLine {
        flag,
        description_follows: false,
    })
}

/// Short-only flag such as `-l` or `-C <path>`.
pub fn short_only_flag(line: &str) -> Option<FlagLine> {
    let caps = PATTERNS.short_only.captures(line)?;
    let mut flag = Flag::new(format!("-{}", &caps[1]));
    if let Some(value) = (2..=4).find_map(|i| caps.get(i)) {
        flag.value_type = normalize_value_type(value.as_str());
    }
    if let Some(desc) = caps.get(5) {
        flag.description = clean_description(desc.as_str());
    }
    Some(FlagLine {
        flag,
        description_follows: false,
    })
}

/// Lower-cases all-caps placeholders (`WHEN` → `when`); other spellings are
/// kept as written.
fn normalize_value_type(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().any(|c| c.is_ascii_lowercase()) {
        trimmed.to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

pub(crate) fn clean_description(raw: &str) -> String {
    strip_availability_marker(raw.trim()).to_string()
}
