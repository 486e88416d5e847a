//! Positional argument extraction from usage lines and `Arguments:` rows.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use treemand_core::Positional;

/// Bracketed words in usage lines that stand for options or subcommands
/// rather than positional arguments.
pub const PLACEHOLDER_WORDS: &[&str] = &[
    "OPTION",
    "OPTIONS",
    "OPTS",
    "ARG",
    "ARGS",
    "ARGUMENTS",
    "FLAG",
    "FLAGS",
    "COMMAND",
    "COMMANDS",
    "SUBCOMMAND",
    "PARAMETERS",
    "GLOBAL OPTIONS",
    "GLOBAL FLAGS",
];

static PATTERNS: LazyLock<UsagePatterns> = LazyLock::new(UsagePatterns::new);

struct UsagePatterns {
    option_group: Regex,
    option_token: Regex,
    positional: Regex,
    argument_row: Regex,
}

impl UsagePatterns {
    fn new() -> Self {
        Self {
            // [-v], [--exec-path[=<path>]], [-p | --paginate]
            option_group: Regex::new(r"\[\s*-(?:[^\[\]]|\[[^\[\]]*\])*\]")
                .expect("static regex must compile"),
            // --git-dir=<path>, -C <path>
            option_token: Regex::new(r"(?:^|\s)--?[A-Za-z0-9][A-Za-z0-9_-]*(?:=|\s+)<[^>]*>")
                .expect("static regex must compile"),
            // <name>... or [name]...
            positional: Regex::new(r"<([^<>\[\]]+)>(\.\.\.)?|\[([^\[\]]+)\](\.\.\.)?")
                .expect("static regex must compile"),
            //   <FILE>     Input file
            //   src...     Sources
            argument_row: Regex::new(
                r"^\s{1,8}(<[A-Za-z][A-Za-z0-9_-]*>|\[[A-Za-z][A-Za-z0-9_-]*\]|[A-Za-z][A-Za-z0-9_-]*)(\.\.\.)?(?:\s{2,}\S.*)?\s*$",
            )
            .expect("static regex must compile"),
        }
    }
}

/// Extracts positionals from the usage/synopsis lines of one help text.
///
/// Option groups are removed first so option values (`-C <path>`) are not
/// mistaken for positionals. Results keep textual order, de-duplicated by
/// name.
pub fn positionals_from_usage<S: AsRef<str>>(usage_lines: &[S]) -> Vec<Positional> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for line in usage_lines {
        let without_groups = PATTERNS.option_group.replace_all(line.as_ref(), " ");
        let cleaned = PATTERNS.option_token.replace_all(&without_groups, " ");
        for caps in PATTERNS.positional.captures_iter(&cleaned) {
            let (raw, required, ellipsis) = match (caps.get(1), caps.get(3)) {
                (Some(name), _) => (name.as_str(), true, caps.get(2)),
                (None, Some(name)) => (name.as_str(), false, caps.get(4)),
                (None, None) => continue,
            };
            let (name, inner_ellipsis) = clean_name(raw);
            if !is_positional_name(name) {
                continue;
            }
            if seen.insert(name.to_string()) {
                let mut positional = if required {
                    Positional::required(name)
                } else {
                    Positional::optional(name)
                };
                positional.variadic = ellipsis.is_some() || inner_ellipsis;
                out.push(positional);
            }
        }
    }
    out
}

/// Parses one row of an `Arguments:` section.
pub fn positional_from_argument_row(line: &str) -> Option<Positional> {
    let caps = PATTERNS.argument_row.captures(line)?;
    let token = &caps[1];
    let optional = token.starts_with('[');
    let name = token.trim_matches(['<', '>', '[', ']']);
    if !is_positional_name(name) {
        return None;
    }
    let mut positional = if optional {
        Positional::optional(name)
    } else {
        Positional::required(name)
    };
    positional.variadic = caps.get(2).is_some();
    Some(positional)
}

/// Strips inner angle brackets and a trailing ellipsis: `<args>...` → `args`.
fn clean_name(raw: &str) -> (&str, bool) {
    let trimmed = raw.trim();
    let (trimmed, variadic) = match trimmed.strip_suffix("...") {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    };
    (trimmed.trim_matches(['<', '>']), variadic)
}

fn is_positional_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && !name.contains('=')
        && !name.contains(char::is_whitespace)
        && !PLACEHOLDER_WORDS.contains(&name.to_ascii_uppercase().as_str())
}
