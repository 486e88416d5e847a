//! Subcommand line extractors.

use regex::Regex;
use std::sync::LazyLock;

use treemand_core::is_stop_word;

/// A subcommand recognized on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub name: String,
    pub has_description: bool,
}

pub type CommandExtractor = fn(&str) -> Option<CommandLine>;

/// Extractors in priority order.
pub const COMMAND_EXTRACTORS: &[CommandExtractor] = &[bulleted_command, indented_command];

/// Runs [`COMMAND_EXTRACTORS`] against `line`, rejecting stop-words.
pub fn extract_command(line: &str) -> Option<CommandLine> {
    COMMAND_EXTRACTORS
        .iter()
        .find_map(|extract| extract(line))
        .filter(|cmd| !is_stop_word(&cmd.name))
}

static BULLETED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\+?o\s+([a-z][a-z0-9_-]*)\s*$").expect("static regex must compile")
});

// Up to 8 columns of indent; `name`, optional `, alias` list, optional `*`
// plugin marker, then an optional two-space separated description.
static INDENTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s{1,8}([a-z][a-z0-9_.:-]*)",
        r"(?:,\s*[a-z][a-z0-9_-]*)*",
        r"\*?",
        r"(?:\s{2,}(\S.*?))?\s*$",
    ))
    .expect("static regex must compile")
});

/// Man-page bullet dialect: `o name` or `+o name`.
pub fn bulleted_command(line: &str) -> Option<CommandLine> {
    let caps = BULLETED_RE.captures(line)?;
    Some(CommandLine {
        name: caps[1].to_string(),
        has_description: false,
    })
}

/// Indented lowercase word with optional aliases and description.
pub fn indented_command(line: &str) -> Option<CommandLine> {
    let caps = INDENTED_RE.captures(line)?;
    Some(CommandLine {
        name: caps[1].trim_end_matches([':', '.']).to_string(),
        has_description: caps.get(2).is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cobra_command_row() {
        let cmd = extract_command("  apply       Apply a configuration to a resource").unwrap();
        assert_eq!(cmd.name, "apply");
        assert!(cmd.has_description);
    }

    #[test]
    fn test_aliases_and_plugin_marker() {
        assert_eq!(extract_command("  remove, rm   Remove").unwrap().name, "remove");
        assert_eq!(extract_command("  buildx*     Docker Buildx").unwrap().name, "buildx");
    }

    #[test]
    fn test_bare_command_has_no_description() {
        let cmd = extract_command("  install").unwrap();
        assert!(!cmd.has_description);
    }

    #[test]
    fn test_man_bullets() {
        assert_eq!(extract_command("       o accessanalyzer").unwrap().name, "accessanalyzer");
        assert_eq!(extract_command("       +o s3api").unwrap().name, "s3api");
    }

    #[test]
    fn test_rejections() {
        assert!(extract_command("  true        enable").is_none());
        assert!(extract_command("apply       unindented").is_none());
        assert!(extract_command("  Find more information at: x").is_none());
        assert!(extract_command("  kubectl [command]").is_none());
        assert!(extract_command("            deeply indented continuation").is_none());
    }
}
