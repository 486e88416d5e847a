//! Heuristic help-text parser.
//!
//! [`parse_help`] turns one blob of raw help output into a [`ParsedHelp`]. It
//! is a single pass of a line-oriented state machine over the normalized
//! text, followed by a positional rescan of the collected usage lines.
//!
//! The parser is pure: the same input always yields the same output, and it
//! never fails. Unrecognized lines are skipped.
//!
//! Dialects are handled by ordered lists of independent line extractors
//! ([`flags::FLAG_EXTRACTORS`], [`commands::COMMAND_EXTRACTORS`]) chosen per
//! state rather than by classifying the whole document up front.

pub mod commands;
pub mod flags;
pub mod normalize;
pub mod sections;
pub mod usage;
pub mod util;

use std::collections::HashSet;

use treemand_core::{Flag, FlagSection, ParsedHelp, Positional};

use commands::extract_command;
use flags::{clean_description, extract_flag};
use normalize::normalize_help_output;
use sections::{Header, classify_header};
use usage::{positional_from_argument_row, positionals_from_usage};
use util::{first_url, indent_width, is_man_banner, is_uppercase_heading};

/// Unindented lines among the first few lines never reset the state; tools
/// commonly open with a title or wrapped usage there.
const LEADING_LINES: usize = 3;

/// The description is only taken from this many leading lines.
const DESCRIPTION_WINDOW: usize = 10;

/// Parser state, selected by the most recent section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseState {
    None,
    Usage,
    Description,
    Flags,
    Commands,
    Examples,
    Aliases,
    Arguments,
}

/// Parses raw help output.
///
/// # Examples
///
/// ```
/// use treemand_discovery::parse_help;
///
/// let help = "\
/// Usage: mycli [OPTIONS] <FILE>
///
/// Commands:
///   run     Run the file
///   check   Check the file
///
/// Options:
///   -v, --verbose        Enable verbose output
///   -o, --output <PATH>  Output file
/// ";
///
/// let parsed = parse_help(help);
/// assert_eq!(parsed.subcommands, vec!["run", "check"]);
/// assert_eq!(parsed.flags[1].value_type, "path");
/// assert_eq!(parsed.positionals[0].name, "FILE");
/// ```
pub fn parse_help(text: &str) -> ParsedHelp {
    let normalized = normalize_help_output(text);
    let mut collector = HelpCollector::default();
    for (index, line) in normalized.lines().enumerate() {
        collector.feed(index, line);
    }
    collector.finish()
}

struct HelpCollector {
    state: ParseState,
    /// The previous non-blank line was a standalone `Usage:` header, so an
    /// unindented synopsis may follow.
    after_usage_header: bool,
    description: String,
    docs_url: Option<String>,
    flags: Vec<Flag>,
    flag_names: HashSet<String>,
    sections: Vec<FlagSection>,
    current_section: Option<FlagSection>,
    subcommands: Vec<String>,
    subcommand_names: HashSet<String>,
    usage_lines: Vec<String>,
    argument_positionals: Vec<Positional>,
    /// Flag awaiting its description on a later line.
    pending_description: Option<String>,
}

impl Default for HelpCollector {
    fn default() -> Self {
        Self {
            state: ParseState::None,
            after_usage_header: false,
            description: String::new(),
            docs_url: None,
            flags: Vec::new(),
            flag_names: HashSet::new(),
            sections: Vec::new(),
            current_section: None,
            subcommands: Vec::new(),
            subcommand_names: HashSet::new(),
            usage_lines: Vec::new(),
            argument_positionals: Vec::new(),
            pending_description: None,
        }
    }
}

impl HelpCollector {
    fn feed(&mut self, index: usize, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if self.docs_url.is_none() {
            self.docs_url = first_url(trimmed);
        }

        if let Some(header) = classify_header(line) {
            self.enter(header);
            return;
        }

        if let Some(rest) = strip_usage_prefix(trimmed) {
            self.close_section();
            self.pending_description = None;
            self.state = ParseState::Usage;
            self.after_usage_header = false;
            if !rest.is_empty() {
                self.usage_lines.push(rest.to_string());
            }
            return;
        }

        self.maybe_reset(index, line, trimmed);

        match self.state {
            ParseState::Flags => {
                if !self.try_flag(line) {
                    self.try_pending_description(trimmed);
                }
            }
            ParseState::Commands => {
                if let Some(cmd) = extract_command(line) {
                    self.add_subcommand(cmd.name);
                }
            }
            ParseState::Usage => {
                if !self.try_flag(line) {
                    let usage = trimmed.strip_prefix("or:").unwrap_or(trimmed).trim();
                    self.usage_lines.push(usage.to_string());
                }
            }
            ParseState::Arguments => {
                if let Some(positional) = positional_from_argument_row(line) {
                    self.argument_positionals.push(positional);
                }
            }
            ParseState::None | ParseState::Description => {
                if self.try_flag(line) || self.try_pending_description(trimmed) {
                    return;
                }
                if let Some(cmd) = extract_command(line).filter(|c| c.has_description) {
                    self.add_subcommand(cmd.name);
                    return;
                }
                self.maybe_description(index, line, trimmed);
            }
            ParseState::Examples | ParseState::Aliases => {}
        }
    }

    fn enter(&mut self, header: Header) {
        self.close_section();
        self.pending_description = None;
        self.state = header.state;
        self.after_usage_header = header.state == ParseState::Usage;
        if let Some(name) = header.section {
            self.current_section = Some(FlagSection {
                name,
                flags: Vec::new(),
            });
        }
    }

    /// An unindented line that is not a flag, banner or synopsis ends the
    /// current section.
    fn maybe_reset(&mut self, index: usize, line: &str, trimmed: &str) {
        let continues_usage_header = std::mem::take(&mut self.after_usage_header);
        if indent_width(line) > 0 || trimmed.starts_with('-') || is_man_banner(trimmed) {
            return;
        }
        if continues_usage_header {
            return;
        }
        if index >= LEADING_LINES || self.state == ParseState::Usage {
            self.close_section();
            self.pending_description = None;
            self.state = ParseState::None;
        }
    }

    fn try_flag(&mut self, line: &str) -> bool {
        let Some(found) = extract_flag(line) else {
            return false;
        };
        self.pending_description = found
            .description_follows
            .then(|| found.flag.name.clone());
        self.add_flag(found.flag);
        true
    }

    fn try_pending_description(&mut self, trimmed: &str) -> bool {
        let Some(name) = self.pending_description.take() else {
            return false;
        };
        let description = clean_description(trimmed);
        let targets = self.flags.iter_mut().chain(
            self.current_section
                .iter_mut()
                .flat_map(|section| section.flags.iter_mut()),
        );
        for flag in targets.filter(|f| f.name == name && f.description.is_empty()) {
            flag.description = description.clone();
        }
        true
    }

    fn add_flag(&mut self, flag: Flag) {
        if let Some(section) = self.current_section.as_mut() {
            if !section.flags.iter().any(|f| f.name == flag.name) {
                section.flags.push(flag.clone());
            }
        }
        if self.flag_names.insert(flag.name.clone()) {
            self.flags.push(flag);
        }
    }

    fn add_subcommand(&mut self, name: String) {
        if self.subcommand_names.insert(name.clone()) {
            self.subcommands.push(name);
        }
    }

    fn maybe_description(&mut self, index: usize, line: &str, trimmed: &str) {
        if !self.description.is_empty() || index >= DESCRIPTION_WINDOW {
            return;
        }
        // `aws -` style NAME lines carry no text of their own.
        if is_man_banner(trimmed) || is_uppercase_heading(line) || trimmed.ends_with(" -") {
            return;
        }
        self.description = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    fn close_section(&mut self) {
        if let Some(section) = self.current_section.take() {
            if section.flags.len() >= 2 {
                self.sections.push(section);
            }
        }
    }

    fn finish(mut self) -> ParsedHelp {
        self.close_section();
        let mut positionals = positionals_from_usage(&self.usage_lines);
        for positional in self.argument_positionals {
            if !positionals.iter().any(|p| p.name == positional.name) {
                positionals.push(positional);
            }
        }
        ParsedHelp {
            description: self.description,
            flags: self.flags,
            positionals,
            subcommands: self.subcommands,
            docs_url: self.docs_url,
            sections: self.sections,
        }
    }
}

/// Returns the synopsis following an inline `usage:` prefix.
fn strip_usage_prefix(trimmed: &str) -> Option<&str> {
    let prefix = trimmed.get(..6)?;
    prefix
        .eq_ignore_ascii_case("usage:")
        .then(|| trimmed[6..].trim())
}
