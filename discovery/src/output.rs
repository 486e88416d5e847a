//! Output formatting for command trees.

use std::fmt::Write as _;

use colored::Colorize;
use treemand_core::{Flag, Node};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// Unicode tree.
    #[default]
    Text,
    Json,
    Yaml,
}

/// Error produced when a tree cannot be serialized.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Controls which nodes the text renderer shows and how.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Hide nodes deeper than this (root is depth 0).
    pub max_depth: Option<usize>,
    /// Show only nodes whose name, or a descendant's name, contains this.
    pub filter: Option<String>,
    /// Hide nodes (and their subtrees) whose name contains this.
    pub exclude: Option<String>,
    /// Omit inline flags and positionals.
    pub commands_only: bool,
    /// Label nodes with their full command path.
    pub full_path: bool,
    /// Emit ANSI colors by role. Whether they reach the terminal is still
    /// subject to `colored`'s global override.
    pub color: bool,
    pub colors: ColorScheme,
}

/// A 24-bit color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Colors used by the text renderer, one per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub base: Rgb,
    pub subcommand: Rgb,
    pub flag_bool: Rgb,
    pub flag_string: Rgb,
    pub flag_int: Rgb,
    pub flag_other: Rgb,
    pub positional: Rgb,
    pub value: Rgb,
    pub unavailable: Rgb,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            base: Rgb(0xFF, 0xFF, 0xFF),
            subcommand: Rgb(0x5E, 0xA4, 0xF5),
            flag_bool: Rgb(0x50, 0xFA, 0x7B),
            flag_string: Rgb(0x8B, 0xE9, 0xFD),
            flag_int: Rgb(0xFF, 0xB8, 0x6C),
            flag_other: Rgb(0xBD, 0x93, 0xF9),
            positional: Rgb(0xF1, 0xFA, 0x8C),
            value: Rgb(0xFF, 0x79, 0xC6),
            unavailable: Rgb(0xFF, 0x55, 0x55),
        }
    }
}

impl ColorScheme {
    /// Picks the flag color from its value type.
    pub fn flag(&self, value_type: &str) -> Rgb {
        match value_type {
            "" | "bool" => self.flag_bool,
            "string" | "stringArray" | "[]string" | "strings" => self.flag_string,
            "int" | "int32" | "int64" | "uint" | "uint64" | "count" => self.flag_int,
            _ => self.flag_other,
        }
    }
}

/// Inline flags are listed individually up to this many; beyond it only a
/// count is shown.
const MAX_INLINE_FLAGS: usize = 5;

const ICON_BRANCH: &str = "▼ ";
const ICON_LEAF: &str = "• ";
const ICON_VIRTUAL: &str = "◆ ";
const CONN_MID: &str = "├── ";
const CONN_LAST: &str = "└── ";
const PAD_MID: &str = "│   ";
const PAD_LAST: &str = "    ";

/// Formats a tree in the requested output format. `options` only affect
/// [`OutputFormat::Text`].
pub fn format_tree(
    root: &Node,
    format: OutputFormat,
    options: &RenderOptions,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(render_text(root, options)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(root)? + "\n"),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(root)?),
    }
}

/// Renders the tree as indented Unicode text, one node per line.
pub fn render_text(root: &Node, options: &RenderOptions) -> String {
    let mut out = String::new();
    render_node(&mut out, root, "", true, 0, options);
    out
}

fn render_node(
    out: &mut String,
    node: &Node,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &RenderOptions,
) {
    let conn = match (depth, is_last) {
        (0, _) => "",
        (_, true) => CONN_LAST,
        (_, false) => CONN_MID,
    };
    let _ = writeln!(out, "{prefix}{conn}{}", node_line(node, depth, options));

    let children: Vec<&Node> = node
        .children
        .iter()
        .filter(|child| is_visible(child, depth + 1, options))
        .collect();
    let child_prefix = match (depth, is_last) {
        (0, _) => prefix.to_string(),
        (_, true) => format!("{prefix}{PAD_LAST}"),
        (_, false) => format!("{prefix}{PAD_MID}"),
    };
    for (i, child) in children.iter().enumerate() {
        render_node(out, child, &child_prefix, i + 1 == children.len(), depth + 1, options);
    }
}

fn is_visible(node: &Node, depth: usize, options: &RenderOptions) -> bool {
    if options.max_depth.is_some_and(|max| depth > max) {
        return false;
    }
    if let Some(exclude) = options.exclude.as_deref().filter(|e| !e.is_empty()) {
        if node.name.contains(exclude) {
            return false;
        }
    }
    match options.filter.as_deref().filter(|f| !f.is_empty()) {
        Some(filter) => subtree_matches(node, filter),
        None => true,
    }
}

fn subtree_matches(node: &Node, filter: &str) -> bool {
    node.name.contains(filter) || node.children.iter().any(|c| subtree_matches(c, filter))
}

fn node_line(node: &Node, depth: usize, options: &RenderOptions) -> String {
    let icon = if node.is_virtual() {
        ICON_VIRTUAL
    } else if node.is_leaf() {
        ICON_LEAF
    } else {
        ICON_BRANCH
    };
    let label = if options.full_path {
        node.full_command()
    } else {
        node.name.clone()
    };
    let label = if depth == 0 {
        paint_bold(&label, options.colors.base, options)
    } else {
        paint(&label, options.colors.subcommand, options)
    };

    let mut line = format!("{icon}{label}");
    if !options.commands_only {
        for positional in &node.positionals {
            let ellipsis = if positional.variadic { "..." } else { "" };
            let text = if positional.required {
                format!("<{}>", positional.name)
            } else {
                format!("[{}]", positional.name)
            };
            let _ = write!(line, " {}{ellipsis}", paint(&text, options.colors.positional, options));
        }
        match node.flags.len() {
            0 => {}
            n if n <= MAX_INLINE_FLAGS => {
                let flags: Vec<String> = node
                    .flags
                    .iter()
                    .map(|flag| inline_flag(flag, options))
                    .collect();
                let _ = write!(line, " [{}]", flags.join(","));
            }
            n => {
                let _ = write!(line, " {}", dim(&format!("[{n} flags]"), options));
            }
        }
    }
    if !node.discovered {
        let _ = write!(line, " {}", paint("(unavailable)", options.colors.unavailable, options));
    } else if !node.description.is_empty() {
        let _ = write!(line, "  {}", dim(&node.description, options));
    }
    line
}

fn inline_flag(flag: &Flag, options: &RenderOptions) -> String {
    let name = paint(&flag.name, options.colors.flag(&flag.value_type), options);
    if flag.is_bool() || flag.value_type.is_empty() {
        name
    } else {
        let value = format!("<{}>", flag.value_type);
        format!("{name}={}", paint(&value, options.colors.value, options))
    }
}

fn paint(text: &str, Rgb(r, g, b): Rgb, options: &RenderOptions) -> String {
    if options.color {
        text.truecolor(r, g, b).to_string()
    } else {
        text.to_string()
    }
}

fn paint_bold(text: &str, Rgb(r, g, b): Rgb, options: &RenderOptions) -> String {
    if options.color {
        text.truecolor(r, g, b).bold().to_string()
    } else {
        text.to_string()
    }
}

fn dim(text: &str, options: &RenderOptions) -> String {
    if options.color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

/// Summary counts for a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    /// Every node, including the root and virtual nodes.
    pub commands: usize,
    pub flags: usize,
    pub max_depth: usize,
    /// Nodes whose help could not be fetched.
    pub stubs: usize,
}

impl TreeStats {
    pub fn collect(root: &Node) -> Self {
        let mut stats = Self::default();
        root.walk(&mut |node| {
            stats.commands += 1;
            stats.flags += node.flags.len();
            stats.max_depth = stats.max_depth.max(node.depth());
            if !node.discovered {
                stats.stubs += 1;
            }
        });
        stats
    }
}
