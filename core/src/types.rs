//! Command tree type definitions.
//!
//! This module defines the data model produced by discovery: a tree of
//! [`Node`]s, each carrying the [`Flag`]s and [`Positional`]s parsed from its
//! help output. The types serialize with [`serde`] so a tree can be rendered
//! as JSON/YAML or stored in a cache and read back unchanged.

use serde::{Deserialize, Serialize};

/// Subcommand names that are never treated as commands even when they look
/// like one in help output (enum values in option descriptions, mostly).
pub const SUBCOMMAND_STOP_WORDS: &[&str] = &[
    "true", "false", "none", "all", "on", "off", "yes", "no", "default",
];

/// Returns `true` if `name` is in [`SUBCOMMAND_STOP_WORDS`].
pub fn is_stop_word(name: &str) -> bool {
    SUBCOMMAND_STOP_WORDS.contains(&name)
}

/// Whether a node corresponds to a real invocable subcommand or was
/// synthesized from a named group of flags.
///
/// # Examples
///
/// ```
/// use treemand_core::NodeKind;
///
/// assert_eq!(NodeKind::default(), NodeKind::Real);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A subcommand the target binary actually accepts.
    #[default]
    Real,
    /// A display-only grouping built from a flag section.
    Virtual,
}

/// A command-line flag.
///
/// `name` is the canonical form including dashes (`--output`, or `-l` for
/// short-only flags). `short_name` is the single-letter alias without its
/// dash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default = "default_value_type")]
    pub value_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

fn default_value_type() -> String {
    Flag::BOOL.to_string()
}

impl Flag {
    /// Value type of flags that take no argument.
    pub const BOOL: &'static str = "bool";

    /// Creates a boolean flag with no description.
    ///
    /// # Examples
    ///
    /// ```
    /// use treemand_core::Flag;
    ///
    /// let flag = Flag::new("--verbose").with_short("v");
    /// assert!(flag.is_bool());
    /// assert_eq!(flag.short_name.as_deref(), Some("v"));
    /// ```
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: None,
            value_type: Self::BOOL.to_string(),
            description: String::new(),
        }
    }

    pub fn with_short(mut self, short: impl Into<String>) -> Self {
        self.short_name = Some(short.into());
        self
    }

    pub fn with_value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = value_type.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns `true` if the flag takes no value.
    pub fn is_bool(&self) -> bool {
        self.value_type == Self::BOOL
    }
}

/// A positional argument parsed from a usage line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Positional {
    pub name: String,
    pub required: bool,
    /// Set when the usage token is followed by `...`.
    #[serde(default)]
    pub variadic: bool,
}

impl Positional {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            variadic: false,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            variadic: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// A named group of flags found under a human-readable header such as
/// `General options:`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlagSection {
    pub name: String,
    pub flags: Vec<Flag>,
}

/// Structured result of parsing one blob of help text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedHelp {
    pub description: String,
    pub flags: Vec<Flag>,
    pub positionals: Vec<Positional>,
    /// Subcommand names in the order they appeared.
    pub subcommands: Vec<String>,
    pub docs_url: Option<String>,
    pub sections: Vec<FlagSection>,
}

/// One node in a discovered command tree.
///
/// `full_path` is root-first and always ends with `name`; its length is the
/// node's depth plus one.
///
/// # Examples
///
/// ```
/// use treemand_core::Node;
///
/// let mut root = Node::new(vec!["git".into()]);
/// root.children.push(Node::new(vec!["git".into(), "commit".into()]));
///
/// assert_eq!(root.find("commit").unwrap().full_command(), "git commit");
/// assert!(!root.is_leaf());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub full_path: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<Flag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positionals: Vec<Positional>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help_text: String,
    pub discovered: bool,
    #[serde(default)]
    pub kind: NodeKind,
}

impl Node {
    /// Creates an empty, discovered, real node for `full_path`.
    pub fn new(full_path: Vec<String>) -> Self {
        let name = full_path.last().cloned().unwrap_or_default();
        Self {
            name,
            full_path,
            description: String::new(),
            flags: Vec::new(),
            positionals: Vec::new(),
            children: Vec::new(),
            help_text: String::new(),
            discovered: true,
            kind: NodeKind::Real,
        }
    }

    /// Creates a placeholder for a path whose help could not be fetched.
    pub fn stub(full_path: Vec<String>, reason: impl std::fmt::Display) -> Self {
        let mut node = Self::new(full_path);
        node.discovered = false;
        node.description = format!("(could not get help: {reason})");
        node
    }

    /// Copies the parsed fields of `parsed` onto this node.
    pub fn apply_parsed(&mut self, parsed: &ParsedHelp) {
        self.description = parsed.description.clone();
        self.flags = parsed.flags.clone();
        self.positionals = parsed.positionals.clone();
    }

    /// Space-joined command path, e.g. `kubectl get pods`.
    pub fn full_command(&self) -> String {
        self.full_path.join(" ")
    }

    /// Depth in the tree; the root is at depth 0.
    pub fn depth(&self) -> usize {
        self.full_path.len().saturating_sub(1)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_virtual(&self) -> bool {
        self.kind == NodeKind::Virtual
    }

    pub fn has_flags(&self) -> bool {
        !self.flags.is_empty()
    }

    pub fn has_positionals(&self) -> bool {
        !self.positionals.is_empty()
    }

    /// Looks up a direct child by name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Looks up a descendant by path relative to this node.
    pub fn find_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, segment| node.find(segment.as_ref()))
    }

    /// Looks up a flag on this node by canonical name.
    pub fn find_flag(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name == name)
    }

    /// Visits this node and every descendant, depth-first pre-order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_| n += 1);
        n
    }

    /// Greatest depth of any node in this subtree.
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        self.walk(&mut |node| deepest = deepest.max(node.depth()));
        deepest
    }
}
