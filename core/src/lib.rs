//! Core types for discovered command trees.
//!
//! This crate defines the data model shared by the discovery engine, the
//! cache and the renderer:
//!
//! - [`Node`] — one command in the tree, with its flags, positionals and
//!   children.
//! - [`Flag`] / [`Positional`] — arguments parsed from help output.
//! - [`ParsedHelp`] — the structured result of parsing one help text.
//! - [`NodeKind`] — real subcommand or virtual flag-section grouping.
//!
//! Merging ([`merge_trees`]) unions trees produced by different strategies.
//!
//! # Example
//!
//! ```
//! use treemand_core::*;
//!
//! let mut root = Node::new(vec!["mycli".into()]);
//! root.flags.push(Flag::new("--verbose").with_short("v"));
//! let mut run = Node::new(vec!["mycli".into(), "run".into()]);
//! run.positionals.push(Positional::required("script"));
//! root.children.push(run);
//!
//! assert_eq!(root.find("run").unwrap().full_command(), "mycli run");
//! assert!(root.find_flag("--verbose").is_some());
//! ```

pub mod merge;
pub mod types;

pub use merge::merge_trees;
pub use types::*;
