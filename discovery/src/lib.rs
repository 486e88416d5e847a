//! Black-box discovery of CLI command hierarchies.
//!
//! This crate reconstructs the command tree of an arbitrary executable purely
//! from its help output. It has four layers:
//!
//! - [`fetch`] runs one help probe (`--help`, `-h`, `--help all`, `help`)
//!   with a timeout, pager suppression and cooperative cancellation.
//! - [`parser`] turns raw help text into a [`ParsedHelp`]; it is pure and
//!   never fails.
//! - [`crawler`] walks the tree recursively on a bounded worker pool,
//!   degrading failed probes to stub nodes.
//! - [`strategy`] runs every configured strategy and merges the trees.
//!
//! Rendering ([`output`]), version probing ([`version`]) and executable
//! lookup ([`resolve`]) support the `treemand` binary.
//!
//! # Example
//!
//! ```
//! use treemand_discovery::parse_help;
//!
//! let help = "\
//! kubectl controls the Kubernetes cluster manager.
//!
//! Available Commands:
//!   get         Display one or many resources
//!   apply       Apply a configuration to a resource
//!
//! Flags:
//!       --kubeconfig string   Path to the kubeconfig file
//! ";
//!
//! let parsed = parse_help(help);
//! assert_eq!(parsed.subcommands, vec!["get", "apply"]);
//! assert_eq!(parsed.flags[0].value_type, "string");
//! ```
//!
//! [`ParsedHelp`]: treemand_core::ParsedHelp

pub mod cancel;
pub mod crawler;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod resolve;
pub mod strategy;
pub mod version;

pub use cancel::CancelToken;
pub use crawler::{Crawler, DiscoveryError, DiscoveryOptions};
pub use fetch::{FetchError, HelpSource, ProcessHelpFetcher};
pub use output::{ColorScheme, OutputFormat, RenderOptions, Rgb, TreeStats, format_tree};
pub use parser::parse_help;
pub use resolve::resolve_binary;
pub use strategy::{Discoverer, HelpDiscoverer, build_discoverers, run};
pub use version::cli_version;
