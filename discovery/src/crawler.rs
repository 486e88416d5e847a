//! Recursive, concurrency-bounded command tree construction.
//!
//! The [`Crawler`] probes the root path, parses it, and fans out one walk per
//! subcommand on a fixed-size rayon pool. Every path ends in exactly one of
//! three shapes:
//!
//! - **expanded**: probed and parsed, with real or virtual children;
//! - **leaf**: probed and parsed, no children (depth bound reached, nothing
//!   to expand, or the help text echoed the parent's);
//! - **stub**: the probe failed (`discovered == false`).
//!
//! Children are collected through an indexed parallel iterator, so their
//! order is the parse order of the parent's help regardless of which probe
//! finishes first.

use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, info};

use treemand_core::{FlagSection, Node, NodeKind, ParsedHelp};

use crate::cancel::CancelToken;
use crate::fetch::{DEFAULT_PROBE_TIMEOUT, FetchError, HelpSource};
use crate::parser::parse_help;

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Errors that abort a whole discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("command not found: {0}")]
    BinaryNotFound(String),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("no discovery strategy produced a tree")]
    NoTrees,
}

/// Tuning for one discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Deepest level that is still expanded; the root is level 0.
    pub max_depth: usize,
    /// Per-invocation probe timeout.
    pub timeout: Duration,
    /// Worker threads, i.e. the maximum number of probes in flight.
    pub concurrency: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: DEFAULT_PROBE_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl DiscoveryOptions {
    /// Sets the depth from a user-facing value where negative means "use
    /// the default".
    pub fn with_depth(mut self, depth: i64) -> Self {
        self.max_depth = usize::try_from(depth).unwrap_or(DEFAULT_MAX_DEPTH);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Walks a command tree through a [`HelpSource`].
pub struct Crawler<S> {
    source: S,
    options: DiscoveryOptions,
}

impl<S: HelpSource> Crawler<S> {
    pub fn new(source: S, options: DiscoveryOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    /// Discovers the full tree below `cli_name`.
    ///
    /// Only a missing executable is an error; every other probe failure,
    /// including at the root, degrades to a stub node.
    pub fn discover(&self, cli_name: &str, cancel: &CancelToken) -> Result<Node, DiscoveryError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.concurrency.max(1))
            .build()?;

        let root_path = vec![cli_name.to_string()];
        let root = pool.install(|| match self.source.fetch_help(&[], cancel) {
            Ok(text) => Ok(self.expand(root_path, text, 0, cancel)),
            Err(FetchError::NotFound(_)) => Err(DiscoveryError::BinaryNotFound(cli_name.to_string())),
            Err(e) => {
                debug!(cli = cli_name, error = %e, "Root probe failed");
                Ok(Node::stub(root_path, e))
            }
        })?;

        info!(
            cli = cli_name,
            nodes = root.count(),
            max_depth = root.max_depth(),
            "Discovery finished"
        );
        Ok(root)
    }

    fn walk(
        &self,
        full_path: Vec<String>,
        depth: usize,
        parent_text: &str,
        parent: &ParsedHelp,
        cancel: &CancelToken,
    ) -> Node {
        if cancel.is_cancelled() {
            return Node::stub(full_path, FetchError::Cancelled);
        }
        match self.source.fetch_help(&full_path[1..], cancel) {
            Err(e) => {
                debug!(path = ?full_path, error = %e, "Probe failed, recording stub");
                Node::stub(full_path, e)
            }
            // Some tools print the parent's help for any unknown argument;
            // expanding that again would loop.
            Ok(text) if text == parent_text => {
                let mut node = Node::new(full_path);
                node.apply_parsed(parent);
                node.help_text = text;
                node
            }
            Ok(text) => self.expand(full_path, text, depth, cancel),
        }
    }

    fn expand(&self, full_path: Vec<String>, text: String, depth: usize, cancel: &CancelToken) -> Node {
        let parsed = parse_help(&text);
        let mut node = Node::new(full_path);
        node.apply_parsed(&parsed);

        if depth < self.options.max_depth {
            if !parsed.subcommands.is_empty() {
                node.children = parsed
                    .subcommands
                    .par_iter()
                    .map(|sub| {
                        let mut child_path = node.full_path.clone();
                        child_path.push(sub.clone());
                        self.walk(child_path, depth + 1, &text, &parsed, cancel)
                    })
                    .collect();
            } else {
                node.children = virtual_children(&node.full_path, &parsed.sections);
            }
        }

        node.help_text = text;
        node
    }
}

/// One display-only child per named flag section.
fn virtual_children(parent_path: &[String], sections: &[FlagSection]) -> Vec<Node> {
    sections
        .iter()
        .map(|section| {
            let mut path = parent_path.to_vec();
            path.push(section.name.clone());
            let mut node = Node::new(path);
            node.kind = NodeKind::Virtual;
            node.flags = section.flags.clone();
            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource(HashMap<String, String>);

    impl HelpSource for MapSource {
        fn fetch_help(&self, args: &[String], _cancel: &CancelToken) -> Result<String, FetchError> {
            self.0.get(&args.join(" ")).cloned().ok_or(FetchError::Empty)
        }
    }

    fn source(entries: &[(&str, &str)]) -> MapSource {
        MapSource(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_options_depth_mapping() {
        assert_eq!(DiscoveryOptions::default().with_depth(-1).max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(DiscoveryOptions::default().with_depth(0).max_depth, 0);
        assert_eq!(DiscoveryOptions::default().with_depth(5).max_depth, 5);
        assert_eq!(DiscoveryOptions::default().with_concurrency(0).concurrency, 1);
    }

    #[test]
    fn test_echo_of_parent_help_is_a_leaf() {
        let root = "Usage: tool\n\nCommands:\n  a   Alpha\n\nFlags:\n  --x   X flag\n";
        let crawler = Crawler::new(source(&[("", root), ("a", root)]), DiscoveryOptions::default());
        let tree = crawler.discover("tool", &CancelToken::new()).unwrap();
        let a = tree.find("a").unwrap();
        assert!(a.is_leaf());
        assert!(a.discovered);
        assert_eq!(a.flags, tree.flags);
    }

    #[test]
    fn test_failed_child_is_stub() {
        let root = "Commands:\n  ok      Works\n  broken  Fails\n";
        let crawler = Crawler::new(
            source(&[("", root), ("ok", "Does ok things")]),
            DiscoveryOptions::default(),
        );
        let tree = crawler.discover("tool", &CancelToken::new()).unwrap();
        assert!(tree.find("ok").unwrap().discovered);
        let broken = tree.find("broken").unwrap();
        assert!(!broken.discovered);
        assert_eq!(broken.full_path, vec!["tool", "broken"]);
    }

    #[test]
    fn test_root_failure_is_stub() {
        let crawler = Crawler::new(source(&[]), DiscoveryOptions::default());
        let tree = crawler.discover("tool", &CancelToken::new()).unwrap();
        assert!(!tree.discovered);
        assert!(tree.is_leaf());
    }

    #[test]
    fn test_depth_zero_does_not_expand() {
        let crawler = Crawler::new(
            source(&[("", "Commands:\n  a   Alpha\n")]),
            DiscoveryOptions::default().with_depth(0),
        );
        let tree = crawler.discover("tool", &CancelToken::new()).unwrap();
        assert!(tree.is_leaf());
    }

    #[test]
    fn test_cancelled_token_stubs_children() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let crawler = Crawler::new(
            source(&[("", "Commands:\n  a   Alpha\n")]),
            DiscoveryOptions::default(),
        );
        // The source ignores cancellation, so the root still resolves.
        let tree = crawler.discover("tool", &cancel).unwrap();
        assert!(!tree.find("a").unwrap().discovered);
    }
}
