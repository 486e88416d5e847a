//! Discovery strategies and the multi-strategy entry point.
//!
//! A [`Discoverer`] builds a whole tree for one CLI by some method. Only the
//! `help` strategy exists today; [`run`] executes every configured strategy
//! and merges their trees with [`merge_trees`].

use std::path::Path;

use tracing::{info, warn};

use treemand_core::{Node, merge_trees};

use crate::cancel::CancelToken;
use crate::crawler::{Crawler, DiscoveryError, DiscoveryOptions};
use crate::fetch::{HelpSource, ProcessHelpFetcher};

/// Strategy names understood by [`build_discoverers`].
pub const KNOWN_STRATEGIES: &[&str] = &["help"];

/// Strategies used when none are configured.
pub const DEFAULT_STRATEGIES: &[&str] = &["help"];

/// A method of building a command tree.
pub trait Discoverer: Send + Sync {
    fn name(&self) -> &'static str;
    fn discover(&self, cli_name: &str, cancel: &CancelToken) -> Result<Node, DiscoveryError>;
}

/// Builds the tree by recursively probing help output.
pub struct HelpDiscoverer<S = ProcessHelpFetcher> {
    crawler: Crawler<S>,
}

impl HelpDiscoverer<ProcessHelpFetcher> {
    /// Probes `binary` with the timeout from `options`.
    pub fn for_binary(binary: &Path, options: DiscoveryOptions) -> Self {
        let fetcher = ProcessHelpFetcher::new(binary).with_timeout(options.timeout);
        Self::new(fetcher, options)
    }
}

impl<S: HelpSource> HelpDiscoverer<S> {
    pub fn new(source: S, options: DiscoveryOptions) -> Self {
        Self {
            crawler: Crawler::new(source, options),
        }
    }
}

impl<S: HelpSource> Discoverer for HelpDiscoverer<S> {
    fn name(&self) -> &'static str {
        "help"
    }

    fn discover(&self, cli_name: &str, cancel: &CancelToken) -> Result<Node, DiscoveryError> {
        self.crawler.discover(cli_name, cancel)
    }
}

/// Instantiates the named strategies, once each. Unknown names are skipped
/// with a warning; an empty (or entirely unknown) list falls back to
/// [`DEFAULT_STRATEGIES`].
pub fn build_discoverers<S: AsRef<str>>(
    strategies: &[S],
    binary: &Path,
    options: &DiscoveryOptions,
) -> Vec<Box<dyn Discoverer>> {
    let mut discoverers: Vec<Box<dyn Discoverer>> = Vec::new();
    for name in strategies.iter().map(|s| s.as_ref().trim()) {
        if discoverers.iter().any(|d| d.name() == name) {
            continue;
        }
        match name {
            "help" => {
                discoverers.push(Box::new(HelpDiscoverer::for_binary(binary, options.clone())))
            }
            "" => {}
            other => warn!(strategy = other, "Unknown discovery strategy, skipping"),
        }
    }
    if discoverers.is_empty() {
        discoverers.push(Box::new(HelpDiscoverer::for_binary(binary, options.clone())));
    }
    discoverers
}

/// Runs every discoverer and merges the resulting trees.
///
/// Strategy failures are tolerated as long as at least one tree was
/// produced; otherwise the last failure (or [`DiscoveryError::NoTrees`]) is
/// returned.
pub fn run(
    cli_name: &str,
    discoverers: &[Box<dyn Discoverer>],
    cancel: &CancelToken,
) -> Result<Node, DiscoveryError> {
    let mut trees = Vec::with_capacity(discoverers.len());
    let mut last_error = None;
    for discoverer in discoverers {
        match discoverer.discover(cli_name, cancel) {
            Ok(tree) => trees.push(tree),
            Err(e) => {
                warn!(strategy = discoverer.name(), error = %e, "Discovery strategy failed");
                last_error = Some(e);
            }
        }
    }

    let Some(merged) = merge_trees(&trees) else {
        return Err(last_error.unwrap_or(DiscoveryError::NoTrees));
    };
    info!(cli = cli_name, strategies = trees.len(), "Merged discovery results");
    Ok(merged)
}
