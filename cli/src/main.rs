mod config;
mod logging;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};

use treemand_cache::{TreeCache, cache_key};
use treemand_core::Node;
use treemand_discovery::{
    CancelToken, DiscoveryOptions, OutputFormat, RenderOptions, TreeStats, build_discoverers,
    cli_version, format_tree, resolve_binary, run,
};

use crate::config::{Config, FileConfig, parse_strategies};

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "treemand")]
#[command(about = "Discover and render the command tree of any CLI from its help output")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    discover: DiscoverArgs,

    /// YAML file with default settings.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr.
    #[arg(long, global = true)]
    debug: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Inspect or clear the tree cache.
    Cache(CacheArgs),
    /// Print the treemand version.
    Version,
}

#[derive(Debug, Args)]
struct DiscoverArgs {
    /// CLI to discover, by name or path.
    cli: Option<String>,
    /// Comma-separated discovery strategies.
    #[arg(short, long)]
    strategy: Option<String>,
    /// Maximum discovery depth (negative for the default).
    #[arg(long, allow_negative_numbers = true)]
    depth: Option<i64>,
    /// Only show commands whose name (or a descendant's) contains this.
    #[arg(long)]
    filter: Option<String>,
    /// Hide commands whose name contains this.
    #[arg(long)]
    exclude: Option<String>,
    /// Hide inline flags and positionals.
    #[arg(long)]
    commands_only: bool,
    /// Label nodes with their full command path.
    #[arg(long)]
    full_path: bool,
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
    /// Skip the cache for both lookup and storage.
    #[arg(long)]
    no_cache: bool,
    /// Overall discovery budget in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Per-invocation help probe timeout in seconds.
    #[arg(long, value_name = "SECS")]
    probe_timeout: Option<u64>,
    /// Maximum help probes in flight.
    #[arg(short, long)]
    jobs: Option<usize>,
    /// Print tree statistics to stderr.
    #[arg(long)]
    stats: bool,
}

#[derive(Debug, Args)]
struct CacheArgs {
    #[command(subcommand)]
    operation: CacheOperation,
}

#[derive(Debug, Subcommand)]
enum CacheOperation {
    /// Remove cached trees, for one CLI or all of them.
    Clear {
        /// Only clear entries for this CLI.
        cli: Option<String>,
    },
    /// List CLIs with cached trees.
    List,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let result = load_config(cli.config.as_deref()).and_then(|mut config| {
        config.no_color |= cli.no_color;
        dispatch(cli.command, cli.discover, config)
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn dispatch(command: Option<Command>, discover: DiscoverArgs, config: Config) -> Result<(), String> {
    match command {
        Some(Command::Cache(args)) => run_cache(args, &config),
        Some(Command::Version) => {
            println!("treemand {PACKAGE_VERSION}");
            Ok(())
        }
        None => run_discover(discover, config),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config, String> {
    let mut config = Config::from_process_env();
    if let Some(path) = path {
        config.overlay(FileConfig::load(path).map_err(|e| e.to_string())?);
    }
    Ok(config)
}

/// Applies command-line overrides on top of the loaded configuration.
fn apply_args(config: &mut Config, args: &DiscoverArgs) {
    if let Some(raw) = &args.strategy {
        config.strategies = parse_strategies(raw);
    }
    if let Some(depth) = args.depth {
        config.depth = depth;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs.max(1);
    }
    if let Some(secs) = args.probe_timeout {
        config.probe_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    config.no_cache |= args.no_cache;
}

fn run_discover(args: DiscoverArgs, mut config: Config) -> Result<(), String> {
    let Some(requested) = args.cli.clone() else {
        return Err("no CLI given (try 'treemand --help')".to_string());
    };
    apply_args(&mut config, &args);

    let binary =
        resolve_binary(&requested).ok_or_else(|| format!("command not found: {requested}"))?;
    let name = display_name(&requested);
    debug!(cli = %name, binary = %binary.display(), "Resolved executable");

    let options = DiscoveryOptions::default()
        .with_depth(config.depth)
        .with_timeout(config.probe_timeout)
        .with_concurrency(config.jobs);

    let slot = if config.no_cache {
        None
    } else {
        open_cache(&config.cache_dir)
            .map(|cache| CacheSlot::new(cache, &name, &binary, &config, &options))
    };

    let tree = match slot.as_ref().and_then(CacheSlot::lookup) {
        Some(tree) => {
            debug!(cli = %name, "Using cached tree");
            tree
        }
        None => {
            let cancel = CancelToken::with_timeout(config.timeout);
            let discoverers = build_discoverers(&config.strategies, &binary, &options);
            let tree = run(&name, &discoverers, &cancel).map_err(|e| e.to_string())?;
            if cancel.is_cancelled() {
                warn!(
                    timeout_secs = config.timeout.as_secs(),
                    "Discovery timed out, tree is incomplete"
                );
            } else if let Some(slot) = &slot {
                slot.store(&tree);
            }
            tree
        }
    };

    let color = use_color(&config);
    colored::control::set_override(color);
    let render = RenderOptions {
        max_depth: None,
        filter: args.filter,
        exclude: args.exclude,
        commands_only: args.commands_only,
        full_path: args.full_path,
        color,
        ..Default::default()
    };
    let output = format_tree(&tree, args.output, &render).map_err(|e| e.to_string())?;
    print!("{output}");

    if args.stats {
        let stats = TreeStats::collect(&tree);
        eprintln!(
            "{} commands, {} flags, depth {}, {} unavailable",
            stats.commands, stats.flags, stats.max_depth, stats.stubs
        );
    }
    Ok(())
}

/// Colors only go to a terminal, and never when disabled by flag or env.
fn use_color(config: &Config) -> bool {
    !config.no_color && std::io::stdout().is_terminal()
}

/// `./bin/tool` is shown and cached as `tool`.
fn display_name(requested: &str) -> String {
    Path::new(requested)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| requested.to_string())
}

fn open_cache(dir: &Path) -> Option<TreeCache> {
    TreeCache::open(dir)
        .map_err(|e| warn!(dir = %dir.display(), error = %e, "Cache unavailable, continuing without it"))
        .ok()
}

/// An open cache plus the key and metadata for the current discovery.
struct CacheSlot {
    cache: TreeCache,
    key: String,
    cli: String,
    version: String,
    strategy: String,
    max_age: Duration,
}

impl CacheSlot {
    fn new(
        cache: TreeCache,
        cli: &str,
        binary: &Path,
        config: &Config,
        options: &DiscoveryOptions,
    ) -> Self {
        let version = cli_version(binary, config.probe_timeout);
        // Resolved path and depth both take part in the key.
        let mut key_parts = config.strategies.clone();
        key_parts.push(format!("depth={}", options.max_depth));
        Self {
            key: cache_key(&binary.to_string_lossy(), &version, &key_parts),
            cache,
            cli: cli.to_string(),
            version,
            strategy: config.strategies.join(","),
            max_age: config.cache_max_age,
        }
    }

    fn lookup(&self) -> Option<Node> {
        self.cache
            .get(&self.key, self.max_age)
            .map_err(|e| warn!(error = %e, "Cache lookup failed"))
            .ok()
            .flatten()
    }

    fn store(&self, tree: &Node) {
        if let Err(e) = self
            .cache
            .put(&self.key, &self.cli, &self.version, &self.strategy, tree)
        {
            warn!(error = %e, "Failed to store tree in cache");
        }
    }
}

fn run_cache(args: CacheArgs, config: &Config) -> Result<(), String> {
    let cache = TreeCache::open(&config.cache_dir).map_err(|e| e.to_string())?;
    match args.operation {
        CacheOperation::Clear { cli: Some(cli) } => {
            let removed = cache.clear_cli(&cli).map_err(|e| e.to_string())?;
            println!("Removed {removed} cached tree(s) for {cli}.");
        }
        CacheOperation::Clear { cli: None } => {
            let removed = cache.clear().map_err(|e| e.to_string())?;
            println!("Removed {removed} cached tree(s).");
        }
        CacheOperation::List => {
            let clis = cache.list_clis().map_err(|e| e.to_string())?;
            if clis.is_empty() {
                println!("Cache is empty.");
            }
            for cli in clis {
                println!("{cli}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_discover_flags() {
        let cli = Cli::try_parse_from([
            "treemand", "kubectl", "--depth", "-1", "-s", "help", "-o", "json", "-j", "2",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.discover.cli.as_deref(), Some("kubectl"));
        assert_eq!(cli.discover.depth, Some(-1));
        assert_eq!(cli.discover.output, OutputFormat::Json);
        assert_eq!(cli.discover.jobs, Some(2));
    }

    #[test]
    fn test_parse_cache_subcommands() {
        let cli = Cli::try_parse_from(["treemand", "cache", "clear", "git"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Cache(CacheArgs {
                operation: CacheOperation::Clear { cli: Some(ref name) }
            })) if name == "git"
        ));
        let cli = Cli::try_parse_from(["treemand", "--debug", "cache", "list"]).unwrap();
        assert!(cli.debug);
        let cli = Cli::try_parse_from(["treemand", "git", "--no-color"]).unwrap();
        assert!(cli.no_color);
    }

    #[test]
    fn test_no_color_config_disables_color() {
        let config = Config {
            no_color: true,
            ..Config::default()
        };
        assert!(!use_color(&config));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("kubectl"), "kubectl");
        assert_eq!(display_name("./bin/tool"), "tool");
        assert_eq!(display_name("/usr/bin/git"), "git");
    }

    #[test]
    fn test_args_override_config() {
        let mut config = Config::default();
        let cli = Cli::try_parse_from([
            "treemand",
            "tool",
            "--strategy",
            "help, extra",
            "--probe-timeout",
            "2",
            "--no-cache",
        ])
        .unwrap();
        apply_args(&mut config, &cli.discover);
        assert_eq!(config.strategies, vec!["help", "extra"]);
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
        assert!(config.no_cache);
        assert_eq!(config.depth, -1);
    }
}
