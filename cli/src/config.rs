//! Host configuration for the `treemand` binary.
//!
//! Values are layered: built-in defaults, then environment variables, then
//! an optional YAML file given with `--config`. Command-line flags are
//! applied on top by `main`.
//!
//! Color is disabled when `NO_COLOR` or `TREEMAND_NO_COLOR` is set to any
//! non-empty value.
//!
//! # Example YAML
//!
//! ```yaml
//! cache_dir: /var/cache/treemand
//! strategies: [help]
//! depth: 2
//! jobs: 4
//! probe_timeout_secs: 3
//! timeout_secs: 60
//! cache_max_age_secs: 3600
//! no_cache: false
//! no_color: true
//! ```

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use treemand_discovery::crawler::DEFAULT_CONCURRENCY;
use treemand_discovery::fetch::DEFAULT_PROBE_TIMEOUT;
use treemand_discovery::strategy::DEFAULT_STRATEGIES;

pub const ENV_CACHE_DIR: &str = "TREEMAND_CACHE_DIR";
pub const ENV_STRATEGIES: &str = "TREEMAND_STRATEGIES";
pub const ENV_NO_COLOR: &str = "TREEMAND_NO_COLOR";
/// The cross-tool convention, see <https://no-color.org>.
pub const ENV_NO_COLOR_STANDARD: &str = "NO_COLOR";

/// Directory name under `$HOME` used when no cache directory is configured.
const DEFAULT_CACHE_DIR_NAME: &str = ".treemand";
const DEFAULT_CACHE_MAX_AGE: Duration = Duration::from_secs(24 * 3600);
const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub cache_dir: PathBuf,
    pub no_cache: bool,
    pub no_color: bool,
    pub strategies: Vec<String>,
    pub cache_max_age: Duration,
    /// Negative means the engine default.
    pub depth: i64,
    pub jobs: usize,
    pub probe_timeout: Duration,
    /// Budget for the whole discovery run.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR_NAME),
            no_cache: false,
            no_color: false,
            strategies: default_strategies(),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            depth: -1,
            jobs: DEFAULT_CONCURRENCY,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            timeout: DEFAULT_OVERALL_TIMEOUT,
        }
    }
}

/// Optional overrides read from a YAML file. Absent keys leave the current
/// value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub cache_dir: Option<PathBuf>,
    pub no_cache: Option<bool>,
    pub no_color: Option<bool>,
    pub strategies: Option<Vec<String>>,
    pub cache_max_age_secs: Option<u64>,
    pub depth: Option<i64>,
    pub jobs: Option<usize>,
    pub probe_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Loads overrides from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_process_env() -> Self {
        Self::from_env(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an environment lookup.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        match lookup(ENV_CACHE_DIR).filter(|dir| !dir.is_empty()) {
            Some(dir) => config.cache_dir = PathBuf::from(dir),
            None => {
                if let Some(home) = lookup("HOME").filter(|home| !home.is_empty()) {
                    config.cache_dir = PathBuf::from(home).join(DEFAULT_CACHE_DIR_NAME);
                }
            }
        }
        if let Some(raw) = lookup(ENV_STRATEGIES) {
            config.strategies = parse_strategies(&raw);
        }
        config.no_color = [ENV_NO_COLOR_STANDARD, ENV_NO_COLOR]
            .iter()
            .any(|key| lookup(key).is_some_and(|v| !v.is_empty()));
        config
    }

    /// Applies the keys present in `file`.
    pub fn overlay(&mut self, file: FileConfig) {
        if let Some(dir) = file.cache_dir {
            self.cache_dir = dir;
        }
        if let Some(no_cache) = file.no_cache {
            self.no_cache = no_cache;
        }
        if let Some(no_color) = file.no_color {
            self.no_color = no_color;
        }
        if let Some(strategies) = file.strategies {
            self.strategies = parse_strategies(&strategies.join(","));
        }
        if let Some(secs) = file.cache_max_age_secs {
            self.cache_max_age = Duration::from_secs(secs);
        }
        if let Some(depth) = file.depth {
            self.depth = depth;
        }
        if let Some(jobs) = file.jobs {
            self.jobs = jobs.max(1);
        }
        if let Some(secs) = file.probe_timeout_secs {
            self.probe_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
    }
}

/// Splits a comma-separated strategy list, trimming blanks. An empty result
/// yields the default strategies.
pub fn parse_strategies(raw: &str) -> Vec<String> {
    let parsed: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if parsed.is_empty() {
        default_strategies()
    } else {
        parsed
    }
}

fn default_strategies() -> Vec<String> {
    DEFAULT_STRATEGIES.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_under_home() {
        let config = Config::from_env(env(&[("HOME", "/home/u")]));
        assert_eq!(config.cache_dir, PathBuf::from("/home/u/.treemand"));
        assert_eq!(config.strategies, vec!["help"]);
        assert_eq!(config.depth, -1);
        assert_eq!(config.cache_max_age, Duration::from_secs(86_400));
        assert!(!config.no_cache);
        assert!(!config.no_color);
    }

    #[test]
    fn test_no_color_env() {
        assert!(Config::from_env(env(&[(ENV_NO_COLOR_STANDARD, "1")])).no_color);
        assert!(Config::from_env(env(&[(ENV_NO_COLOR, "yes")])).no_color);
        assert!(!Config::from_env(env(&[(ENV_NO_COLOR_STANDARD, "")])).no_color);

        let file: FileConfig = serde_yaml::from_str("no_color: false\n").unwrap();
        let mut config = Config::from_env(env(&[(ENV_NO_COLOR, "1")]));
        config.overlay(file);
        assert!(!config.no_color);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_env(env(&[
            ("HOME", "/home/u"),
            (ENV_CACHE_DIR, "/tmp/tc"),
            (ENV_STRATEGIES, " help , completion ,"),
        ]));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/tc"));
        assert_eq!(config.strategies, vec!["help", "completion"]);
    }

    #[test]
    fn test_parse_strategies() {
        assert_eq!(parse_strategies("help"), vec!["help"]);
        assert_eq!(parse_strategies("a, b"), vec!["a", "b"]);
        assert_eq!(parse_strategies(""), vec!["help"]);
        assert_eq!(parse_strategies(" , "), vec!["help"]);
    }

    #[test]
    fn test_file_overlay() {
        let file: FileConfig = serde_yaml::from_str(
            "cache_dir: /srv/cache\nstrategies: [help]\ndepth: 2\njobs: 0\ntimeout_secs: 60\n",
        )
        .unwrap();
        let mut config = Config::from_env(env(&[("HOME", "/home/u")]));
        config.overlay(file);
        assert_eq!(config.cache_dir, PathBuf::from("/srv/cache"));
        assert_eq!(config.depth, 2);
        assert_eq!(config.jobs, 1);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.probe_timeout, DEFAULT_PROBE_TIMEOUT);
    }

    #[test]
    fn test_unknown_file_keys_are_rejected() {
        assert!(serde_yaml::from_str::<FileConfig>("colour: blue\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = FileConfig::load("/nonexistent/treemand.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
