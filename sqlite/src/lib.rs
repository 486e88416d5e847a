//! SQLite cache for discovered command trees.
//!
//! Discovery of a large CLI can take seconds, so `treemand` keeps each tree
//! in a single-table SQLite database (`cache.db`) keyed by
//! [`cache_key`]: a hash of the CLI name, its `--version` line, the
//! strategy list and an internal schema version. Any change to one of those
//! produces a fresh key, so stale trees are never served after an upgrade.
//!
//! # Quick start
//!
//! ```no_run
//! use std::time::Duration;
//! use treemand_cache::{TreeCache, cache_key};
//!
//! let cache = TreeCache::open("/tmp/treemand").unwrap();
//! let key = cache_key("kubectl", "v1.30.0", &["help"]);
//! match cache.get(&key, Duration::from_secs(24 * 3600)).unwrap() {
//!     Some(tree) => println!("cached: {} children", tree.children.len()),
//!     None => println!("miss"),
//! }
//! ```

mod error;
mod key;
mod store;

pub use error::{CacheError, Result};
pub use key::{CACHE_SCHEMA_VERSION, cache_key};
pub use store::{CACHE_FILE_NAME, TreeCache};
