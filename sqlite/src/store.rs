//! The [`TreeCache`] store.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use treemand_core::Node;

use crate::error::{CacheError, Result};

/// File name of the database inside the cache directory.
pub const CACHE_FILE_NAME: &str = "cache.db";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS trees (
    key       TEXT PRIMARY KEY,
    cli       TEXT NOT NULL,
    version   TEXT NOT NULL,
    strategy  TEXT NOT NULL,
    data      TEXT NOT NULL,
    cached_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trees_cli ON trees(cli);
"#;

/// Persistent cache of discovered trees, one row per cache key.
///
/// Trees are stored as JSON alongside the CLI name, its version string, the
/// strategy list they were produced with and a Unix timestamp.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use treemand_cache::{TreeCache, cache_key};
/// use treemand_core::Node;
///
/// let cache = TreeCache::open_in_memory().unwrap();
/// let key = cache_key("git", "2.43.0", &["help"]);
/// cache.put(&key, "git", "2.43.0", "help", &Node::new(vec!["git".into()])).unwrap();
///
/// let hit = cache.get(&key, Duration::from_secs(3600)).unwrap();
/// assert_eq!(hit.unwrap().name, "git");
/// ```
#[derive(Debug)]
pub struct TreeCache {
    conn: Connection,
}

impl TreeCache {
    /// Opens (or creates) `dir/cache.db`, creating `dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::CreateDir`] if the directory cannot be created,
    /// or a database error if the file cannot be opened or migrated.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| CacheError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(CACHE_FILE_NAME);
        debug!(path = %path.display(), "Opening tree cache");
        Self::from_connection(Connection::open(path)?)
    }

    /// Opens a private in-memory cache.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    /// Returns the tree stored under `key`.
    ///
    /// Missing entries and entries older than `max_age` yield `None`. A zero
    /// `max_age` disables expiry.
    pub fn get(&self, key: &str, max_age: Duration) -> Result<Option<Node>> {
        self.get_at(key, max_age, Utc::now())
    }

    /// Like [`get`](Self::get), judging age relative to `now`.
    pub fn get_at(&self, key: &str, max_age: Duration, now: DateTime<Utc>) -> Result<Option<Node>> {
        let row = self
            .conn
            .query_row(
                "SELECT data, cached_at FROM trees WHERE key = ?1",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        let Some((data, cached_at)) = row else {
            return Ok(None);
        };

        if !max_age.is_zero() {
            let stored = DateTime::from_timestamp(cached_at, 0)
                .ok_or(CacheError::InvalidTimestamp(cached_at))?;
            let limit = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
            if now.signed_duration_since(stored) > limit {
                debug!(key, cached_at, "Cache entry expired");
                return Ok(None);
            }
        }
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Stores `node` under `key`, replacing any previous entry.
    pub fn put(&self, key: &str, cli: &str, version: &str, strategy: &str, node: &Node) -> Result<()> {
        self.put_at(key, cli, version, strategy, node, Utc::now())
    }

    /// Like [`put`](Self::put) with an explicit timestamp.
    pub fn put_at(
        &self,
        key: &str,
        cli: &str,
        version: &str,
        strategy: &str,
        node: &Node,
        cached_at: DateTime<Utc>,
    ) -> Result<()> {
        let data = serde_json::to_string(node)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO trees (key, cli, version, strategy, data, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![key, cli, version, strategy, data, cached_at.timestamp()],
        )?;
        Ok(())
    }

    /// Removes one entry. Returns `true` if it existed.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM trees WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Removes every entry, returning how many were removed.
    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM trees", [])?)
    }

    /// Removes every entry for one CLI, returning how many were removed.
    pub fn clear_cli(&self, cli: &str) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM trees WHERE cli = ?1", params![cli])?)
    }

    /// Names of all cached CLIs, sorted and de-duplicated.
    pub fn list_clis(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT cli FROM trees ORDER BY cli")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
