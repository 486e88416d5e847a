//! Cache key derivation.

use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Bumped whenever parsing changes enough that older cached trees should be
/// ignored.
pub const CACHE_SCHEMA_VERSION: &str = "v1";

/// Derives the cache key for one discovery configuration.
///
/// The key is the first 8 bytes of the SHA-256 of
/// `cli|version|strategies|schema-version` in lowercase hex. Strategies are
/// sorted first, so `["b", "a"]` and `["a", "b"]` share a key.
///
/// # Examples
///
/// ```
/// use treemand_cache::cache_key;
///
/// let key = cache_key("git", "git version 2.43.0", &["help"]);
/// assert_eq!(key.len(), 16);
/// assert_eq!(key, cache_key("git", "git version 2.43.0", &["help"]));
/// ```
pub fn cache_key<S: AsRef<str>>(cli: &str, version: &str, strategies: &[S]) -> String {
    let mut sorted: Vec<&str> = strategies.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    let material = format!(
        "{cli}|{version}|{}|{CACHE_SCHEMA_VERSION}",
        sorted.join(",")
    );
    let digest = Sha256::digest(material.as_bytes());
    digest[..8].iter().fold(String::with_capacity(16), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
