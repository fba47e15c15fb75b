use std::time::Duration;

/// Default lifetime of a cache entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Returns the cache key addressing a record of `kind` by `field = value`.
///
/// # Examples
///
/// ```
/// use fridgemate_core::cache::cache_key;
///
/// assert_eq!(cache_key("user", "email", "a@x.com"), "user-by-email: a@x.com");
/// ```
pub fn cache_key(kind: &str, field: &str, value: &str) -> String {
    format!("{}-by-{}: {}", kind, field, value)
}
