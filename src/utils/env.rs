//! Environment variable helpers
//!
//! Used by `RuntimeConfig::apply_env_overrides`.

/// Environment variable as Option; empty values count as unset
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Environment variable as boolean
///
/// `Some(true)` for "true", "1", "yes", "on" (case-insensitive),
/// `Some(false)` for any other value, `None` when unset.
pub fn env_bool(key: &str) -> Option<bool> {
    env_opt(key).map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes" | "on"))
}

/// Environment variable parsed as `T`; `None` if unset or unparseable
pub fn env_parse<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env_opt(key)?.parse().ok()
}
