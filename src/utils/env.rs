//! Environment variable utilities

/// Config file path override
pub const CONFIG_ENV: &str = "DEPENDENCY_FIXUP_CONFIG";

/// Get environment variable as Option
///
/// Returns `Some(value)` if set and non-empty, `None` otherwise.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
