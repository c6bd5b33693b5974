//! # Controller Configuration
//!
//! Configuration loaded from environment variables (populated from a ConfigMap
//! via `envFrom` in the deployment).
//!
//! All settings have defaults in [`crate::constants`]; unparsable values fall
//! back to the default.

mod controller;
mod server;

pub use controller::ControllerConfig;
pub use server::ServerConfig;

/// Load configuration from environment variables with defaults
pub fn load_config() -> (ControllerConfig, ServerConfig) {
    (ControllerConfig::from_env(), ServerConfig::from_env())
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_uses_default() {
        assert_eq!(
            env_var_or_default("RDS_CONTROLLER_TEST_UNSET_VARIABLE", 42u64),
            42
        );
    }
}
