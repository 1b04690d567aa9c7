use std::path::PathBuf;

use crate::storage::DEFAULT_TRIP_FILE;

/// Environment variable overriding the trip file path
pub const ENV_TRIP_FILE: &str = "TRIPSPLIT_FILE";
/// Environment variable overriding the currency label for new trips
pub const ENV_CURRENCY: &str = "TRIPSPLIT_CURRENCY";

pub const DEFAULT_CURRENCY: &str = "Rs.";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Trip snapshot file the CLI reads and writes
    pub trip_file: PathBuf,
    /// Label printed before amounts, stored in the trip at `init`
    pub currency_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trip_file: PathBuf::from(DEFAULT_TRIP_FILE),
            currency_label: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl Config {
    /// Resolve with priority: command-line flags > environment > defaults
    pub fn load(trip_file: Option<PathBuf>, currency_label: Option<String>) -> Self {
        Self::resolve(trip_file, currency_label, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with an explicit environment lookup.
    pub fn resolve(
        trip_file: Option<PathBuf>,
        currency_label: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut config = Self::default();

        if let Some(path) = env(ENV_TRIP_FILE).filter(|v| !v.is_empty()) {
            config.trip_file = PathBuf::from(path);
        }
        if let Some(label) = env(ENV_CURRENCY) {
            config.currency_label = label;
        }

        if let Some(path) = trip_file {
            config.trip_file = path;
        }
        if let Some(label) = currency_label {
            config.currency_label = label;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve(None, None, env_of(&[]));
        assert_eq!(config.trip_file, PathBuf::from("trip.json"));
        assert_eq!(config.currency_label, "Rs.");
    }

    #[test]
    fn test_env_overrides_defaults() {
        let config = Config::resolve(
            None,
            None,
            env_of(&[(ENV_TRIP_FILE, "/tmp/goa.json"), (ENV_CURRENCY, "EUR")]),
        );
        assert_eq!(config.trip_file, PathBuf::from("/tmp/goa.json"));
        assert_eq!(config.currency_label, "EUR");
    }

    #[test]
    fn test_flags_override_env() {
        let config = Config::resolve(
            Some(PathBuf::from("coorg.json")),
            Some("INR".into()),
            env_of(&[(ENV_TRIP_FILE, "/tmp/goa.json"), (ENV_CURRENCY, "EUR")]),
        );
        assert_eq!(config.trip_file, PathBuf::from("coorg.json"));
        assert_eq!(config.currency_label, "INR");
    }

    #[test]
    fn test_empty_env_path_is_ignored() {
        let config = Config::resolve(None, None, env_of(&[(ENV_TRIP_FILE, "")]));
        assert_eq!(config.trip_file, PathBuf::from("trip.json"));
    }
}
