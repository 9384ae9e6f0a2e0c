use crate::config::types::Config;
use crate::ConfigError;
use dotenvy::dotenv;
use std::env;

/// Credentials and overrides read from the environment
///
/// Every field is optional. A missing key only disables the capability that
/// needs it (geocoding, classification, discovery, social sources).
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub google_maps_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
    pub facebook_access_token: Option<String>,
    pub facebook_email: Option<String>,
    pub facebook_password: Option<String>,
    pub database_path: Option<String>,
}

impl Secrets {
    /// Load secrets from environment variables
    pub fn from_env() -> Self {
        // Load .env file if present
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds secrets from an arbitrary key lookup; blank values count as absent
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            google_maps_api_key: get("GOOGLE_MAPS_API_KEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            serpapi_api_key: get("SERPAPI_API_KEY").or_else(|| get("SERP_API_KEY")),
            facebook_access_token: get("FACEBOOK_ACCESS_TOKEN"),
            facebook_email: get("FACEBOOK_EMAIL"),
            facebook_password: get("FACEBOOK_PASSWORD"),
            database_path: get("DATABASE_PATH"),
        }
    }

    /// Returns the social login pair when both halves are present
    pub fn facebook_login(&self) -> Option<(&str, &str)> {
        match (&self.facebook_email, &self.facebook_password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// Resolves the database path: `DATABASE_PATH` wins over `[storage]`
///
/// # Returns
///
/// * `Ok(String)` - The path to open
/// * `Err(ConfigError::Validation)` - Neither source names a path
pub fn resolve_database_path(config: &Config, secrets: &Secrets) -> Result<String, ConfigError> {
    let path = secrets
        .database_path
        .clone()
        .unwrap_or_else(|| config.storage.database_path.clone());

    if path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database path is not set (use [storage] database-path or DATABASE_PATH)".to_string(),
        ));
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_serpapi_key_fallback() {
        let secrets = Secrets::from_lookup(lookup(&[("SERP_API_KEY", "legacy")]));
        assert_eq!(secrets.serpapi_api_key.as_deref(), Some("legacy"));

        let secrets = Secrets::from_lookup(lookup(&[
            ("SERPAPI_API_KEY", "primary"),
            ("SERP_API_KEY", "legacy"),
        ]));
        assert_eq!(secrets.serpapi_api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let secrets = Secrets::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")]));
        assert!(secrets.openai_api_key.is_none());
    }

    #[test]
    fn test_facebook_login_requires_both() {
        let secrets = Secrets::from_lookup(lookup(&[("FACEBOOK_EMAIL", "a@b.vn")]));
        assert!(secrets.facebook_login().is_none());

        let secrets = Secrets::from_lookup(lookup(&[
            ("FACEBOOK_EMAIL", "a@b.vn"),
            ("FACEBOOK_PASSWORD", "secret"),
        ]));
        assert_eq!(secrets.facebook_login(), Some(("a@b.vn", "secret")));
    }

    #[test]
    fn test_database_path_override() {
        let config = Config::with_database("from-config.db");
        let secrets = Secrets::from_lookup(lookup(&[("DATABASE_PATH", "from-env.db")]));
        assert_eq!(resolve_database_path(&config, &secrets).unwrap(), "from-env.db");

        let secrets = Secrets::default();
        assert_eq!(resolve_database_path(&config, &secrets).unwrap(), "from-config.db");
    }

    #[test]
    fn test_missing_database_path_is_fatal() {
        let config = Config::with_database("");
        let result = resolve_database_path(&config, &Secrets::default());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
