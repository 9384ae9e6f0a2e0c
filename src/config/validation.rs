use crate::config::types::{
    BrowserConfig, Config, CrawlerConfig, EndpointsConfig, JobsConfig, LlmConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_browser_config(&config.browser)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_jobs_config(&config.jobs)?;
    validate_endpoints(&config.endpoints)?;
    validate_llm_config(&config.llm)?;
    Ok(())
}

/// Validates crawler pacing
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout < 1 || config.request_timeout > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be between 1 and 300 seconds, got {}",
            config.request_timeout
        )));
    }

    // Delays may be zero; they are upper-bounded to catch unit mistakes
    for (name, value) in [
        ("target_delay", config.target_delay),
        ("job_delay", config.job_delay),
        ("geocode_delay", config.geocode_delay),
        ("llm_delay", config.llm_delay),
    ] {
        if value > 60_000 {
            return Err(ConfigError::Validation(format!(
                "{} must be <= 60000ms, got {}ms",
                name, value
            )));
        }
    }

    if config.feed_pages < 1 || config.feed_pages > 20 {
        return Err(ConfigError::Validation(format!(
            "feed_pages must be between 1 and 20, got {}",
            config.feed_pages
        )));
    }

    Ok(())
}

/// Validates headless browser settings
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.scroll_rounds > 50 {
        return Err(ConfigError::Validation(format!(
            "scroll_rounds must be <= 50, got {}",
            config.scroll_rounds
        )));
    }

    if config.ready_timeout < 1000 {
        return Err(ConfigError::Validation(format!(
            "ready_timeout must be >= 1000ms, got {}ms",
            config.ready_timeout
        )));
    }

    Ok(())
}

/// Validates request identity
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.browser_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "browser_agent cannot be empty".to_string(),
        ));
    }

    if config.browser_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "browser_agent must not contain control characters".to_string(),
        ));
    }

    Ok(())
}

fn validate_jobs_config(config: &JobsConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "jobs path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates that every endpoint is an absolute http(s) URL
fn validate_endpoints(config: &EndpointsConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("geocode", &config.geocode),
        ("llm", &config.llm),
        ("serpapi", &config.serpapi),
        ("graph", &config.graph),
        ("facebook-web", &config.facebook_web),
    ] {
        let url = Url::parse(value).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid {} endpoint '{}': {}", name, value, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "{} endpoint '{}' must use http or https",
                name, value
            )));
        }
    }

    Ok(())
}

fn validate_llm_config(config: &LlmConfig) -> Result<(), ConfigError> {
    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm model cannot be empty".to_string()));
    }
    Ok(())
}
