use std::env;

use tracing::info;

use crate::error::SentinelError;

/// Application configuration loaded from environment variables.
///
/// The Gemini credential is the only optional field with meaning: when it
/// is absent the acquisition pipeline runs in deterministic-fallback mode
/// and never touches the network.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,

    // Monitoring defaults (mutable at runtime through the API)
    pub keywords: Vec<String>,
    pub target_email: String,

    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Scan loop
    pub scan_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, SentinelError> {
        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());

        let keywords = parse_keywords(
            &env::var("SENTINEL_KEYWORDS").unwrap_or_else(|_| "depressed,fat".to_string()),
        );

        let target_email =
            env::var("ALERT_RECIPIENT").unwrap_or_else(|_| "alerts@example.com".to_string());

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| SentinelError::Config("API_PORT must be a number".to_string()))?;

        let scan_interval_secs = env::var("SCAN_INTERVAL_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| SentinelError::Config("SCAN_INTERVAL_SECS must be a number".to_string()))?;

        Ok(Self {
            gemini_api_key,
            keywords,
            target_email,
            api_host,
            api_port,
            scan_interval_secs,
        })
    }

    /// Log the loaded configuration with the credential masked.
    pub fn log_redacted(&self) {
        info!(
            gemini_api_key = if self.gemini_api_key.is_some() { "set" } else { "missing (fallback mode)" },
            keywords = ?self.keywords,
            target_email = self.target_email.as_str(),
            api_host = self.api_host.as_str(),
            api_port = self.api_port,
            scan_interval_secs = self.scan_interval_secs,
            "Config loaded"
        );
    }
}

/// Split a comma-separated keyword list, trimming blanks and duplicates
/// while preserving order.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let word = part.trim();
        if !word.is_empty() && !keywords.iter().any(|k| k == word) {
            keywords.push(word.to_string());
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_trimmed_and_deduplicated() {
        assert_eq!(
            parse_keywords(" depressed, fat ,,depressed"),
            vec!["depressed".to_string(), "fat".to_string()]
        );
    }

    #[test]
    fn empty_keyword_list_parses_to_nothing() {
        assert!(parse_keywords("").is_empty());
        assert!(parse_keywords(" , ,").is_empty());
    }
}
