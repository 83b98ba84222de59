use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ai::DEFAULT_TIMEOUT_SECS;
use crate::tags::MatcherConfig;
use crate::utils::get_database_path;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub ai_base_url: String,
    pub ai_timeout: Duration,
    pub matcher: MatcherConfig,
}

impl Config {
    /// Loads configuration from the environment, reading `.env` first if
    /// present.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `LOCTAG_DB` | `{data_dir}/loctag/locations.db` |
    /// | `LOCTAG_AI_URL` | `http://localhost:8000` |
    /// | `LOCTAG_AI_TIMEOUT_SECS` | `240` |
    /// | `LOCTAG_STOP_WORDS` | built-in Italian/English connectors |
    /// | `LOCTAG_MIN_WORD_LEN` | `2` |
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        let database_path = match env::var("LOCTAG_DB") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => get_database_path()?,
        };

        let ai_timeout_secs = match env::var("LOCTAG_AI_TIMEOUT_SECS") {
            Ok(value) => value
                .trim()
                .parse()
                .context("LOCTAG_AI_TIMEOUT_SECS must be a whole number of seconds")?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let mut matcher = MatcherConfig::default();
        if let Ok(words) = env::var("LOCTAG_STOP_WORDS") {
            matcher.stop_words = parse_stop_words(&words);
        }
        if let Ok(value) = env::var("LOCTAG_MIN_WORD_LEN") {
            matcher.min_word_len = value
                .trim()
                .parse()
                .context("LOCTAG_MIN_WORD_LEN must be a whole number")?;
        }

        Ok(Self {
            database_path,
            ai_base_url: env::var("LOCTAG_AI_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            ai_timeout: Duration::from_secs(ai_timeout_secs),
            matcher,
        })
    }
}

/// Splits a comma-separated stop-word list, lower-casing entries and
/// dropping blanks.
fn parse_stop_words(input: &str) -> HashSet<String> {
    input
        .split(',')
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "LOCTAG_DB",
        "LOCTAG_AI_URL",
        "LOCTAG_AI_TIMEOUT_SECS",
        "LOCTAG_STOP_WORDS",
        "LOCTAG_MIN_WORD_LEN",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { env::remove_var(var) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: tests touching the environment are serialized.
        unsafe { env::set_var(key, value) };
    }

    #[test]
    fn parse_stop_words_normalizes_entries() {
        let words = parse_stop_words(" Della, THE ,, e ");
        assert_eq!(words.len(), 3);
        assert!(words.contains("della"));
        assert!(words.contains("the"));
        assert!(words.contains("e"));
    }

    #[test]
    #[serial]
    fn defaults_apply_without_env() {
        clear_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.ai_base_url, "http://localhost:8000");
        assert_eq!(config.ai_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.matcher, MatcherConfig::default());
        assert!(config.database_path.ends_with("loctag/locations.db"));
    }

    #[test]
    #[serial]
    fn env_overrides_are_read() {
        clear_env();
        set_env("LOCTAG_DB", "/tmp/loctag-test.db");
        set_env("LOCTAG_AI_URL", "http://ai.internal:9000");
        set_env("LOCTAG_AI_TIMEOUT_SECS", "30");
        set_env("LOCTAG_STOP_WORDS", "panoramic,views");
        set_env("LOCTAG_MIN_WORD_LEN", "3");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.database_path, PathBuf::from("/tmp/loctag-test.db"));
        assert_eq!(config.ai_base_url, "http://ai.internal:9000");
        assert_eq!(config.ai_timeout, Duration::from_secs(30));
        assert_eq!(config.matcher.min_word_len, 3);
        assert!(config.matcher.stop_words.contains("panoramic"));
        assert!(!config.matcher.stop_words.contains("della"));
    }

    #[test]
    #[serial]
    fn invalid_numbers_are_rejected() {
        clear_env();
        set_env("LOCTAG_MIN_WORD_LEN", "two");

        let result = Config::from_env();
        clear_env();

        assert!(result.is_err());
    }
}
