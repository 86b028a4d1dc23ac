use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.mymemory.translated.net/get";

#[derive(Debug, Clone)]
pub struct Config {
    // Translation API
    pub api_url: String,
    pub request_timeout: Duration,

    // Auto-translate
    pub debounce_window: Duration,
    pub max_input_chars: usize,

    // Preferences
    pub preferences_file: String,

    // Speech
    pub speech_command: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let timeout_secs: u64 = std::env::var("TRANSLATE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);
        if timeout_secs == 0 {
            bail!("TRANSLATE_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Self {
            // MyMemory - no key needed for the anonymous tier
            api_url: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),

            debounce_window: Duration::from_millis(
                std::env::var("AUTO_TRANSLATE_DEBOUNCE_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(600),
            ),
            max_input_chars: std::env::var("MAX_INPUT_CHARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|max: &usize| *max > 0)
                .unwrap_or(5000),

            preferences_file: std::env::var("PREFERENCES_FILE")
                .unwrap_or_else(|_| "data/preferences.json".to_string()),

            speech_command: std::env::var("SPEECH_COMMAND")
                .unwrap_or_else(|_| "espeak-ng".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(15),
            debounce_window: Duration::from_millis(600),
            max_input_chars: 5000,
            preferences_file: "data/preferences.json".to_string(),
            speech_command: "espeak-ng".to_string(),
        }
    }
}
