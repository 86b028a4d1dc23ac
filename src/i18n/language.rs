//! Language type: validated language representation.
//!
//! A `Language` can only be built from a code present in the registry, so
//! everything downstream (cache keys, API language pairs, preferences) works
//! with codes the translation API is known to accept.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

/// A validated language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// Registry code (e.g., "en", "zh-TW")
    code: &'static str,
}

impl Language {
    /// Default source language.
    pub const ENGLISH: Language = Language { code: "en" };

    /// Default target language.
    pub const SPANISH: Language = Language { code: "es" };

    /// Create a Language from a language code string.
    ///
    /// # Returns
    /// * `Ok(Language)` if the code is registered
    /// * `Err` if the code is unknown
    pub fn from_code(code: &str) -> Result<Language> {
        match LanguageRegistry::get().get_by_code(code) {
            Some(config) => Ok(Language {
                code: config.code, // Use the static str from the registry
            }),
            None => bail!("Unknown language code: '{}'", code),
        }
    }

    /// Get the registry code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the code is not in the registry, which cannot happen for a
    /// `Language` built via `from_code` or the constants.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// English display name (e.g., "Spanish").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn is_right_to_left(&self) -> bool {
        self.config().rtl
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Language::from_code(s)
    }
}
