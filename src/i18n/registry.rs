//! Language registry: Single source of truth for all supported languages.
//!
//! This module provides a centralized registry of every language the
//! translation API is offered for. It uses a singleton pattern with `OnceLock`
//! to ensure thread-safe initialization and access; the table never changes
//! after start-up.

use std::collections::HashSet;
use std::sync::OnceLock;

/// Configuration for a supported language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Language code as understood by the translation API (e.g., "en", "zh-TW")
    pub code: &'static str,

    /// English display name (e.g., "English", "Chinese (Traditional)")
    pub name: &'static str,

    /// Whether the script is read right-to-left
    pub rtl: bool,
}

impl LanguageConfig {
    /// Label used in language pickers, e.g. "Spanish (es)".
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

/// Ordered language listing for a picker.
///
/// `preferred` holds the caller's shortlist in the order given; `others`
/// holds every remaining language sorted by display name. No code appears in
/// both groups.
#[derive(Debug, Clone)]
pub struct LanguageListing {
    pub preferred: Vec<&'static LanguageConfig>,
    pub others: Vec<&'static LanguageConfig>,
}

impl LanguageListing {
    /// All codes, preferred first.
    pub fn codes(&self) -> Vec<&'static str> {
        self.preferred
            .iter()
            .chain(self.others.iter())
            .map(|lang| lang.code)
            .collect()
    }
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

/// Scripts written right-to-left.
const RTL_CODES: [&str; 5] = ["ar", "he", "fa", "ur", "ps"];

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Get a language configuration by its code.
    ///
    /// Codes are matched exactly: "zh-TW" is registered, "zh-tw" is not.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Display name for a code, `None` if the code is unknown.
    pub fn display_name(&self, code: &str) -> Option<&'static str> {
        self.get_by_code(code).map(|lang| lang.name)
    }

    /// Whether the code names a right-to-left language. Unknown codes are
    /// treated as left-to-right.
    pub fn is_right_to_left(&self, code: &str) -> bool {
        self.get_by_code(code).map(|lang| lang.rtl).unwrap_or(false)
    }

    /// Get all languages in registration order.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Build a picker listing: the known codes from `preferred` first, then
    /// everything else sorted by display name.
    pub fn all_codes(&'static self, preferred: &[&str]) -> LanguageListing {
        let mut seen = HashSet::new();
        let mut shortlist = Vec::new();

        for code in preferred {
            if let Some(lang) = self.get_by_code(code) {
                if seen.insert(lang.code) {
                    shortlist.push(lang);
                }
            }
        }

        let mut others: Vec<&'static LanguageConfig> = self
            .languages
            .iter()
            .filter(|lang| !seen.contains(lang.code))
            .collect();
        others.sort_by(|a, b| a.name.cmp(b.name));

        LanguageListing {
            preferred: shortlist,
            others,
        }
    }
}

/// Default language configurations.
fn default_languages() -> Vec<LanguageConfig> {
    const LANGUAGES: [(&str, &str); 72] = [
        ("af", "Afrikaans"),
        ("am", "Amharic"),
        ("ar", "Arabic"),
        ("az", "Azerbaijani"),
        ("bg", "Bulgarian"),
        ("bn", "Bengali"),
        ("bs", "Bosnian"),
        ("ca", "Catalan"),
        ("cs", "Czech"),
        ("da", "Danish"),
        ("de", "German"),
        ("el", "Greek"),
        ("en", "English"),
        ("es", "Spanish"),
        ("et", "Estonian"),
        ("fa", "Persian"),
        ("fi", "Finnish"),
        ("fil", "Filipino"),
        ("fr", "French"),
        ("ga", "Irish"),
        ("gl", "Galician"),
        ("gu", "Gujarati"),
        ("he", "Hebrew"),
        ("hi", "Hindi"),
        ("hr", "Croatian"),
        ("hu", "Hungarian"),
        ("hy", "Armenian"),
        ("id", "Indonesian"),
        ("is", "Icelandic"),
        ("it", "Italian"),
        ("ja", "Japanese"),
        ("ka", "Georgian"),
        ("kk", "Kazakh"),
        ("km", "Khmer"),
        ("kn", "Kannada"),
        ("ko", "Korean"),
        ("ky", "Kyrgyz"),
        ("lt", "Lithuanian"),
        ("lv", "Latvian"),
        ("mk", "Macedonian"),
        ("ml", "Malayalam"),
        ("mn", "Mongolian"),
        ("mr", "Marathi"),
        ("ms", "Malay"),
        ("my", "Burmese"),
        ("ne", "Nepali"),
        ("nl", "Dutch"),
        ("no", "Norwegian"),
        ("pa", "Punjabi"),
        ("pl", "Polish"),
        ("ps", "Pashto"),
        ("pt", "Portuguese"),
        ("ro", "Romanian"),
        ("ru", "Russian"),
        ("si", "Sinhala"),
        ("sk", "Slovak"),
        ("sl", "Slovenian"),
        ("sq", "Albanian"),
        ("sr", "Serbian"),
        ("sv", "Swedish"),
        ("sw", "Swahili"),
        ("ta", "Tamil"),
        ("te", "Telugu"),
        ("th", "Thai"),
        ("tl", "Tagalog"),
        ("tr", "Turkish"),
        ("uk", "Ukrainian"),
        ("ur", "Urdu"),
        ("uz", "Uzbek"),
        ("vi", "Vietnamese"),
        ("zh", "Chinese"),
        ("zh-TW", "Chinese (Traditional)"),
    ];

    LANGUAGES
        .iter()
        .map(|&(code, name)| LanguageConfig {
            code,
            name,
            rtl: RTL_CODES.contains(&code),
        })
        .collect()
}
