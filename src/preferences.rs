use crate::i18n::Language;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub const KEY_THEME: &str = "theme";
pub const KEY_SOURCE_LANG: &str = "fromLang";
pub const KEY_TARGET_LANG: &str = "toLang";
pub const KEY_AUTO_TRANSLATE: &str = "autoTranslate";

/// Persistent string key-value storage.
///
/// Implementations never fail loudly: a read problem looks like an absent
/// key and a write problem is logged and dropped.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Store kept in a small JSON object on disk.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!("Ignoring unreadable preferences at {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Could not read preferences at {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&entries) {
            warn!("Could not save preference '{}' to {}: {:#}", key, self.path.display(), e);
        }
    }
}

/// Volatile store, for tests and for running without a preferences file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Theme> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub source: Language,
    pub target: Language,
    pub auto_translate: bool,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            source: Language::ENGLISH,
            target: Language::SPANISH,
            auto_translate: false,
            theme: Theme::Light,
        }
    }
}

impl Preferences {
    /// Load each preference independently; absent or invalid values keep
    /// their defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let mut prefs = Preferences::default();

        if let Some(lang) = store
            .get(KEY_SOURCE_LANG)
            .and_then(|code| Language::from_code(&code).ok())
        {
            prefs.source = lang;
        }
        if let Some(lang) = store
            .get(KEY_TARGET_LANG)
            .and_then(|code| Language::from_code(&code).ok())
        {
            prefs.target = lang;
        }
        if let Some(flag) = store.get(KEY_AUTO_TRANSLATE) {
            prefs.auto_translate = flag == "1";
        }
        if let Some(theme) = store.get(KEY_THEME).and_then(|t| Theme::parse(&t)) {
            prefs.theme = theme;
        }

        debug!(
            "Loaded preferences: {} -> {}, auto={}, theme={}",
            prefs.source,
            prefs.target,
            prefs.auto_translate,
            prefs.theme.as_str()
        );
        prefs
    }

    /// Persist the language pair and the auto-translate flag.
    pub fn save_selection(&self, store: &dyn KeyValueStore) {
        store.set(KEY_SOURCE_LANG, self.source.code());
        store.set(KEY_TARGET_LANG, self.target.code());
        store.set(KEY_AUTO_TRANSLATE, if self.auto_translate { "1" } else { "0" });
    }

    pub fn save_theme(&self, store: &dyn KeyValueStore) {
        store.set(KEY_THEME, self.theme.as_str());
    }
}
