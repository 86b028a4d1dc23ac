use crate::i18n::Language;
use std::collections::HashMap;

/// A single translation request. Equality is structural over all three
/// fields, so it doubles as the cache key and the in-flight identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslationRequest {
    pub text: String,
    pub source: Language,
    pub target: Language,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source: Language, target: Language) -> Self {
        Self {
            text: text.into(),
            source,
            target,
        }
    }

    /// `langpair` query value, e.g. "en|es".
    pub fn langpair(&self) -> String {
        format!("{}|{}", self.source.code(), self.target.code())
    }
}

/// Session-scoped translation cache.
///
/// No expiry and no size bound: entries are added at the pace a person types
/// and the cache is dropped with the session.
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: HashMap<TranslationRequest, String>,
}

impl TranslationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, request: &TranslationRequest) -> Option<&str> {
        self.entries.get(request).map(String::as_str)
    }

    pub fn put(&mut self, request: TranslationRequest, translated: String) {
        self.entries.insert(request, translated);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
