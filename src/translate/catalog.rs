//! Catalog resolver boundary.
//! A resolver answers "does this domain hold a translation for this key
//! in this language"; returning the key unchanged signals a miss, so
//! callers can probe several domains and fall through cheaply.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Per-domain message lookup (adapter for gettext-style backends).
pub trait CatalogResolver: Send + Sync {
    /// Resolve `key` in `domain` (`None` queries the domain-less default
    /// catalog) for `lang`. Returns the key itself when no translation
    /// exists.
    fn resolve(&self, domain: Option<&str>, lang: &str, key: &str) -> String;
}

/// In-memory catalog: lang → domain → key → message.
/// The default (domain-less) bucket lives under an empty domain name.
#[derive(Default)]
pub struct MemoryCatalog {
    messages: RwLock<HashMap<String, HashMap<String, HashMap<String, String>>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a message under `lang` and `domain`.
    pub fn insert(&self, lang: &str, domain: Option<&str>, key: &str, message: &str) {
        let mut messages = self.messages.write();
        messages
            .entry(lang.to_string())
            .or_default()
            .entry(domain.unwrap_or_default().to_string())
            .or_default()
            .insert(key.to_string(), message.to_string());
    }
}

impl CatalogResolver for MemoryCatalog {
    fn resolve(&self, domain: Option<&str>, lang: &str, key: &str) -> String {
        let messages = self.messages.read();
        messages
            .get(lang)
            .and_then(|domains| domains.get(domain.unwrap_or_default()))
            .and_then(|entries| entries.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
