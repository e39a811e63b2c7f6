//! Named translator registry.
//! Holds the translator instances an application configured, with a
//! designated default for shortcut lookups. Built once at startup and
//! passed by reference to whatever handles requests; deliberately not
//! a global.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Error;
use crate::translate::{TokenMap, TranslatorContract};

#[derive(Default)]
pub struct TranslatorRegistry {
    translators: HashMap<String, Arc<dyn TranslatorContract>>,
    default_name: Option<String>,
}

impl TranslatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a translator under `name` and return the shared handle.
    /// Registering an already-taken name returns the existing instance.
    /// The first registration becomes the default.
    pub fn load(
        &mut self,
        name: &str,
        translator: Arc<dyn TranslatorContract>,
    ) -> Arc<dyn TranslatorContract> {
        if self.default_name.is_none() {
            self.default_name = Some(name.to_string());
        }
        let handle = self
            .translators
            .entry(name.to_string())
            .or_insert(translator)
            .clone();
        info!(name, "translator_registered");
        handle
    }

    /// Previously registered translator for `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn TranslatorContract>, Error> {
        self.translators
            .get(name)
            .cloned()
            .ok_or_else(|| Error::MissingTranslator(name.to_string()))
    }

    /// Name of the default translator, if any is registered.
    pub fn default_translator(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// Point the default at another registered name.
    pub fn set_default(&mut self, name: &str) -> Result<(), Error> {
        if !self.translators.contains_key(name) {
            return Err(Error::MissingTranslator(name.to_string()));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Shared handle to the default translator.
    pub fn default_handle(&self) -> Result<Arc<dyn TranslatorContract>, Error> {
        let name = self
            .default_name
            .as_deref()
            .ok_or_else(|| Error::MissingTranslator("(default)".to_string()))?;
        self.get(name)
    }

    /// Translate through the default translator.
    pub fn translate(&self, key: &str, tokens: &TokenMap) -> Result<String, Error> {
        Ok(self.default_handle()?.translate(key, tokens))
    }

    /// Reset the default translator's state and drop every registration.
    pub fn clear(&mut self) {
        if let Ok(default) = self.default_handle() {
            default.reset();
        }
        self.translators.clear();
        self.default_name = None;
        debug!("registry_cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::locale::FixedLocale;
    use crate::translate::catalog::MemoryCatalog;
    use crate::translate::Translator;

    fn make_translator() -> Arc<dyn TranslatorContract> {
        Arc::new(Translator::new(
            Arc::new(FixedLocale::new("fr_FR")),
            Arc::new(MemoryCatalog::new()),
        ))
    }

    #[test]
    fn first_registration_becomes_the_default() {
        let mut registry = TranslatorRegistry::new();
        registry.load("app", make_translator());
        registry.load("admin", make_translator());
        assert_eq!(registry.default_translator(), Some("app"));
    }

    #[test]
    fn reloading_a_name_keeps_the_first_instance() {
        let mut registry = TranslatorRegistry::new();
        let first = registry.load("app", make_translator());
        first.set_domains(vec!["posts".to_string()]);

        let second = registry.load("app", make_translator());
        assert_eq!(second.domains(), vec!["posts".to_string()]);
    }

    #[test]
    fn get_of_an_unknown_name_fails() {
        let registry = TranslatorRegistry::new();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, Error::MissingTranslator(name) if name == "nope"));
    }

    #[test]
    fn set_default_requires_a_registered_name() {
        let mut registry = TranslatorRegistry::new();
        registry.load("app", make_translator());
        assert!(registry.set_default("missing").is_err());
        assert!(registry.set_default("app").is_ok());
    }

    #[test]
    fn clear_resets_the_default_and_empties_the_registry() {
        let mut registry = TranslatorRegistry::new();
        let handle = registry.load("app", make_translator());
        handle.set_domains(vec!["posts".to_string()]);
        handle.translate("name", &TokenMap::new());
        assert!(handle.tainted());

        registry.clear();
        assert!(!handle.tainted());
        assert!(registry.default_translator().is_none());
        assert!(registry.get("app").is_err());
    }

    #[test]
    fn translate_goes_through_the_default() {
        let mut registry = TranslatorRegistry::new();
        let catalog = MemoryCatalog::new();
        catalog.insert("fr_FR", Some("posts"), "name", "Nom");
        let translator = Arc::new(Translator::new(
            Arc::new(FixedLocale::new("fr_FR")),
            Arc::new(catalog),
        ));
        translator.set_domain("posts");
        registry.load("app", translator);

        let out = registry.translate("name", &TokenMap::new()).unwrap();
        assert_eq!(out, "Nom");
    }
}
