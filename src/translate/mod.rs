//! Translation lookup and caching.
//! A `Translator` resolves message keys by probing an ordered domain
//! list against a catalog resolver, memoizes every resolution in a
//! nested cache keyed by (language, domains key, message key), and
//! tracks whether unsaved entries exist since the last reset or import.

pub mod catalog;
pub mod formatter;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::Error;
use crate::locale::LocaleSource;
use crate::tree::Tree;

use catalog::CatalogResolver;
use formatter::MessageFormatter;

/// Token values handed to `translate`: positional ("0", "1", ...) or
/// named keys, plus the variant control keys `_count`, `_singular` and
/// `_context`.
pub type TokenMap = BTreeMap<String, Value>;

/// Variant control keys that qualify a cache path.
const VARIANT_KEYS: [&str; 3] = ["_count", "_singular", "_context"];

/// Token map from positional values ("0", "1", ...).
pub fn positional_tokens<I, T>(values: I) -> TokenMap
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| (index.to_string(), value.into()))
        .collect()
}

/// Token map from named values.
pub fn named_tokens<I, K, T>(values: I) -> TokenMap
where
    I: IntoIterator<Item = (K, T)>,
    K: Into<String>,
    T: Into<Value>,
{
    values
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Capability contract every pluggable translator implementation must
/// satisfy; the registry accepts nothing less.
pub trait TranslatorContract: Send + Sync {
    /// Clear domains, domains key, cache and the tainted flag.
    fn reset(&self);

    /// Active language, forwarded from the locale source.
    fn lang(&self) -> String;

    /// Current domain list.
    fn domains(&self) -> Vec<String>;

    /// Replace the domain list and recompute the domains key. Returns
    /// the new list.
    fn set_domains(&self, domains: Vec<String>) -> Vec<String>;

    /// Memoized key for the current domain list.
    fn domains_key(&self) -> String;

    /// Full cache as the nested JSON export shape.
    fn export(&self) -> Value;

    /// Merge a previously exported cache into this one. Replaces the
    /// cache wholesale when it is empty; otherwise merges leaf by leaf,
    /// leaving unrelated entries intact. Never taints.
    fn import(&self, cache: &Value);

    /// Whether `translate` inserted entries since the last reset.
    fn tainted(&self) -> bool;

    /// Resolve `key` through the cache (probing the catalog on a miss)
    /// and interpolate `tokens` into the result. Never fails: an
    /// untranslated key comes back unchanged.
    fn translate(&self, key: &str, tokens: &TokenMap) -> String;

    /// Plural form: looks up `plural` qualified by `_count` and
    /// `_singular` so it caches apart from the bare key.
    fn translate_plural(&self, singular: &str, plural: &str, count: i64, tokens: &TokenMap) -> String {
        let mut tokens = tokens.clone();
        tokens.insert("_count".to_string(), Value::from(count));
        tokens.insert("_singular".to_string(), Value::from(singular));
        self.translate(plural, &tokens)
    }

    /// Context-qualified form.
    fn translate_context(&self, context: &str, key: &str, tokens: &TokenMap) -> String {
        let mut tokens = tokens.clone();
        tokens.insert("_context".to_string(), Value::from(context));
        self.translate(key, &tokens)
    }

    /// Plural and context combined.
    fn translate_plural_context(
        &self,
        context: &str,
        singular: &str,
        plural: &str,
        count: i64,
        tokens: &TokenMap,
    ) -> String {
        let mut tokens = tokens.clone();
        tokens.insert("_count".to_string(), Value::from(count));
        tokens.insert("_singular".to_string(), Value::from(singular));
        tokens.insert("_context".to_string(), Value::from(context));
        self.translate(plural, &tokens)
    }
}

impl std::fmt::Debug for dyn TranslatorContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn TranslatorContract").finish_non_exhaustive()
    }
}

/// Mutable translator state. Kept behind one lock so the domain list
/// and its derived key are always observed together.
struct TranslatorState {
    domains: Vec<String>,
    domains_key: String,
    cache: Tree,
    tainted: bool,
}

impl TranslatorState {
    fn new() -> Self {
        Self {
            domains: Vec::new(),
            domains_key: encode_domains_key(&[]),
            cache: Tree::new(),
            tainted: false,
        }
    }
}

/// Deterministic serialization of an ordered domain list: a compact
/// JSON array. Equal lists yield equal keys; everything downstream
/// treats the result as opaque.
fn encode_domains_key(domains: &[String]) -> String {
    serde_json::to_string(domains).unwrap_or_else(|_| "[]".to_string())
}

/// Fold the present variant tokens into the message key so plural and
/// context variants occupy distinct cache entries.
fn qualified_key(key: &str, tokens: &TokenMap) -> String {
    let mut variants = Map::new();
    for name in VARIANT_KEYS {
        if let Some(value) = tokens.get(name) {
            variants.insert(name.to_string(), value.clone());
        }
    }
    if variants.is_empty() {
        key.to_string()
    } else {
        format!("{key}@{}", Value::Object(variants))
    }
}

/// The memoizing translator. Shared as `Arc<dyn TranslatorContract>`;
/// all state sits behind an internal lock, so `&self` suffices
/// everywhere.
pub struct Translator {
    locale: Arc<dyn LocaleSource>,
    catalog: Arc<dyn CatalogResolver>,
    formatter: MessageFormatter,
    state: RwLock<TranslatorState>,
}

impl Translator {
    /// Translator over the given collaborators with the default (ICU)
    /// formatter.
    pub fn new(locale: Arc<dyn LocaleSource>, catalog: Arc<dyn CatalogResolver>) -> Self {
        Self::with_formatter(locale, catalog, MessageFormatter::default())
    }

    pub fn with_formatter(
        locale: Arc<dyn LocaleSource>,
        catalog: Arc<dyn CatalogResolver>,
        formatter: MessageFormatter,
    ) -> Self {
        Self {
            locale,
            catalog,
            formatter,
            state: RwLock::new(TranslatorState::new()),
        }
    }

    /// Translator selecting the formatter by configured name. An
    /// unrecognized name is a configuration error.
    pub fn with_formatter_name(
        locale: Arc<dyn LocaleSource>,
        catalog: Arc<dyn CatalogResolver>,
        name: &str,
    ) -> Result<Self, Error> {
        Ok(Self::with_formatter(locale, catalog, MessageFormatter::from_name(name)?))
    }

    /// Convenience for a single-domain list.
    pub fn set_domain(&self, domain: &str) -> Vec<String> {
        self.set_domains(vec![domain.to_string()])
    }

    /// Probe the ordered domain list; the first domain whose catalog
    /// answer differs from the bare key wins, then the domain-less
    /// default catalog gets the last word.
    fn resolve(&self, domains: &[String], lang: &str, key: &str) -> String {
        for domain in domains {
            let message = self.catalog.resolve(Some(domain), lang, key);
            if message != key {
                return message;
            }
        }
        self.catalog.resolve(None, lang, key)
    }
}

impl TranslatorContract for Translator {
    fn reset(&self) {
        let mut state = self.state.write();
        *state = TranslatorState::new();
        debug!("translator_reset");
    }

    fn lang(&self) -> String {
        self.locale.locale()
    }

    fn domains(&self) -> Vec<String> {
        self.state.read().domains.clone()
    }

    fn set_domains(&self, domains: Vec<String>) -> Vec<String> {
        let mut state = self.state.write();
        state.domains = domains;
        state.domains_key = encode_domains_key(&state.domains);
        debug!(domains_key = %state.domains_key, "domains_set");
        state.domains.clone()
    }

    fn domains_key(&self) -> String {
        self.state.read().domains_key.clone()
    }

    fn export(&self) -> Value {
        self.state.read().cache.to_value()
    }

    fn import(&self, cache: &Value) {
        let mut state = self.state.write();
        if state.cache.is_empty() {
            state.cache = Tree::from_value(cache);
        } else {
            state.cache.merge_value(cache);
        }
        // Imported entries were already persisted; the tainted flag
        // only tracks work the store has not seen.
        debug!("cache_imported");
    }

    fn tainted(&self) -> bool {
        self.state.read().tainted
    }

    fn translate(&self, key: &str, tokens: &TokenMap) -> String {
        let lang = self.locale.locale();
        let qualified = qualified_key(key, tokens);

        let mut state = self.state.write();
        let domains_key = state.domains_key.clone();
        let path = [lang.as_str(), domains_key.as_str(), qualified.as_str()];

        let cached = state.cache.get(&path).map(str::to_string);
        let message = match cached {
            Some(message) => {
                trace!(%lang, key, "cache_hit");
                message
            }
            None => {
                let resolved = self.resolve(&state.domains, &lang, key);
                // An untranslated key (resolved == key) is cached too,
                // so known-missing keys never probe the catalog twice.
                state.cache.insert(&path, resolved.clone());
                state.tainted = true;
                debug!(%lang, key, translated = resolved != key, "cache_miss_resolved");
                resolved
            }
        };
        drop(state);

        if tokens.is_empty() {
            return message;
        }
        self.formatter.format(&lang, &message, tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::locale::FixedLocale;
    use crate::translate::catalog::MemoryCatalog;

    /// Counts every catalog probe so tests can assert memoization.
    struct CountingCatalog {
        inner: MemoryCatalog,
        probes: AtomicUsize,
    }

    impl CountingCatalog {
        fn new(inner: MemoryCatalog) -> Self {
            Self {
                inner,
                probes: AtomicUsize::new(0),
            }
        }

        fn probes(&self) -> usize {
            self.probes.load(Ordering::SeqCst)
        }
    }

    impl CatalogResolver for CountingCatalog {
        fn resolve(&self, domain: Option<&str>, lang: &str, key: &str) -> String {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(domain, lang, key)
        }
    }

    fn groups_catalog() -> MemoryCatalog {
        let catalog = MemoryCatalog::new();
        catalog.insert("fr_FR", Some("groups_index"), "Group.name", "Nom");
        catalog.insert("fr_FR", Some("groups"), "Group.name", "Nom du groupe");
        catalog
    }

    fn translator(catalog: Arc<dyn CatalogResolver>) -> Translator {
        Translator::new(Arc::new(FixedLocale::new("fr_FR")), catalog)
    }

    #[test]
    fn lang_forwards_to_the_locale_source() {
        let translator = translator(Arc::new(MemoryCatalog::new()));
        assert_eq!(translator.lang(), "fr_FR");
    }

    #[test]
    fn set_domains_recomputes_the_key() {
        let translator = translator(Arc::new(MemoryCatalog::new()));
        assert_eq!(translator.domains_key(), "[]");

        let domains = translator.set_domain("groups_index");
        assert_eq!(domains, vec!["groups_index".to_string()]);
        assert_eq!(translator.domains(), domains);
        assert_eq!(translator.domains_key(), r#"["groups_index"]"#);
    }

    #[test]
    fn equal_domain_lists_yield_equal_keys() {
        let a = translator(Arc::new(MemoryCatalog::new()));
        let b = translator(Arc::new(MemoryCatalog::new()));
        a.set_domains(vec!["x".into(), "y".into()]);
        b.set_domains(vec!["x".into(), "y".into()]);
        assert_eq!(a.domains_key(), b.domains_key());

        b.set_domains(vec!["y".into(), "x".into()]);
        assert_ne!(a.domains_key(), b.domains_key());
    }

    #[test]
    fn first_domain_with_a_translation_wins() {
        let translator = translator(Arc::new(groups_catalog()));

        translator.set_domains(vec!["groups_index".into(), "groups".into()]);
        assert_eq!(translator.translate("Group.name", &TokenMap::new()), "Nom");

        translator.set_domains(vec!["groups".into(), "groups_index".into()]);
        assert_eq!(
            translator.translate("Group.name", &TokenMap::new()),
            "Nom du groupe"
        );
    }

    #[test]
    fn falls_through_to_the_default_catalog() {
        let catalog = MemoryCatalog::new();
        catalog.insert("fr_FR", None, "greeting", "Bonjour");
        let translator = translator(Arc::new(catalog));
        translator.set_domain("posts");

        assert_eq!(translator.translate("greeting", &TokenMap::new()), "Bonjour");
    }

    #[test]
    fn repeated_lookups_probe_the_catalog_once() {
        let counting = Arc::new(CountingCatalog::new(groups_catalog()));
        let translator = translator(counting.clone());
        translator.set_domain("groups");

        let first = translator.translate("Group.name", &TokenMap::new());
        let probes_after_first = counting.probes();
        let second = translator.translate("Group.name", &TokenMap::new());

        assert_eq!(first, second);
        assert_eq!(counting.probes(), probes_after_first);
    }

    #[test]
    fn unknown_keys_are_cached_and_taint() {
        let counting = Arc::new(CountingCatalog::new(MemoryCatalog::new()));
        let translator = translator(counting.clone());
        translator.set_domain("posts");

        assert!(!translator.tainted());
        assert_eq!(translator.translate("missing", &TokenMap::new()), "missing");
        assert!(translator.tainted());

        let probes_after_first = counting.probes();
        translator.translate("missing", &TokenMap::new());
        assert_eq!(counting.probes(), probes_after_first);
    }

    #[test]
    fn tokens_trigger_a_formatting_pass() {
        let translator = translator(Arc::new(MemoryCatalog::new()));
        translator.set_domain("posts");

        let out = translator.translate(
            "Some string with {0} {1}",
            &positional_tokens(["multiple", "arguments"]),
        );
        assert_eq!(out, "Some string with multiple arguments");
    }

    #[test]
    fn reset_clears_cache_domains_and_taint() {
        let translator = translator(Arc::new(groups_catalog()));
        translator.set_domain("groups_index");
        translator.translate("Group.name", &TokenMap::new());
        assert!(translator.tainted());

        translator.reset();
        assert!(!translator.tainted());
        assert!(translator.domains().is_empty());
        assert_eq!(translator.export(), json!({}));
    }

    #[test]
    fn export_shape_matches_the_persistence_contract() {
        let translator = translator(Arc::new(groups_catalog()));
        translator.set_domain("groups_index");
        translator.translate("Group.name", &TokenMap::new());
        translator.translate("Some string with {0}", &positional_tokens(["arguments"]));

        let expected = json!({
            "fr_FR": {
                r#"["groups_index"]"#: {
                    "Group.name": "Nom",
                    "Some string with {0}": "Some string with {0}",
                }
            }
        });
        assert_eq!(translator.export(), expected);
    }

    #[test]
    fn import_into_empty_cache_replaces_wholesale() {
        let translator = translator(Arc::new(MemoryCatalog::new()));
        let cache = json!({
            "fr_FR": { r#"["groups_index2"]"#: { "Group.name": "Nom" } }
        });
        translator.import(&cache);
        translator.set_domain("groups_index2");

        assert_eq!(translator.translate("Group.name", &TokenMap::new()), "Nom");
        assert!(!translator.tainted());
    }

    #[test]
    fn import_merges_without_disturbing_existing_entries() {
        let translator = translator(Arc::new(groups_catalog()));
        translator.set_domain("groups_index");
        translator.translate("Group.name", &TokenMap::new());
        let before = translator.export();

        translator.import(&json!({
            "fr_FR": { r#"["groups_index"]"#: { "other": "Autre" } }
        }));

        let after = translator.export();
        assert_eq!(after["fr_FR"][r#"["groups_index"]"#]["Group.name"], "Nom");
        assert_eq!(after["fr_FR"][r#"["groups_index"]"#]["other"], "Autre");
        assert_ne!(before, after);
    }

    #[test]
    fn importing_an_export_changes_nothing() {
        let translator = translator(Arc::new(groups_catalog()));
        translator.set_domain("groups_index");
        translator.translate("Group.name", &TokenMap::new());

        let exported = translator.export();
        translator.import(&exported);
        assert_eq!(translator.export(), exported);
    }

    #[test]
    fn empty_import_changes_nothing() {
        let translator = translator(Arc::new(MemoryCatalog::new()));
        translator.import(&json!({
            "fr_FR": { r#"["groups_index2"]"#: { "Group.name": "Nom" } }
        }));
        translator.import(&json!({}));
        translator.set_domain("groups_index2");

        assert_eq!(translator.translate("Group.name", &TokenMap::new()), "Nom");
    }

    #[test]
    fn plural_and_context_variants_cache_apart_from_the_bare_key() {
        let translator = translator(Arc::new(MemoryCatalog::new()));
        translator.set_domain("posts");

        translator.translate("items", &TokenMap::new());
        translator.translate_plural("item", "items", 3, &TokenMap::new());
        translator.translate_context("menu", "items", &TokenMap::new());

        let exported = translator.export();
        let partition = &exported["fr_FR"][r#"["posts"]"#];
        let keys: Vec<&String> = partition
            .as_object()
            .map(|map| map.keys().collect())
            .unwrap_or_default();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn variant_qualifier_is_deterministic() {
        let mut tokens = TokenMap::new();
        tokens.insert("_singular".to_string(), Value::from("item"));
        tokens.insert("_count".to_string(), Value::from(3));
        tokens.insert("0".to_string(), Value::from("x"));

        let qualified = qualified_key("items", &tokens);
        assert_eq!(qualified, r#"items@{"_count":3,"_singular":"item"}"#);
    }
}
