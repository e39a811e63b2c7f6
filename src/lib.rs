//! lingo-cache: route-scoped translation lookup cache.
//!
//! Message keys are resolved by probing an ordered list of translation
//! domains (derived from the current route) against a catalog resolver.
//! Every resolution is memoized per (language, domain set, message key)
//! and the memo is loaded from and saved to a persistent store at
//! request lifecycle phases, so repeated requests for the same route
//! skip the catalog entirely.

pub mod error;
pub mod lifecycle;
pub mod locale;
pub mod registry;
pub mod store;
pub mod translate;
pub mod tree;

pub use error::Error;
pub use lifecycle::{BindingConfig, Phase, PhaseAction, RequestBinding, RouteParams};
pub use locale::{FixedLocale, LocaleSource, SystemLocale};
pub use registry::TranslatorRegistry;
pub use store::{CacheStore, MemoryStore, SqliteStore};
pub use translate::catalog::{CatalogResolver, MemoryCatalog};
pub use translate::formatter::MessageFormatter;
pub use translate::{named_tokens, positional_tokens, TokenMap, Translator, TranslatorContract};
pub use tree::Tree;
