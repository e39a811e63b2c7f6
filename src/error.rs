//! Crate error type.
//! Configuration mistakes are fatal and carry the offending name.
//! Lookup misses and absent store entries are not errors and never
//! appear here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A formatter was selected by a name this crate does not provide.
    #[error("unknown formatter `{0}` (expected `icu` or `sprintf`)")]
    UnknownFormatter(String),

    /// A lifecycle phase was configured with an unrecognized action.
    #[error("unknown lifecycle action `{0}` (expected `load` or `save`)")]
    UnknownAction(String),

    /// No translator is registered under the requested name.
    #[error("no translator registered under `{0}`")]
    MissingTranslator(String),

    /// The persistent store failed to open or migrate.
    #[error("cache store error: {0}")]
    Store(#[from] rusqlite::Error),
}
