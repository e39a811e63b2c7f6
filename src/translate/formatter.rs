//! Token interpolation.
//! Two engines: ICU-style `{0}` / `{name}` placeholders (the default)
//! and printf-style `%s` / `%d`. Selection is by configured name; an
//! unrecognized name is a configuration error.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::Error;
use crate::translate::TokenMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormatter {
    #[default]
    Icu,
    Sprintf,
}

impl MessageFormatter {
    /// Select a formatter by its configured name. "default" aliases the
    /// ICU engine.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "icu" | "default" => Ok(Self::Icu),
            "sprintf" => Ok(Self::Sprintf),
            other => Err(Error::UnknownFormatter(other.to_string())),
        }
    }

    /// Interpolate `tokens` into `template`.
    pub fn format(&self, lang: &str, template: &str, tokens: &TokenMap) -> String {
        trace!(%lang, formatter = ?self, "format_message");
        match self {
            Self::Icu => format_icu(template, tokens),
            Self::Sprintf => format_sprintf(template, tokens),
        }
    }
}

fn token_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn icu_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\s*([A-Za-z0-9_]+)\s*\}").unwrap())
}

fn sprintf_spec() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%[%sd]").unwrap())
}

/// Replace `{name}` / `{0}` placeholders with matching token values.
/// Placeholders without a matching token are left untouched.
fn format_icu(template: &str, tokens: &TokenMap) -> String {
    icu_placeholder()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match tokens.get(&caps[1]) {
                Some(value) => token_text(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Substitute `%s` / `%d` specs with token values in positional order
/// (`%%` escapes a literal percent). Variant control keys (leading
/// underscore) never feed a spec.
fn format_sprintf(template: &str, tokens: &TokenMap) -> String {
    let mut ordered: Vec<(&String, &Value)> = tokens
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .collect();
    // Positional keys ("0", "1", ..., "10") sort numerically, named keys after.
    ordered.sort_by(|(a, _), (b, _)| match (a.parse::<usize>(), b.parse::<usize>()) {
        (Ok(left), Ok(right)) => left.cmp(&right),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
    let mut values = ordered.into_iter().map(|(_, value)| token_text(value));

    sprintf_spec()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            if &caps[0] == "%%" {
                "%".to_string()
            } else {
                values.next().unwrap_or_else(|| caps[0].to_string())
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::positional_tokens;

    #[test]
    fn unknown_name_is_a_configuration_error() {
        let err = MessageFormatter::from_name("mustache").unwrap_err();
        assert!(matches!(err, Error::UnknownFormatter(name) if name == "mustache"));
    }

    #[test]
    fn default_aliases_icu() {
        assert_eq!(MessageFormatter::from_name("default").unwrap(), MessageFormatter::Icu);
    }

    #[test]
    fn icu_positional_placeholders() {
        let tokens = positional_tokens(["multiple", "arguments"]);
        let out = MessageFormatter::Icu.format("fr_FR", "Some string with {0} {1}", &tokens);
        assert_eq!(out, "Some string with multiple arguments");
    }

    #[test]
    fn icu_named_placeholders_and_unmatched_are_kept() {
        let tokens = crate::translate::named_tokens([("name", "Alice")]);
        let out = MessageFormatter::Icu.format("en", "Hi {name}, {missing}!", &tokens);
        assert_eq!(out, "Hi Alice, {missing}!");
    }

    #[test]
    fn icu_numeric_token_renders_as_number() {
        let mut tokens = TokenMap::new();
        tokens.insert("0".to_string(), Value::from(3));
        let out = MessageFormatter::Icu.format("en", "{0} items", &tokens);
        assert_eq!(out, "3 items");
    }

    #[test]
    fn sprintf_consumes_tokens_in_positional_order() {
        let tokens = positional_tokens(["world", "again"]);
        let out = MessageFormatter::Sprintf.format("en", "hello %s and %s (100%%)", &tokens);
        assert_eq!(out, "hello world and again (100%)");
    }

    #[test]
    fn sprintf_ignores_variant_control_keys() {
        let mut tokens = positional_tokens(["three"]);
        tokens.insert("_count".to_string(), Value::from(3));
        let out = MessageFormatter::Sprintf.format("en", "%s items", &tokens);
        assert_eq!(out, "three items");
    }
}
