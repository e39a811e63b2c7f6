//! Locale source boundary.
//! The translator never decides the active language itself; it forwards
//! to whatever locale configuration the host application carries.

/// Provides the active language/locale identifier (e.g. "fr_FR").
pub trait LocaleSource: Send + Sync {
    fn locale(&self) -> String;
}

/// Fixed locale, set once at construction. Suits request-scoped
/// translators and tests.
#[derive(Debug, Clone)]
pub struct FixedLocale(String);

impl FixedLocale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(locale.into())
    }
}

impl LocaleSource for FixedLocale {
    fn locale(&self) -> String {
        self.0.clone()
    }
}

/// Locale from the process environment (`LC_ALL`, `LC_MESSAGES`,
/// `LANG`), falling back to a configured default. Encoding suffixes are
/// stripped ("fr_FR.UTF-8" reads as "fr_FR").
#[derive(Debug, Clone)]
pub struct SystemLocale {
    fallback: String,
}

impl SystemLocale {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            fallback: fallback.into(),
        }
    }
}

impl LocaleSource for SystemLocale {
    fn locale(&self) -> String {
        for var in ["LC_ALL", "LC_MESSAGES", "LANG"] {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    let trimmed = value.split('.').next().unwrap_or(&value);
                    return trimmed.to_string();
                }
            }
        }
        self.fallback.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_locale_returns_what_it_was_given() {
        assert_eq!(FixedLocale::new("fr_FR").locale(), "fr_FR");
    }
}
