//! Active and frontend locales seen by the finder.

use refinery_shared::I18nConfig;

/// Supplies the locale context for a lookup.
pub trait LocaleProvider {
    /// Locale used for title lookups and the implicit `locale` condition.
    fn current_locale(&self) -> &str;

    /// Locales enabled on the frontend, in preference order.
    fn frontend_locales(&self) -> &[String];
}

impl LocaleProvider for I18nConfig {
    fn current_locale(&self) -> &str {
        &self.current_locale
    }

    fn frontend_locales(&self) -> &[String] {
        &self.frontend_locales
    }
}

/// A fixed locale context, e.g. for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locales {
    current: String,
    frontend: Vec<String>,
}

impl Locales {
    pub fn new(current: impl Into<String>, frontend: Vec<String>) -> Self {
        Self {
            current: current.into(),
            frontend,
        }
    }

    /// Same frontend locales, different active locale.
    pub fn with_current(mut self, current: impl Into<String>) -> Self {
        self.current = current.into();
        self
    }
}

impl From<&I18nConfig> for Locales {
    fn from(config: &I18nConfig) -> Self {
        Self::new(config.current_locale.clone(), config.frontend_locales.clone())
    }
}

impl LocaleProvider for Locales {
    fn current_locale(&self) -> &str {
        &self.current
    }

    fn frontend_locales(&self) -> &[String] {
        &self.frontend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_keeps_frontend_list() {
        let config = I18nConfig {
            current_locale: "en".into(),
            frontend_locales: vec!["en".into(), "de".into()],
        };
        let locales = Locales::from(&config).with_current("de");
        assert_eq!(locales.current_locale(), "de");
        assert_eq!(locales.frontend_locales(), config.frontend_locales());
    }
}
