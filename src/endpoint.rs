//! Locale-aware endpoint URL derivation
//!
//! Both the suggestion lookup and search forwarding talk to a locale-specific
//! endpoint. The URL is a template with `{language}` and `{country}`
//! placeholders, filled from a normalized [`Locale`].

use crate::{
    error::{SearchError, SearchResult},
    types::Locale,
};
use once_cell::sync::OnceCell;
use std::env;
use std::fmt;
use std::sync::Arc;

/// Suggestion endpoint; the lookup appends [`SUGGEST_SUFFIX`] and the query
pub const DEFAULT_SUGGEST_TEMPLATE: &str =
    "https://www.google.com/complete/search?hl={language}&gl={country}&";

/// Search results page the browser is sent to
pub const DEFAULT_SEARCH_TEMPLATE: &str = "https://www.google.com/m?hl={language}&gl={country}";

/// Fixed parameters for JSON suggestions; the encoded query follows directly
pub const SUGGEST_SUFFIX: &str = "json=true&q=";

/// Canonical language tag sent to the endpoint.
///
/// Chinese and Portuguese are split by country; every other language passes
/// through lowercased.
pub fn language_tag(locale: &Locale) -> String {
    let language = locale.language.to_lowercase();
    let country = locale.country.to_lowercase();
    match (language.as_str(), country.as_str()) {
        ("zh", "cn") => "zh-CN".to_string(),
        ("zh", "tw") => "zh-TW".to_string(),
        ("pt", "br") => "pt-BR".to_string(),
        ("pt", "pt") => "pt-PT".to_string(),
        (language, _) => language.to_string(),
    }
}

/// Fills an endpoint template for a locale
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    template: String,
    client_id: Option<String>,
}

impl EndpointResolver {
    /// Validate and wrap a template.
    ///
    /// A template without a `{language}` placeholder cannot be localized and
    /// is rejected as a configuration error.
    pub fn new(template: &str, client_id: Option<&str>) -> SearchResult<Self> {
        if template.trim().is_empty() {
            return Err(SearchError::ConfigError(
                "Endpoint template is required".to_string(),
            ));
        }
        if !template.contains("{language}") {
            return Err(SearchError::ConfigError(format!(
                "Endpoint template has no {{language}} placeholder: {template}"
            )));
        }

        Ok(Self {
            template: template.to_string(),
            client_id: client_id
                .filter(|id| !id.trim().is_empty())
                .map(str::to_string),
        })
    }

    pub fn suggest() -> Self {
        Self {
            template: DEFAULT_SUGGEST_TEMPLATE.to_string(),
            client_id: None,
        }
    }

    pub fn search() -> Self {
        Self {
            template: DEFAULT_SEARCH_TEMPLATE.to_string(),
            client_id: None,
        }
    }

    /// Base URL for `locale`, including the client id if one is configured
    pub fn resolve(&self, locale: &Locale) -> String {
        let mut url = self
            .template
            .replace("{language}", &language_tag(locale))
            .replace("{country}", &locale.country.to_lowercase());

        if let Some(client_id) = &self.client_id {
            if url.ends_with('&') || url.ends_with('?') {
                url.push_str(&format!("client={client_id}&"));
            } else {
                url.push_str(&format!("&client={client_id}"));
            }
        }

        url
    }

    /// Base URL the encoded suggestion query is appended to
    pub fn suggest_base(&self, locale: &Locale) -> String {
        format!("{}{}", self.resolve(locale), SUGGEST_SUFFIX)
    }

    /// Base URL search parameters are appended to
    pub fn search_base(&self, locale: &Locale) -> String {
        self.resolve(locale)
    }
}

/// Where the current locale comes from.
///
/// Consulted at first use rather than at construction, since the host may
/// still be settling its localization when components are created.
pub trait LocaleSource: Send + Sync + fmt::Debug {
    fn current_locale(&self) -> Locale;
}

impl LocaleSource for Locale {
    fn current_locale(&self) -> Locale {
        self.clone()
    }
}

/// Locale from the environment with POSIX precedence.
///
/// The first of `LC_ALL`, `LC_MESSAGES` and `LANG` that is set and non-empty
/// decides; `C`, `POSIX` or an unparseable value there means `en_US` rather
/// than falling through to the next variable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLocale;

impl LocaleSource for SystemLocale {
    fn current_locale(&self) -> Locale {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.is_empty())
            .and_then(|value| Locale::parse(&value))
            .unwrap_or_default()
    }
}

/// Which base URL a [`CachedEndpoint`] hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointUse {
    Suggest,
    Search,
}

/// Base URL resolved on first use and kept for the lifetime of the owner
#[derive(Debug)]
pub struct CachedEndpoint {
    resolver: EndpointResolver,
    locale_source: Arc<dyn LocaleSource>,
    endpoint_use: EndpointUse,
    resolved: OnceCell<String>,
}

impl CachedEndpoint {
    pub fn new(
        resolver: EndpointResolver,
        locale_source: Arc<dyn LocaleSource>,
        endpoint_use: EndpointUse,
    ) -> Self {
        Self {
            resolver,
            locale_source,
            endpoint_use,
            resolved: OnceCell::new(),
        }
    }

    pub fn get(&self) -> &str {
        self.resolved.get_or_init(|| {
            let locale = self.locale_source.current_locale();
            let url = match self.endpoint_use {
                EndpointUse::Suggest => self.resolver.suggest_base(&locale),
                EndpointUse::Search => self.resolver.search_base(&locale),
            };
            log::debug!("Resolved {:?} endpoint for {locale}: {url}", self.endpoint_use);
            url
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tag(language: &str, country: &str) -> String {
        language_tag(&Locale::new(language, country))
    }

    #[test]
    fn test_chinese_split_by_country() {
        assert_eq!(tag("zh", "CN"), "zh-CN");
        assert_eq!(tag("zh", "TW"), "zh-TW");
        assert_eq!(tag("zh", "cn"), "zh-CN");
        assert_eq!(tag("zh", "HK"), "zh");
        assert_eq!(tag("zh", ""), "zh");
    }

    #[test]
    fn test_portuguese_split_by_country() {
        assert_eq!(tag("pt", "BR"), "pt-BR");
        assert_eq!(tag("pt", "PT"), "pt-PT");
        assert_eq!(tag("pt", "AO"), "pt");
    }

    #[test]
    fn test_other_languages_pass_through() {
        assert_eq!(tag("en", "US"), "en");
        assert_eq!(tag("de", "AT"), "de");
        assert_eq!(tag("xx", "YY"), "xx");
    }

    #[test]
    fn test_uppercase_language_is_normalized() {
        assert_eq!(tag("ZH", "CN"), "zh-CN");
        assert_eq!(tag("Pt", "br"), "pt-BR");
        assert_eq!(tag("EN", "US"), "en");
        assert_eq!(
            EndpointResolver::search().search_base(&Locale::new("ZH", "TW")),
            "https://www.google.com/m?hl=zh-TW&gl=tw"
        );
    }

    #[test]
    fn test_resolve_lowercases_country() {
        let resolver = EndpointResolver::suggest();
        assert_eq!(
            resolver.resolve(&Locale::new("zh", "TW")),
            "https://www.google.com/complete/search?hl=zh-TW&gl=tw&"
        );
        assert_eq!(
            resolver.suggest_base(&Locale::new("en", "GB")),
            "https://www.google.com/complete/search?hl=en&gl=gb&json=true&q="
        );
    }

    #[test]
    fn test_search_base_with_client_id() {
        let resolver = EndpointResolver::new(DEFAULT_SEARCH_TEMPLATE, Some("ms-android")).unwrap();
        assert_eq!(
            resolver.search_base(&Locale::new("pt", "BR")),
            "https://www.google.com/m?hl=pt-BR&gl=br&client=ms-android"
        );
    }

    #[test]
    fn test_suggest_base_with_client_id() {
        let resolver = EndpointResolver::new(DEFAULT_SUGGEST_TEMPLATE, Some("ms-android")).unwrap();
        assert_eq!(
            resolver.suggest_base(&Locale::new("fr", "FR")),
            "https://www.google.com/complete/search?hl=fr&gl=fr&client=ms-android&json=true&q="
        );
    }

    #[test]
    fn test_blank_client_id_ignored() {
        let resolver = EndpointResolver::new(DEFAULT_SEARCH_TEMPLATE, Some("  ")).unwrap();
        assert_eq!(
            resolver.search_base(&Locale::new("en", "US")),
            "https://www.google.com/m?hl=en&gl=us"
        );
    }

    #[test]
    fn test_invalid_templates_rejected() {
        assert!(matches!(
            EndpointResolver::new("", None),
            Err(SearchError::ConfigError(_))
        ));
        assert!(matches!(
            EndpointResolver::new("https://example.com/complete?", None),
            Err(SearchError::ConfigError(_))
        ));
    }

    #[derive(Debug, Default)]
    struct CountingLocale {
        calls: AtomicUsize,
    }

    impl LocaleSource for CountingLocale {
        fn current_locale(&self) -> Locale {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Locale::new("zh", "CN")
        }
    }

    #[test]
    fn test_cached_endpoint_resolves_once() {
        let source = Arc::new(CountingLocale::default());
        let cached = CachedEndpoint::new(
            EndpointResolver::suggest(),
            source.clone(),
            EndpointUse::Suggest,
        );

        assert!(cached.resolved.get().is_none());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        let first = cached.get().to_string();
        let second = cached.get().to_string();
        assert_eq!(first, second);
        assert!(first.contains("hl=zh-CN&gl=cn"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cached_endpoint_concurrent_first_use() {
        let source = Arc::new(CountingLocale::default());
        let cached = Arc::new(CachedEndpoint::new(
            EndpointResolver::search(),
            source.clone(),
            EndpointUse::Search,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cached = cached.clone();
                std::thread::spawn(move || cached.get().to_string())
            })
            .collect();

        let urls: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(urls.iter().all(|u| u == &urls[0]));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[serial]
    fn test_system_locale_from_env() {
        std::env::remove_var("LC_ALL");
        std::env::remove_var("LC_MESSAGES");
        std::env::set_var("LANG", "pt_PT.UTF-8");
        assert_eq!(SystemLocale.current_locale(), Locale::new("pt", "PT"));

        std::env::set_var("LC_ALL", "zh_TW.UTF-8");
        assert_eq!(SystemLocale.current_locale(), Locale::new("zh", "TW"));

        std::env::set_var("LC_ALL", "C");
        std::env::set_var("LANG", "C.UTF-8");
        assert_eq!(SystemLocale.current_locale(), Locale::default());

        std::env::remove_var("LC_ALL");
        std::env::remove_var("LANG");
    }

    #[test]
    #[serial]
    fn test_system_locale_first_set_variable_wins() {
        std::env::remove_var("LC_MESSAGES");
        std::env::set_var("LANG", "pt_PT.UTF-8");

        // LC_ALL=C overrides LANG
        std::env::set_var("LC_ALL", "C");
        assert_eq!(SystemLocale.current_locale(), Locale::new("en", "US"));

        std::env::set_var("LC_ALL", "POSIX");
        assert_eq!(SystemLocale.current_locale(), Locale::new("en", "US"));

        // Empty counts as unset
        std::env::set_var("LC_ALL", "");
        assert_eq!(SystemLocale.current_locale(), Locale::new("pt", "PT"));

        std::env::remove_var("LC_ALL");
        std::env::set_var("LC_MESSAGES", "de_AT.UTF-8");
        assert_eq!(SystemLocale.current_locale(), Locale::new("de", "AT"));

        std::env::remove_var("LC_MESSAGES");
        std::env::remove_var("LANG");
    }
}
