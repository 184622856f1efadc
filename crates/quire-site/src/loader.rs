//! Fetch strategies of one navigation cycle.
//!
//! Everything here only reads shared state, so the main page and the navbar
//! can be loaded on the rayon pool at the same time.

use chrono::{DateTime, Utc};
use quire_config::{Config, NotFoundPage};
use quire_fetch::{Fetch, Fetched};
use quire_router::Router;
use quire_router::path::{is_external, parent_path};

/// Main content of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MainPage {
    /// `None` when every fallback failed.
    pub text: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    /// File the text was served from.
    pub file: String,
}

impl MainPage {
    fn missing(file: String) -> Self {
        Self {
            text: None,
            updated_at: None,
            file,
        }
    }

    fn found(file: String, fetched: Fetched) -> Self {
        Self {
            text: Some(fetched.body),
            updated_at: fetched.updated_at,
            file,
        }
    }

    pub fn is_html(&self) -> bool {
        self.file.ends_with(".html")
    }
}

/// Read-only view of what fetching needs.
#[derive(Clone, Copy)]
pub(crate) struct Loader<'a> {
    pub fetch: &'a dyn Fetch,
    pub router: &'a Router,
    pub config: &'a Config,
}

impl Loader<'_> {
    fn get(&self, url: &str) -> Result<Fetched, quire_fetch::FetchError> {
        self.fetch.get(url, &self.config.fetch.request_headers)
    }

    /// Whether `file` lives on another origin.
    pub fn is_remote(&self, file: &str) -> bool {
        is_external(file, self.router.location().origin())
    }

    /// Fetch the page for `path`, falling back to the default-language page
    /// and then to the not-found page.
    pub fn main(&self, path: &str, qs: &str) -> MainPage {
        let file = self.router.file(path);
        match self.get(&format!("{file}{qs}")) {
            Ok(fetched) => return MainPage::found(file, fetched),
            Err(e) => tracing::debug!(file = %file, error = %e, "Page fetch failed"),
        }

        if let Some(fallback) = self.fallback_file(path) {
            match self.get(&format!("{fallback}{qs}")) {
                Ok(fetched) => return MainPage::found(fallback, fetched),
                Err(e) => tracing::debug!(file = %fallback, error = %e, "Fallback fetch failed"),
            }
        }

        if let Some(page) = not_found_path(self.config, path) {
            let file = self.router.file(&page);
            match self.get(&file) {
                Ok(fetched) => return MainPage::found(file, fetched),
                Err(e) => tracing::warn!(file = %file, error = %e, "Not-found page fetch failed"),
            }
        }
        MainPage::missing(file)
    }

    /// Default-language file for a path under a fallback language prefix.
    fn fallback_file(&self, path: &str) -> Option<String> {
        let lang = path.split('/').nth(1)?;
        if lang.is_empty() || !self.config.fetch.fallback_languages.iter().any(|l| l == lang) {
            return None;
        }
        let stripped = &path[lang.len() + 1..];
        Some(self.router.file(stripped))
    }

    /// Walk up from the directory of `path` until `file` is found.
    pub fn nested(&self, path: &str, qs: &str, file: &str) -> Option<Fetched> {
        let mut dir = parent_path(path);
        loop {
            if dir.is_empty() {
                return None;
            }
            let url = format!("{}{qs}", self.router.file(&format!("{dir}{file}")));
            match self.get(&url) {
                Ok(fetched) => return Some(fetched),
                Err(e) => tracing::debug!(url = %url, error = %e, "Nested file not found"),
            }
            let next = parent_path(dir.strip_suffix('/').unwrap_or(&dir));
            if next == dir {
                return None;
            }
            dir = next;
        }
    }
}

/// Not-found page configured for `path`, if any.
///
/// With a prefix table the longest matching prefix wins; without a match
/// the default `_404` page is used.
#[must_use]
pub fn not_found_path(config: &Config, path: &str) -> Option<String> {
    let default = format!("_404{}", config.docs.ext);
    match &config.fetch.not_found_page {
        NotFoundPage::Enabled(false) => None,
        NotFoundPage::Enabled(true) => Some(default),
        NotFoundPage::Path(page) => Some(page.clone()),
        NotFoundPage::PerPrefix(pages) => Some(
            pages
                .iter()
                .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len())
                .map_or(default, |(_, page)| page.clone()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_fetch::MockFetch;
    use quire_router::Location;
    use std::collections::BTreeMap;

    fn router(config: &Config, href: &str) -> Router {
        let mut router = Router::new(config, Location::new(href));
        router.update_render();
        router
    }

    #[test]
    fn test_main_page() {
        let config = Config::default();
        let router = router(&config, "http://x.io/#/guide");
        let fetch = MockFetch::new().with_page("/guide.md", "# Guide");
        let loader = Loader {
            fetch: &fetch,
            router: &router,
            config: &config,
        };
        let page = loader.main("/guide", "");
        assert_eq!(page.text.as_deref(), Some("# Guide"));
        assert_eq!(page.file, "/guide.md");
        assert!(!page.is_html());
    }

    #[test]
    fn test_language_fallback() {
        let mut config = Config::default();
        config.fetch.fallback_languages = vec!["fr".to_owned()];
        let router = router(&config, "http://x.io/#/fr/guide");
        let fetch = MockFetch::new().with_page("/guide.md", "# Guide");
        let loader = Loader {
            fetch: &fetch,
            router: &router,
            config: &config,
        };
        let page = loader.main("/fr/guide", "");
        assert_eq!(page.text.as_deref(), Some("# Guide"));
        assert_eq!(fetch.requested(), vec!["/fr/guide.md", "/guide.md"]);
    }

    #[test]
    fn test_not_found_page() {
        let mut config = Config::default();
        config.fetch.not_found_page = NotFoundPage::Enabled(true);
        let router = router(&config, "http://x.io/#/missing");
        let fetch = MockFetch::new().with_page("/_404.md", "# Lost");
        let loader = Loader {
            fetch: &fetch,
            router: &router,
            config: &config,
        };
        let page = loader.main("/missing", "");
        assert_eq!(page.text.as_deref(), Some("# Lost"));
        assert_eq!(page.file, "/_404.md");
    }

    #[test]
    fn test_everything_missing() {
        let config = Config::default();
        let router = router(&config, "http://x.io/#/missing");
        let fetch = MockFetch::new();
        let loader = Loader {
            fetch: &fetch,
            router: &router,
            config: &config,
        };
        assert_eq!(loader.main("/missing", "").text, None);
    }

    #[test]
    fn test_not_found_path_prefixes() {
        let mut config = Config::default();
        config.fetch.not_found_page = NotFoundPage::PerPrefix(BTreeMap::from([
            ("/".to_owned(), "_404.md".to_owned()),
            ("/de".to_owned(), "de/_404.md".to_owned()),
        ]));
        assert_eq!(not_found_path(&config, "/de/x").as_deref(), Some("de/_404.md"));
        assert_eq!(not_found_path(&config, "/x").as_deref(), Some("_404.md"));

        config.fetch.not_found_page = NotFoundPage::Enabled(false);
        assert_eq!(not_found_path(&config, "/x"), None);
    }

    #[test]
    fn test_nested_walks_up() {
        let config = Config::default();
        let router = router(&config, "http://x.io/#/guide/deep/page");
        let fetch = MockFetch::new().with_page("/_sidebar.md", "- [Home](/)");
        let loader = Loader {
            fetch: &fetch,
            router: &router,
            config: &config,
        };
        let found = loader.nested("/guide/deep/page", "", "_sidebar.md").unwrap();
        assert_eq!(found.body, "- [Home](/)");
        assert_eq!(
            fetch.requested(),
            vec!["/guide/deep/_sidebar.md", "/guide/_sidebar.md", "/_sidebar.md"]
        );
    }

    #[test]
    fn test_nested_gives_up_at_root() {
        let config = Config::default();
        let router = router(&config, "http://x.io/#/guide");
        let fetch = MockFetch::new();
        let loader = Loader {
            fetch: &fetch,
            router: &router,
            config: &config,
        };
        assert!(loader.nested("/guide", "", "_navbar.md").is_none());
        assert_eq!(fetch.requested(), vec!["/_navbar.md"]);
    }

    #[test]
    fn test_nested_stops_on_path_with_whitespace() {
        let config = Config::default();
        let router = router(&config, "http://x.io/#/a b/c");
        let fetch = MockFetch::new();
        let loader = Loader {
            fetch: &fetch,
            router: &router,
            config: &config,
        };
        assert!(loader.nested("/a b/c", "", "_sidebar.md").is_none());
        assert_eq!(fetch.requested(), vec!["/b/_sidebar.md"]);
    }
}
