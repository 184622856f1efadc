//! Routing context the compiler needs to turn hrefs into navigable URLs.

use std::sync::LazyLock;

use quire_config::Config;
use quire_router::{ANCHOR_KEY, Router};
use regex::Regex;

static LAST_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/[^/]*$").unwrap());

/// Routing context for one compile.
pub trait LinkResolver {
    /// Current route path including query and fragment.
    fn current_path(&self) -> String;

    /// Navigable URL for `path`; see `quire_router::History::to_url`.
    fn to_url(&self, path: &str, params: &[(&str, &str)], current_route: Option<&str>) -> String;

    /// Base path files are served from.
    fn content_base(&self) -> String;

    /// File of the current route, the key of the per-file TOC cache.
    fn current_file(&self) -> String;

    /// Whether routing uses native history.
    fn is_native(&self) -> bool;

    /// Full URL of the current document.
    fn document_url(&self) -> String;

    /// URL of the heading anchor `slug` on the current page.
    fn heading_url(&self, slug: &str) -> String {
        self.to_url(&self.current_path(), &[(ANCHOR_KEY, slug)], None)
    }

    /// Directory of the current document, for `./` links left uncompiled.
    fn document_dir(&self) -> String {
        let url = self.document_url();
        LAST_SEGMENT_RE.replace(&url, "/").replace("#/./", "")
    }
}

impl LinkResolver for Router {
    fn current_path(&self) -> String {
        Router::current_path(self)
    }

    fn to_url(&self, path: &str, params: &[(&str, &str)], current_route: Option<&str>) -> String {
        Router::to_url(self, path, params, current_route)
    }

    fn content_base(&self) -> String {
        self.base_path()
    }

    fn current_file(&self) -> String {
        self.parse(None).file
    }

    fn is_native(&self) -> bool {
        self.history().is_native()
    }

    fn document_url(&self) -> String {
        self.location().href().to_owned()
    }
}

/// How links are compiled.
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    pub homepage: String,
    pub external_target: String,
    pub external_rel: String,
    no_compile: Vec<Regex>,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl LinkPolicy {
    /// Build from config; invalid `no_compile` patterns are skipped.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let no_compile = config
            .links
            .no_compile
            .iter()
            .filter_map(|pattern| match Regex::new(&format!("^(?:{pattern})$")) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "Skipping invalid no-compile link pattern");
                    None
                }
            })
            .collect();
        Self {
            homepage: config.docs.homepage.clone(),
            external_target: config.links.external_target.clone(),
            external_rel: config.links.external_rel.clone(),
            no_compile,
        }
    }

    /// Whether `href` must be left as written.
    #[must_use]
    pub fn is_no_compile(&self, href: &str) -> bool {
        self.no_compile.iter().any(|re| re.is_match(href))
    }
}
