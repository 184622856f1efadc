//! History strategies: `#/path` fragments or native push-state.
//!
//! Both strategies share the file resolution and URL generation in
//! [`Resolver`]; they differ in how the current path is read from the
//! [`Location`], how navigation signals are classified, and whether the
//! location gets normalized.

use quire_config::Config;

use crate::location::Location;
use crate::path::{
    AliasTable, clean_path, file_name, is_absolute_path, join_path, resolve_path, replace_slug,
};
use crate::query::Query;
use crate::route::Route;

/// Where a navigation originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Source {
    /// A link click inside the site.
    Navigate,
    /// Back/forward or a manually edited URL.
    History,
}

/// Raw navigation input, as a browser would deliver it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationSignal {
    /// A click on an anchor element.
    LinkClick { href: String, target: Option<String> },
    /// The fragment changed; `url` is the new href.
    HashChange { url: String },
    /// The session history moved; `url` is the new href.
    PopState { url: String },
}

/// A navigation the router has to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    /// The route may have changed.
    Changed { source: Source },
    /// A registered cross-origin link was opened in place of the site.
    OpenSelf { url: String },
}

fn opens_new_window(target: Option<&str>) -> bool {
    target.is_some_and(|t| t.contains("_blank"))
}

/// Shared file resolution and URL generation.
#[derive(Debug, Clone)]
pub struct Resolver {
    base_path: String,
    ext: String,
    homepage: String,
    relative_path: bool,
    aliases: AliasTable,
}

impl Resolver {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            base_path: config.docs.base_path.clone(),
            ext: config.docs.ext.clone(),
            homepage: config.docs.homepage.clone(),
            relative_path: config.router.relative_path,
            aliases: AliasTable::new(&config.router.alias),
        }
    }

    /// Configured base path.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// Alias, extension, homepage, then prefix with `base` unless absolute.
    #[must_use]
    pub fn file(&self, base: &str, path: &str, relative: bool) -> String {
        let path = self.aliases.apply(path);
        let path = file_name(&path, &self.ext);
        let path = if path == format!("/README{}", self.ext) && !self.homepage.is_empty() {
            self.homepage.clone()
        } else {
            path
        };
        let path = if is_absolute_path(&path) {
            path
        } else {
            join_path(&[base, &path])
        };
        if relative && !base.is_empty() {
            path.strip_prefix(base).map_or(path.clone(), str::to_owned)
        } else {
            path
        }
    }

    /// Shared part of URL generation: merge params, drop the extension, apply
    /// the local-anchor and relative-path rules.
    fn to_path(
        &self,
        route: Route,
        params: &[(&str, &str)],
        local: bool,
        current_route: Option<&str>,
    ) -> String {
        let mut query = route.query;
        for (key, value) in params {
            query.insert(key, Some((*value).to_owned()));
        }
        let mut path = strip_ext(&format!("{}{}", route.path, query.to_query_string(&[])), &self.ext);

        let current = current_route.unwrap_or_default();
        if local {
            let end = current.find('?').filter(|&i| i > 0).unwrap_or(current.len());
            path = format!("{}{path}", &current[..end]);
        }

        if self.relative_path && !path.starts_with('/') {
            let dir = current.rfind('/').map_or("", |i| &current[..=i]);
            return clean_path(&resolve_path(&format!("{dir}{path}")));
        }

        clean_path(&format!("/{path}"))
    }
}

/// Remove `ext` right before the query string or at the end.
fn strip_ext(path: &str, ext: &str) -> String {
    let (head, tail) = path.find('?').map_or((path, ""), |i| path.split_at(i));
    match head.strip_suffix(ext) {
        Some(stripped) => format!("{stripped}{tail}"),
        None => path.to_owned(),
    }
}

/// Split `path?query` into its parts.
fn split_query(path: &str) -> (&str, &str) {
    path.split_once('?').unwrap_or((path, ""))
}

/// `#/path` fragment routing.
#[derive(Debug, Clone)]
pub struct HashHistory {
    resolver: Resolver,
    navigating: bool,
}

impl HashHistory {
    #[must_use]
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            navigating: false,
        }
    }

    /// Base path relative to the page that hosts the site.
    fn base_path(&self, location: &Location) -> String {
        let base = self.resolver.base_path();
        if base.starts_with('/') || base.starts_with("http:") || base.starts_with("https:") {
            return base.to_owned();
        }
        let pathname = location.pathname();
        let joined = if pathname.ends_with(".html") {
            format!("{pathname}#/{base}")
        } else {
            format!("{pathname}/{base}")
        };
        clean_path(&joined)
    }

    fn current_path(location: &Location) -> String {
        let href = location.href();
        href.find('#').map_or(String::new(), |i| href[i + 1..].to_owned())
    }

    fn parse(&self, location: &Location, raw: &str) -> Route {
        let path = raw.find('#').map_or(raw, |i| &raw[i + 1..]);
        let (path, query) = split_query(path);
        Route {
            path: path.to_owned(),
            file: self.resolver.file(&self.base_path(location), path, true),
            query: Query::parse(query),
        }
    }

    fn on_change(&mut self, location: &mut Location, signal: NavigationSignal) -> Option<HistoryEvent> {
        match signal {
            NavigationSignal::LinkClick { href, target } => {
                if opens_new_window(target.as_deref()) {
                    return None;
                }
                self.navigating = true;
                let before = location.hash().to_owned();
                location.push(&href);
                if location.hash() == before {
                    return None;
                }
                Some(self.hash_changed())
            }
            NavigationSignal::HashChange { url } => {
                if url != location.href() {
                    location.push(&url);
                }
                Some(self.hash_changed())
            }
            NavigationSignal::PopState { .. } => None,
        }
    }

    fn hash_changed(&mut self) -> HistoryEvent {
        let source = if self.navigating {
            Source::Navigate
        } else {
            Source::History
        };
        self.navigating = false;
        HistoryEvent::Changed { source }
    }

    fn normalize(location: &mut Location) {
        let path = replace_slug(&Self::current_path(location));
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        let href = format!("{}#{path}", location.without_hash());
        if href != location.href() {
            location.replace(&href);
        }
    }
}

/// Native push-state routing.
#[derive(Debug, Clone)]
pub struct NativeHistory {
    resolver: Resolver,
    cross_origin_links: Vec<String>,
}

impl NativeHistory {
    #[must_use]
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            cross_origin_links: Vec::new(),
        }
    }

    fn current_path(&self, location: &Location) -> String {
        let base = self.resolver.base_path();
        let mut path = location.pathname();
        if !base.is_empty()
            && let Some(stripped) = path.strip_prefix(base)
        {
            path = stripped;
        }
        let path = if path.is_empty() { "/" } else { path };
        format!("{path}{}{}", location.search(), location.hash())
    }

    fn parse(&self, location: &Location, raw: &str) -> Route {
        let (path, query) = split_query(raw);
        let origin = join_path(&[location.origin()]);
        let path = path.find(&origin).map_or(path, |i| &path[i + origin.len()..]);
        Route {
            path: path.to_owned(),
            file: self.resolver.file(self.resolver.base_path(), path, false),
            query: Query::parse(query),
        }
    }

    fn on_change(&mut self, location: &mut Location, signal: NavigationSignal) -> Option<HistoryEvent> {
        match signal {
            NavigationSignal::LinkClick { href, target } => {
                if opens_new_window(target.as_deref()) {
                    return None;
                }
                let url = location.resolve(&href);
                location.push(&url);
                if self.cross_origin_links.contains(&url) {
                    Some(HistoryEvent::OpenSelf { url })
                } else {
                    Some(HistoryEvent::Changed {
                        source: Source::Navigate,
                    })
                }
            }
            NavigationSignal::PopState { url } => {
                if url != location.href() {
                    location.replace(&url);
                }
                Some(HistoryEvent::Changed {
                    source: Source::History,
                })
            }
            NavigationSignal::HashChange { .. } => None,
        }
    }
}

/// One of the two history strategies.
#[derive(Debug, Clone)]
pub enum History {
    Hash(HashHistory),
    Native(NativeHistory),
}

impl History {
    fn resolver(&self) -> &Resolver {
        match self {
            Self::Hash(h) => &h.resolver,
            Self::Native(h) => &h.resolver,
        }
    }

    /// Whether this is the native push-state strategy.
    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native(_))
    }

    /// Base path files are resolved against.
    #[must_use]
    pub fn base_path(&self, location: &Location) -> String {
        match self {
            Self::Hash(h) => h.base_path(location),
            Self::Native(h) => h.resolver.base_path().to_owned(),
        }
    }

    /// Current route path including query and fragment.
    #[must_use]
    pub fn current_path(&self, location: &Location) -> String {
        match self {
            Self::Hash(_) => HashHistory::current_path(location),
            Self::Native(h) => h.current_path(location),
        }
    }

    /// Parse `raw` (default: the current href) into a route.
    #[must_use]
    pub fn parse(&self, location: &Location, raw: Option<&str>) -> Route {
        let raw = raw.unwrap_or(location.href());
        match self {
            Self::Hash(h) => h.parse(location, raw),
            Self::Native(h) => h.parse(location, raw),
        }
    }

    /// Resolve the file for a route path.
    #[must_use]
    pub fn file(&self, location: &Location, path: &str, relative: bool) -> String {
        self.resolver()
            .file(&self.base_path(location), path, relative)
    }

    /// Build a navigable URL for `path` with extra query params.
    ///
    /// A path starting with `#` is a same-document anchor when
    /// `current_route` is given.
    #[must_use]
    pub fn to_url(
        &self,
        location: &Location,
        path: &str,
        params: &[(&str, &str)],
        current_route: Option<&str>,
    ) -> String {
        let local = current_route.is_some() && path.starts_with('#');
        let route = self.parse(location, Some(&replace_slug(path)));
        let url = self.resolver().to_path(route, params, local, current_route);
        match self {
            Self::Hash(_) => format!("#{url}"),
            Self::Native(_) => url,
        }
    }

    /// Classify a navigation signal, updating the location as a browser would.
    pub fn on_change(
        &mut self,
        location: &mut Location,
        signal: NavigationSignal,
    ) -> Option<HistoryEvent> {
        match self {
            Self::Hash(h) => h.on_change(location, signal),
            Self::Native(h) => h.on_change(location, signal),
        }
    }

    /// Canonicalize the location (hash mode only).
    pub fn normalize(&self, location: &mut Location) {
        if let Self::Hash(_) = self {
            HashHistory::normalize(location);
        }
    }

    /// Register links that must leave the site instead of pushing state.
    pub fn add_cross_origin_links<I: IntoIterator<Item = String>>(&mut self, links: I) {
        if let Self::Native(h) = self {
            for link in links {
                if !h.cross_origin_links.contains(&link) {
                    h.cross_origin_links.push(link);
                }
            }
        }
    }
}
