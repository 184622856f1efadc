use quire_config::{Config, RouterMode};

use crate::history::{
    HashHistory, History, HistoryEvent, NativeHistory, NavigationSignal, Resolver, Source,
};
use crate::location::Location;
use crate::route::Route;

/// What the orchestrator has to do after a navigation signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Same document, different anchor: only reset scroll/UI state.
    Anchor { source: Source },
    /// A different document: run a full fetch cycle.
    Refetch { source: Source },
    /// The site was left for a cross-origin URL.
    OpenSelf { url: String },
}

/// Owns the history strategy, the location and the current route.
#[derive(Debug, Clone)]
pub struct Router {
    history: History,
    location: Location,
    route: Route,
    last_path: Option<String>,
}

impl Router {
    /// Create a router for `location`.
    ///
    /// Native history is used only when configured **and** supported by the
    /// location; everything else falls back to hash routing.
    #[must_use]
    pub fn new(config: &Config, location: Location) -> Self {
        let resolver = Resolver::new(config);
        let history = if config.router.mode == RouterMode::History && location.supports_push_state()
        {
            History::Native(NativeHistory::new(resolver))
        } else {
            if config.router.mode == RouterMode::History {
                tracing::debug!("Push-state unsupported, falling back to hash routing");
            }
            History::Hash(HashHistory::new(resolver))
        };
        Self {
            history,
            location,
            route: Route::default(),
            last_path: None,
        }
    }

    /// Normalize the location and re-parse the current route.
    pub fn update_render(&mut self) {
        self.history.normalize(&mut self.location);
        self.route = self.history.parse(&self.location, None);
        if self.last_path.is_none() {
            self.last_path = Some(self.route.path.clone());
        }
    }

    /// Feed a navigation signal.
    ///
    /// Returns `None` when the signal does not change the location.
    pub fn handle(&mut self, signal: NavigationSignal) -> Option<Navigation> {
        let source = match self.history.on_change(&mut self.location, signal)? {
            HistoryEvent::Changed { source } => source,
            HistoryEvent::OpenSelf { url } => return Some(Navigation::OpenSelf { url }),
        };

        self.update_render();
        if self.last_path.as_deref() == Some(self.route.path.as_str()) {
            tracing::debug!(path = %self.route.path, ?source, "Anchor navigation");
            return Some(Navigation::Anchor { source });
        }

        self.last_path = Some(self.route.path.clone());
        Some(Navigation::Refetch { source })
    }

    /// Current route.
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Value of the `data-page` attribute: the current route's file.
    #[must_use]
    pub fn data_page(&self) -> &str {
        &self.route.file
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Mutable location, for normalizing after an external-path guard.
    pub fn location_mut(&mut self) -> &mut Location {
        &mut self.location
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Current route path including query and fragment.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.history.current_path(&self.location)
    }

    /// Parse `raw` (default: the current href).
    #[must_use]
    pub fn parse(&self, raw: Option<&str>) -> Route {
        self.history.parse(&self.location, raw)
    }

    /// Resolve the fetchable file for a route path.
    #[must_use]
    pub fn file(&self, path: &str) -> String {
        self.history.file(&self.location, path, false)
    }

    /// Base path files are resolved against.
    #[must_use]
    pub fn base_path(&self) -> String {
        self.history.base_path(&self.location)
    }

    /// Build a navigable URL; see [`History::to_url`].
    #[must_use]
    pub fn to_url(&self, path: &str, params: &[(&str, &str)], current_route: Option<&str>) -> String {
        self.history
            .to_url(&self.location, path, params, current_route)
    }

    /// Register cross-origin links collected by the compiler.
    pub fn add_cross_origin_links<I: IntoIterator<Item = String>>(&mut self, links: I) {
        self.history.add_cross_origin_links(links);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn hash_router(href: &str) -> Router {
        let config = Config::default_with_base(Path::new("/p"));
        let mut router = Router::new(&config, Location::new(href));
        router.update_render();
        router
    }

    fn click(href: &str) -> NavigationSignal {
        NavigationSignal::LinkClick {
            href: href.to_owned(),
            target: None,
        }
    }

    #[test]
    fn test_update_render_normalizes_and_parses() {
        let router = hash_router("http://x.io/");
        assert_eq!(router.location().href(), "http://x.io/#/");
        assert_eq!(router.route().path, "/");
        assert_eq!(router.data_page(), "README.md");
    }

    #[test]
    fn test_anchor_change_does_not_refetch() {
        let mut router = hash_router("http://x.io/#/guide?id=section1");
        let navigation = router.handle(click("#/guide?id=section2"));
        assert_eq!(
            navigation,
            Some(Navigation::Anchor {
                source: Source::Navigate
            })
        );
        assert_eq!(router.route().anchor(), Some("section2"));
    }

    #[test]
    fn test_path_change_refetches() {
        let mut router = hash_router("http://x.io/#/guide");
        assert_eq!(
            router.handle(click("#/api")),
            Some(Navigation::Refetch {
                source: Source::Navigate
            })
        );
        assert_eq!(router.route().file, "api.md");

        let back = router.location_mut().back().map(str::to_owned).unwrap();
        assert_eq!(
            router.handle(NavigationSignal::HashChange { url: back }),
            Some(Navigation::Refetch {
                source: Source::History
            })
        );
        assert_eq!(router.route().path, "/guide");
    }

    #[test]
    fn test_history_mode_falls_back_without_push_state() {
        let mut config = Config::default_with_base(Path::new("/p"));
        config.router.mode = RouterMode::History;

        let router = Router::new(&config, Location::new("http://x.io/").with_push_state(false));
        assert!(!router.history().is_native());

        let router = Router::new(&config, Location::new("http://x.io/"));
        assert!(router.history().is_native());
    }

    #[test]
    fn test_native_router_routes_paths() {
        let mut config = Config::default_with_base(Path::new("/p"));
        config.router.mode = RouterMode::History;
        let mut router = Router::new(&config, Location::new("http://x.io/guide"));
        router.update_render();
        assert_eq!(router.route().file, "/guide.md");
        assert_eq!(router.to_url("/api.md", &[], None), "/api");

        assert_eq!(
            router.handle(click("/api")),
            Some(Navigation::Refetch {
                source: Source::Navigate
            })
        );
        assert_eq!(router.current_path(), "/api");
    }
}
