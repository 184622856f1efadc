//! Render orchestration.
//!
//! [`Docs`] owns one instance of every collaborator and drives the lifecycle:
//!
//! 1. [`Docs::start`] installs plugins, runs `init`, normalizes the location,
//!    runs `mounted`, paints the first route and runs `ready`.
//! 2. [`Docs::navigate`] feeds a navigation signal to the router and either
//!    resets scroll state (same document) or runs a full cycle.
//!
//! A cycle paints the cover, then loads the main page and the navbar
//! concurrently, compiles the page, loads the sidebar and finally resets
//! scroll state and runs `doneEach`.

use std::sync::Arc;

use quire_config::{Config, NameLink};
use quire_embed::{EmbedContext, EmbedResolver};
use quire_fetch::{Fetch, FetchErrorKind, FetchSlot, Fetched, Ticket};
use quire_renderer::{CompileError, Compiler, Highlighter, HtmlSanitizer, Sanitizer};
use quire_router::path::{is_external, parent_path};
use quire_router::{ANCHOR_KEY, Location, Navigation, NavigationSignal, Router, Source};

use crate::hooks::{HookRegistry, Phase, Plugin};
use crate::loader::{Loader, MainPage};
use crate::markup::{append_to_item, find_active, mark_active, starts_with_h1};
use crate::updated::format_updated;
use crate::view::{Cover, NOT_FOUND_HTML, ScrollAction, View};

/// Error surfaced from a navigation cycle.
///
/// Fetch failures are recovered inside the cycle; only compilation can fail.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// One [`FetchSlot`] per fetch kind.
///
/// Clones share generations, so a clone handed to another thread can abort
/// whatever the cycle is loading.
#[derive(Debug, Clone, Default)]
pub struct FetchSlots {
    pub main: FetchSlot,
    pub navbar: FetchSlot,
    pub sidebar: FetchSlot,
    pub cover: FetchSlot,
}

impl FetchSlots {
    /// Abort every in-flight request.
    pub fn abort_all(&self) {
        self.main.abort();
        self.navbar.abort();
        self.sidebar.abort();
        self.cover.abort();
    }
}

/// The documentation site.
pub struct Docs {
    config: Arc<Config>,
    router: Router,
    compiler: Compiler,
    embeds: EmbedResolver,
    hooks: HookRegistry,
    plugins: Vec<Box<dyn Plugin>>,
    fetch: Arc<dyn Fetch>,
    sanitizer: Box<dyn Sanitizer>,
    slots: FetchSlots,
    view: View,
    /// Sidebar with the sub-sidebar attached, before active marking.
    sidebar_html: Option<String>,
    /// Compiled navbar before active marking.
    navbar_html: Option<String>,
}

impl Docs {
    /// Create a site for `location`, loading files through `fetch`.
    #[must_use]
    pub fn new(config: Arc<Config>, location: Location, fetch: Arc<dyn Fetch>) -> Self {
        let router = Router::new(&config, location);
        let compiler = Compiler::new(&config);
        let embeds = EmbedResolver::new(config.fetch.request_headers.clone());
        Self {
            config,
            router,
            compiler,
            embeds,
            hooks: HookRegistry::new(),
            plugins: Vec::new(),
            fetch,
            sanitizer: Box::new(HtmlSanitizer),
            slots: FetchSlots::default(),
            view: View::default(),
            sidebar_html: None,
            navbar_html: None,
        }
    }

    /// Add a plugin, installed by [`Docs::start`] in the order added.
    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Replace the syntax highlighter.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: Box<dyn Highlighter>) -> Self {
        self.compiler = Compiler::with_highlighter(&self.config, highlighter);
        self
    }

    /// Replace the sanitizer applied to remote pages.
    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: Box<dyn Sanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Install plugins, initialize the router and paint the first route.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError`] if the first page fails to compile.
    pub fn start(&mut self) -> Result<(), SiteError> {
        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "Installing plugin");
            plugin.install(&mut self.hooks, &self.config);
        }
        self.hooks.call_hook(Phase::Init, "");
        self.router.update_render();
        self.hooks.call_hook(Phase::Mounted, "");
        self.fetch(None)?;
        self.hooks.call_hook(Phase::Ready, "");
        Ok(())
    }

    /// Handle a navigation signal.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError`] if the new page fails to compile.
    pub fn navigate(&mut self, signal: NavigationSignal) -> Result<(), SiteError> {
        match self.router.handle(signal) {
            None => Ok(()),
            Some(Navigation::Anchor { source }) => {
                self.update_chrome();
                self.reset(Some(source));
                Ok(())
            }
            Some(Navigation::Refetch { source }) => self.fetch(Some(source)),
            Some(Navigation::OpenSelf { url }) => {
                tracing::info!(url = %url, "Leaving site");
                self.view.open_self = Some(url);
                Ok(())
            }
        }
    }

    /// Run one navigation cycle for the current route.
    ///
    /// `source` is `None` for the initial cycle.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError`] if the page, sidebar, navbar or cover fails to
    /// compile.
    pub fn fetch(&mut self, source: Option<Source>) -> Result<(), SiteError> {
        self.update_chrome();
        let cover_only = self.load_cover()?;
        if !cover_only {
            if !self.load_page()? {
                // The location was replaced with the homepage, which reports
                // as a history change.
                return self.fetch(Some(Source::History));
            }
            self.reset(source);
        }
        self.hooks.call_hook(Phase::DoneEach, "");
        tracing::info!(
            path = %self.router.route().path,
            page = %self.view.data_page,
            cover_only,
            "Painted route"
        );
        Ok(())
    }

    #[must_use]
    pub fn view(&self) -> &View {
        &self.view
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hooks, for registering callbacks without a plugin.
    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }

    /// Handles that abort in-flight requests.
    #[must_use]
    pub fn slots(&self) -> FetchSlots {
        self.slots.clone()
    }

    fn loader(&self) -> Loader<'_> {
        Loader {
            fetch: self.fetch.as_ref(),
            router: &self.router,
            config: &self.config,
        }
    }

    /// Refresh the name link and `data-page` for the current route.
    fn update_chrome(&mut self) {
        let path = &self.router.route().path;
        self.view.name_link = match &self.config.docs.name_link {
            NameLink::Url(url) => Some(url.clone()),
            NameLink::PerPath(links) => links
                .iter()
                .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
                .max_by_key(|(prefix, _)| prefix.len())
                .map(|(_, link)| link.clone()),
        };
        self.view.data_page = self.router.data_page().to_owned();
    }

    /// Paint the cover for the current route. Returns whether only the cover
    /// is shown.
    fn load_cover(&mut self) -> Result<bool, SiteError> {
        let route = self.router.route().clone();
        let Some(cover) = self.config.cover_file(&route.path) else {
            self.view.cover = None;
            self.view.cover_only = false;
            return Ok(false);
        };

        let cover_only = self.config.cover.only;
        self.view.cover_only = cover_only;
        let file = self
            .router
            .file(&format!("{}{cover}", parent_path(&route.path)));
        let qs = route.query.to_query_string(&[ANCHOR_KEY]);

        let ticket = self.slots.cover.begin();
        let result = self
            .fetch
            .get(&format!("{file}{qs}"), &self.config.fetch.request_headers);
        match ticket.complete(result) {
            Ok(fetched) => {
                let html = if file.ends_with(".html") {
                    fetched.body
                } else {
                    self.compiler.cover(&fetched.body, &self.router)?
                };
                self.collect_cross_origin_links();
                self.view.cover = Some(Cover::from_html(&html, &self.router.base_path()));
            }
            Err(e) if e.kind == FetchErrorKind::Aborted => {}
            Err(e) => {
                tracing::warn!(file = %file, error = %e, "Cover page fetch failed");
                self.view.cover = None;
            }
        }
        Ok(cover_only)
    }

    /// Load and paint the main page, sidebar and navbar. Returns `false` when
    /// the route was rejected and the location normalized to the homepage.
    fn load_page(&mut self) -> Result<bool, SiteError> {
        let route = self.router.route().clone();
        if is_external(&route.path, self.router.location().origin()) {
            tracing::warn!(path = %route.path, "Rejecting external route path");
            self.router.location_mut().replace("#");
            self.router.update_render();
            return Ok(false);
        }

        let qs = route.query.to_query_string(&[ANCHOR_KEY]);
        let navbar_file = self.config.navbar_file();
        let main_ticket = self.slots.main.begin();
        let navbar_ticket = navbar_file.as_ref().map(|_| self.slots.navbar.begin());

        let loader = self.loader();
        let (page, navbar) = rayon::join(
            || loader.main(&route.path, &qs),
            || {
                navbar_file
                    .as_deref()
                    .and_then(|file| loader.nested(&route.path, &qs, file))
            },
        );

        self.render_main(page, &main_ticket)?;
        self.load_sidebar(&route.path, &qs)?;
        if let Some(ticket) = navbar_ticket {
            self.render_navbar(navbar, &ticket)?;
        }
        Ok(true)
    }

    fn render_main(&mut self, page: MainPage, ticket: &Ticket) -> Result<(), SiteError> {
        let is_html = page.is_html();
        let is_remote = self.loader().is_remote(&page.file);
        let Some(text) = page.text else {
            tracing::warn!(file = %page.file, "Page not found");
            self.paint_main(NOT_FOUND_HTML.to_owned(), ticket);
            return Ok(());
        };

        let flow = self.hooks.call_hook(Phase::BeforeEach, text);
        if !flow.proceed {
            return Ok(());
        }

        let mut html = if is_html {
            flow.data
        } else {
            let ctx = EmbedContext::from_router(&self.router);
            let stream = self.embeds.resolve(&flow.data, &ctx, self.fetch.as_ref());
            let html = self
                .compiler
                .compile_stream(&flow.data, &stream, &self.router)?;
            if is_remote {
                self.sanitizer.sanitize(&html)
            } else {
                html
            }
        };
        self.collect_cross_origin_links();

        if let Some(updated_at) = page.updated_at {
            html = format_updated(&html, updated_at, self.config.render.format_updated.as_deref());
        }

        let flow = self.hooks.call_hook(Phase::AfterEach, html);
        if flow.proceed {
            self.paint_main(flow.data, ticket);
        }
        Ok(())
    }

    fn paint_main(&mut self, html: String, ticket: &Ticket) {
        if ticket.is_current() {
            self.view.main = html;
        } else {
            tracing::debug!(page = %self.view.data_page, "Dropping superseded page");
        }
    }

    fn load_sidebar(&mut self, path: &str, qs: &str) -> Result<(), SiteError> {
        let Some(file) = self.config.sidebar_file() else {
            return self.render_sidebar(None);
        };

        let ticket = self.slots.sidebar.begin();
        let fetched = self.loader().nested(path, qs, &file);
        if !ticket.is_current() {
            tracing::debug!(file = %file, "Dropping superseded sidebar");
            return Ok(());
        }
        if fetched.is_none() {
            tracing::warn!(file = %file, path = %path, "Sidebar not found, generating from headings");
        }
        self.render_sidebar(fetched.map(|f| f.body).as_deref())
    }

    fn render_sidebar(&mut self, text: Option<&str>) -> Result<(), SiteError> {
        let sidebar = &self.config.sidebar;
        if sidebar.hide {
            self.compiler.sub_sidebar(0, &self.router);
            self.sidebar_html = None;
            self.view.sidebar = None;
            self.view.active_sidebar_link = None;
            return Ok(());
        }

        let html = self.compiler.sidebar(text, sidebar.max_level, &self.router)?;
        self.collect_cross_origin_links();
        let url = self.current_url();
        let active = find_active(&html, &url);

        let sub_max_level = if self.config.sidebar_file().is_some() && active.is_some() {
            self.config.sidebar.sub_max_level
        } else {
            0
        };
        let sub_sidebar = self.compiler.sub_sidebar(sub_max_level, &self.router);
        let html = match (&active, sub_sidebar) {
            (Some(anchor), Some(sub)) => append_to_item(&html, anchor, &sub),
            _ => html,
        };

        let name = &self.config.docs.name;
        self.view.title = match &active {
            Some(anchor) if name.is_empty() => Some(anchor.text.clone()),
            Some(anchor) => Some(format!("{} - {name}", anchor.text)),
            None => (!name.is_empty()).then(|| name.clone()),
        };

        if let Some(anchor) = &active
            && self.config.sidebar.auto_header
            && !self.view.main.is_empty()
            && !starts_with_h1(&self.view.main)
        {
            let header = self.compiler.header(&anchor.text, 1, &self.router);
            self.view.main.insert_str(0, &header);
        }

        self.sidebar_html = Some(html);
        self.mark_sidebar(&url);
        Ok(())
    }

    fn render_navbar(&mut self, fetched: Option<Fetched>, ticket: &Ticket) -> Result<(), SiteError> {
        if !ticket.is_current() {
            tracing::debug!("Dropping superseded navbar");
            return Ok(());
        }
        let Some(fetched) = fetched else {
            tracing::warn!(path = %self.router.route().path, "Navbar not found");
            return Ok(());
        };
        let html = self.compiler.navbar(&fetched.body, &self.router)?;
        self.collect_cross_origin_links();
        self.navbar_html = Some(html);
        let url = self.current_url();
        self.mark_navbar(&url);
        Ok(())
    }

    fn mark_sidebar(&mut self, url: &str) {
        let Some(html) = &self.sidebar_html else {
            return;
        };
        let active = find_active(html, url);
        self.view.sidebar = Some(match &active {
            Some(anchor) => mark_active(html, anchor, true),
            None => html.clone(),
        });
        self.view.active_sidebar_link = active.map(|anchor| anchor.href);
    }

    fn mark_navbar(&mut self, url: &str) {
        let Some(html) = &self.navbar_html else {
            return;
        };
        let active = find_active(html, url);
        self.view.navbar = Some(match &active {
            Some(anchor) => mark_active(html, anchor, false),
            None => html.clone(),
        });
        self.view.active_navbar_link = active.map(|anchor| anchor.href);
    }

    /// Scroll state and active links after a navigation.
    fn reset(&mut self, source: Option<Source>) {
        let route = self.router.route();
        self.view.scroll = match (source, route.anchor()) {
            (Some(Source::History), _) => ScrollAction::None,
            (_, Some(id)) => ScrollAction::IntoView {
                id: id.to_owned(),
                top_margin: self.config.render.top_margin,
            },
            (Some(Source::Navigate), None) => self
                .config
                .render
                .auto2top
                .offset()
                .map_or(ScrollAction::None, |offset| ScrollAction::ToTop { offset }),
            (None, None) => ScrollAction::None,
        };

        let url = self.current_url();
        if route.anchor().is_some() {
            self.mark_sidebar(&url);
        }
        self.mark_navbar(&url);
    }

    fn current_url(&self) -> String {
        self.router.to_url(&self.router.current_path(), &[], None)
    }

    fn collect_cross_origin_links(&mut self) {
        let links = self.compiler.take_cross_origin_links();
        if !links.is_empty() {
            self.router.add_cross_origin_links(links);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookFlow;
    use pretty_assertions::assert_eq;
    use quire_fetch::MockFetch;
    use quire_renderer::PlainHighlighter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn docs(config: Config, href: &str, fetch: MockFetch) -> Docs {
        Docs::new(Arc::new(config), Location::new(href), Arc::new(fetch))
            .with_highlighter(Box::new(PlainHighlighter))
    }

    #[test]
    fn test_start_paints_homepage() {
        let fetch = MockFetch::new().with_page("/README.md", "# Home\n\nWelcome");
        let mut docs = docs(Config::default(), "http://x.io/", fetch);
        docs.start().unwrap();

        assert!(docs.view().main.contains("Welcome"));
        assert_eq!(docs.view().data_page, "README.md");
        assert_eq!(docs.view().name_link.as_deref(), Some("/"));
        assert_eq!(docs.view().scroll, ScrollAction::None);
    }

    #[test]
    fn test_missing_page_paints_not_found() {
        let mut docs = docs(Config::default(), "http://x.io/#/nope", MockFetch::new());
        docs.start().unwrap();
        assert_eq!(docs.view().main, NOT_FOUND_HTML);
    }

    #[test]
    fn test_external_route_is_rejected() {
        let fetch = MockFetch::new().with_page("/README.md", "# Home");
        let mut docs = docs(Config::default(), "http://x.io/#//evil.io/x", fetch);
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        docs.hooks_mut().add(Phase::DoneEach, move |data| {
            counter.fetch_add(1, Ordering::SeqCst);
            HookFlow::next(data)
        });
        docs.start().unwrap();

        assert_eq!(docs.router().location().href(), "http://x.io/#/");
        assert_eq!(docs.router().route().path, "/");
        assert!(docs.view().main.contains("Home"));
        assert_eq!(docs.view().scroll, ScrollAction::None);
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_name_link_per_path() {
        let mut config = Config::default();
        config.docs.name_link = NameLink::PerPath(
            [
                ("/".to_owned(), "#/".to_owned()),
                ("/zh/".to_owned(), "#/zh/".to_owned()),
            ]
            .into(),
        );
        let fetch = MockFetch::new().with_page("/zh/guide.md", "# 指南");
        let mut docs = docs(config, "http://x.io/#/zh/guide", fetch);
        docs.start().unwrap();
        assert_eq!(docs.view().name_link.as_deref(), Some("#/zh/"));
    }

    #[test]
    fn test_abort_drops_main_page() {
        let fetch = MockFetch::new().with_page("/guide.md", "# Guide");
        let mut docs = docs(Config::default(), "http://x.io/#/guide", fetch);
        let slots = docs.slots();
        docs.hooks_mut().add(Phase::AfterEach, move |html| {
            slots.abort_all();
            HookFlow::next(html)
        });
        docs.start().unwrap();
        assert!(docs.view().main.is_empty());
    }
}
