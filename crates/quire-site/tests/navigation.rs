//! Full navigation cycles against an in-memory fetcher.

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use quire_config::{Config, Coverpage, FileToggle, NotFoundPage, RouterMode};
use quire_fetch::MockFetch;
use quire_renderer::PlainHighlighter;
use quire_router::{Location, NavigationSignal};
use quire_site::{
    CoverBackground, Docs, HookFlow, HookRegistry, Phase, Plugin, ScrollAction,
};

fn site(config: Config, href: &str, fetch: &Arc<MockFetch>) -> Docs {
    Docs::new(Arc::new(config), Location::new(href), Arc::<MockFetch>::clone(fetch))
        .with_highlighter(Box::new(PlainHighlighter))
}

fn click(href: &str) -> NavigationSignal {
    NavigationSignal::LinkClick {
        href: href.to_owned(),
        target: None,
    }
}

fn sidebar_config() -> Config {
    let mut config = Config::default();
    config.sidebar.load = FileToggle::Enabled(true);
    config.sidebar.sub_max_level = 2;
    config
}

fn guide_fetch() -> Arc<MockFetch> {
    Arc::new(
        MockFetch::new()
            .with_page("/_sidebar.md", "- [Home](/)\n- [Guide](guide.md)\n")
            .with_page("/README.md", "# Home\n\nWelcome")
            .with_page("/guide.md", "# Guide\n\n## Setup\n\n## Usage\n"),
    )
}

#[test]
fn test_cover_with_color_background() {
    let mut config = Config::default();
    config.cover.page = Coverpage::Enabled(true);
    let fetch = Arc::new(
        MockFetch::new()
            .with_page("/_coverpage.md", "# Quire\n\n> Docs\n\n![color](#f0f0f0)\n")
            .with_page("/README.md", "# Home"),
    );
    let mut docs = site(config, "http://x.io/#/", &fetch);
    docs.start().unwrap();

    let cover = docs.view().cover.as_ref().unwrap();
    assert!(cover.html.contains("Quire"));
    assert!(!cover.html.contains("<img"));
    assert_eq!(
        cover.background,
        Some(CoverBackground::Color("#f0f0f0".to_owned()))
    );
    assert!(!docs.view().cover_only);
    assert!(docs.view().main.contains("Home"));
}

#[test]
fn test_only_cover_skips_main_page() {
    let mut config = Config::default();
    config.cover.page = Coverpage::Enabled(true);
    config.cover.only = true;
    let fetch = Arc::new(
        MockFetch::new()
            .with_page("/_coverpage.md", "# Quire")
            .with_page("/README.md", "# Home"),
    );
    let mut docs = site(config, "http://x.io/#/", &fetch);
    let done = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&done);
    docs.hooks_mut().add(Phase::DoneEach, move |data| {
        *counter.lock().unwrap() += 1;
        HookFlow::next(data)
    });
    docs.start().unwrap();

    assert!(docs.view().cover_only);
    assert!(docs.view().main.is_empty());
    assert_eq!(fetch.requested(), vec!["/_coverpage.md"]);
    assert_eq!(*done.lock().unwrap(), 1);
}

#[test]
fn test_cover_on_listed_routes() {
    let mut config = Config::default();
    config.cover.page = Coverpage::Paths(vec!["/".to_owned(), "/zh/".to_owned()]);
    let fetch = Arc::new(
        MockFetch::new()
            .with_page("/zh/_coverpage.md", "# 封面")
            .with_page("/zh/README.md", "# 首页")
            .with_page("/guide.md", "# Guide"),
    );
    let mut docs = site(config, "http://x.io/#/zh/", &fetch);
    docs.start().unwrap();
    assert!(docs.view().cover.as_ref().unwrap().html.contains("封面"));

    docs.navigate(click("#/guide")).unwrap();
    assert_eq!(docs.view().cover, None);
}

#[test]
fn test_language_fallback() {
    let mut config = Config::default();
    config.fetch.fallback_languages = vec!["de".to_owned()];
    let fetch = Arc::new(MockFetch::new().with_page("/guide.md", "# Guide\n\nEnglish text"));
    let mut docs = site(config, "http://x.io/#/de/guide", &fetch);
    docs.start().unwrap();
    assert!(docs.view().main.contains("English text"));
}

#[test]
fn test_custom_not_found_page() {
    let mut config = Config::default();
    config.fetch.not_found_page = NotFoundPage::Enabled(true);
    let fetch = Arc::new(MockFetch::new().with_page("/_404.md", "# Lost\n\nNothing here"));
    let mut docs = site(config, "http://x.io/#/missing", &fetch);
    docs.start().unwrap();
    assert!(docs.view().main.contains("Nothing here"));
}

#[test]
fn test_missing_page_still_renders_sidebar() {
    let fetch = Arc::new(MockFetch::new().with_page("/_sidebar.md", "- [Home](/)\n"));
    let mut docs = site(sidebar_config(), "http://x.io/#/missing", &fetch);
    docs.start().unwrap();
    assert_eq!(docs.view().main, quire_site::NOT_FOUND_HTML);
    assert!(docs.view().sidebar.as_ref().unwrap().contains("Home"));
}

#[test]
fn test_sidebar_walk_up_ends_for_path_with_space() {
    let fetch = Arc::new(MockFetch::new().with_page("/a b/c.md", "# Spaced"));
    let mut docs = site(sidebar_config(), "http://x.io/#/a b/c", &fetch);
    docs.start().unwrap();

    assert!(docs.view().main.contains("Spaced"));
    let sidebar_requests = fetch
        .requested()
        .into_iter()
        .filter(|url| url.contains("_sidebar"))
        .count();
    assert_eq!(sidebar_requests, 1);
}

#[test]
fn test_sidebar_with_sub_sidebar() {
    let fetch = guide_fetch();
    let mut docs = site(sidebar_config(), "http://x.io/#/guide", &fetch);
    docs.start().unwrap();

    let sidebar = docs.view().sidebar.as_ref().unwrap();
    assert!(sidebar.contains(concat!(
        r##"<li class="active"><a href="#/guide">Guide</a>"##,
        r#"<ul class="app-sub-sidebar">"#
    )));
    assert!(sidebar.contains(r##"href="#/guide?id=setup""##));
    assert!(sidebar.contains(r##"href="#/guide?id=usage""##));
    assert_eq!(docs.view().active_sidebar_link.as_deref(), Some("#/guide"));
    assert_eq!(docs.view().title.as_deref(), Some("Guide"));
}

#[test]
fn test_title_includes_site_name() {
    let mut config = sidebar_config();
    config.docs.name = "Quire".to_owned();
    let fetch = guide_fetch();
    let mut docs = site(config, "http://x.io/#/guide", &fetch);
    docs.start().unwrap();
    assert_eq!(docs.view().title.as_deref(), Some("Guide - Quire"));
}

#[test]
fn test_generated_sidebar_without_file() {
    let fetch = guide_fetch();
    let mut docs = site(Config::default(), "http://x.io/#/guide", &fetch);
    docs.start().unwrap();

    let sidebar = docs.view().sidebar.as_ref().unwrap();
    assert!(sidebar.contains(r##"href="#/guide?id=setup""##));
    assert!(!fetch.requested().iter().any(|url| url.contains("_sidebar")));
}

#[test]
fn test_hidden_sidebar() {
    let mut config = sidebar_config();
    config.sidebar.hide = true;
    let fetch = guide_fetch();
    let mut docs = site(config, "http://x.io/#/guide", &fetch);
    docs.start().unwrap();
    assert_eq!(docs.view().sidebar, None);
    assert!(docs.compiler().toc().is_empty());
}

#[test]
fn test_auto_header_inserts_h1() {
    let mut config = sidebar_config();
    config.sidebar.auto_header = true;
    let fetch = Arc::new(
        MockFetch::new()
            .with_page("/_sidebar.md", "- [Getting started](guide.md)\n")
            .with_page("/guide.md", "Install it first."),
    );
    let mut docs = site(config, "http://x.io/#/guide", &fetch);
    docs.start().unwrap();

    let main = &docs.view().main;
    assert!(main.starts_with(r#"<h1 id="getting-started">"#));
    assert!(main.contains("Install it first."));
}

#[test]
fn test_auto_header_keeps_existing_h1() {
    let mut config = sidebar_config();
    config.sidebar.auto_header = true;
    let fetch = guide_fetch();
    let mut docs = site(config, "http://x.io/#/guide", &fetch);
    docs.start().unwrap();
    assert_eq!(docs.view().main.matches("<h1").count(), 1);
}

#[test]
fn test_anchor_navigation_does_not_refetch() {
    let fetch = guide_fetch();
    let mut docs = site(sidebar_config(), "http://x.io/#/guide", &fetch);
    docs.start().unwrap();
    let requests = fetch.requested().len();

    docs.navigate(click("#/guide?id=setup")).unwrap();

    assert_eq!(fetch.requested().len(), requests);
    assert_eq!(
        docs.view().scroll,
        ScrollAction::IntoView {
            id: "setup".to_owned(),
            top_margin: 0
        }
    );
    assert_eq!(
        docs.view().active_sidebar_link.as_deref(),
        Some("#/guide?id=setup")
    );
}

#[test]
fn test_page_navigation_refetches_and_scrolls_to_top() {
    let mut config = sidebar_config();
    config.render.auto2top = quire_config::Auto2Top::Offset(40);
    let fetch = guide_fetch();
    let mut docs = site(config, "http://x.io/#/", &fetch);
    docs.start().unwrap();
    assert!(docs.view().main.contains("Welcome"));

    docs.navigate(click("#/guide")).unwrap();
    assert!(docs.view().main.contains(r#"id="setup""#));
    assert_eq!(docs.view().data_page, "guide.md");
    assert_eq!(docs.view().scroll, ScrollAction::ToTop { offset: 40 });

    let back = docs.router().location().href().replace("#/guide", "#/");
    docs.navigate(NavigationSignal::HashChange { url: back }).unwrap();
    assert!(docs.view().main.contains("Welcome"));
    assert_eq!(docs.view().scroll, ScrollAction::None);
}

#[test]
fn test_hooks_wrap_compilation() {
    let fetch = guide_fetch();
    let mut docs = site(Config::default(), "http://x.io/#/guide", &fetch);
    docs.hooks_mut().add(Phase::BeforeEach, |md| {
        HookFlow::next(format!("{md}\n\nAdded by hook"))
    });
    docs.hooks_mut().add(Phase::AfterEach, |html| {
        HookFlow::next(format!("{html}<footer>footer</footer>"))
    });
    docs.start().unwrap();

    assert!(docs.view().main.contains("<p>Added by hook</p>"));
    assert!(docs.view().main.ends_with("<footer>footer</footer>"));
}

#[test]
fn test_before_each_stop_skips_paint() {
    let fetch = guide_fetch();
    let mut docs = site(sidebar_config(), "http://x.io/#/guide", &fetch);
    let done = Arc::new(Mutex::new(false));
    let flag = Arc::clone(&done);
    docs.hooks_mut().add(Phase::BeforeEach, |md: String| HookFlow::stop(md));
    docs.hooks_mut().add(Phase::DoneEach, move |data| {
        *flag.lock().unwrap() = true;
        HookFlow::next(data)
    });
    docs.start().unwrap();

    assert!(docs.view().main.is_empty());
    assert!(docs.view().sidebar.is_some());
    assert!(*done.lock().unwrap());
}

struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

impl Plugin for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn install(&self, hooks: &mut HookRegistry, _config: &Config) {
        for phase in Phase::ALL {
            let log = Arc::clone(&self.log);
            hooks.add(phase, move |data| {
                log.lock().unwrap().push(phase.to_string());
                HookFlow::next(data)
            });
        }
    }
}

#[test]
fn test_plugin_lifecycle_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let fetch = guide_fetch();
    let mut docs = site(Config::default(), "http://x.io/#/guide", &fetch).with_plugin(Recorder {
        log: Arc::clone(&log),
    });
    docs.start().unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["init", "mounted", "beforeEach", "afterEach", "doneEach", "ready"]
    );
}

#[test]
fn test_navbar_marks_active_link() {
    let mut config = Config::default();
    config.navbar.load = FileToggle::Enabled(true);
    let fetch = Arc::new(
        MockFetch::new()
            .with_page("/_navbar.md", "# Menu\n\n- [Guide](guide.md)\n- [API](api.md)\n")
            .with_page("/guide.md", "# Guide")
            .with_page("/api.md", "# API"),
    );
    let mut docs = site(config, "http://x.io/#/api", &fetch);
    docs.start().unwrap();

    let navbar = docs.view().navbar.as_ref().unwrap();
    assert!(navbar.contains(r##"<a class="active" href="#/api">API</a>"##));
    assert_eq!(docs.view().active_navbar_link.as_deref(), Some("#/api"));
    let ids: Vec<&str> = docs.compiler().toc().iter().map(|e| e.id.as_str()).collect();
    assert!(!ids.contains(&"menu"));

    docs.navigate(click("#/guide")).unwrap();
    assert_eq!(docs.view().active_navbar_link.as_deref(), Some("#/guide"));
}

#[test]
fn test_updated_placeholder() {
    let mut config = Config::default();
    config.render.format_updated = Some("{YYYY}-{MM}-{DD}".to_owned());
    let updated_at = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
    let fetch = Arc::new(MockFetch::new().with_updated_page(
        "/guide.md",
        "Last updated {docsify-updated}",
        updated_at,
    ));
    let mut docs = site(config, "http://x.io/#/guide", &fetch);
    docs.start().unwrap();
    assert!(docs.view().main.contains("Last updated 2024-03-07"));
}

#[test]
fn test_remote_page_is_sanitized() {
    let mut config = Config::default();
    config.docs.base_path = "https://cdn.x.io/docs/".to_owned();
    let fetch = Arc::new(MockFetch::new().with_page(
        "https://cdn.x.io/docs/guide.md",
        concat!(
            "# Remote\n\n<script>alert(1)</script>\n\n",
            "<a href=javascript:alert(1)>bad</a> <img src=x.png onerror=alert(1)>\n\n",
            "Body\n",
        ),
    ));
    let mut docs = site(config, "http://x.io/#/guide", &fetch);
    docs.start().unwrap();

    let main = &docs.view().main;
    assert!(main.contains("Body"));
    assert!(main.contains(r#"id="remote""#));
    assert!(!main.contains("<script"));
    assert!(!main.contains("javascript:"));
    assert!(!main.contains("onerror"));
}

#[test]
fn test_local_page_keeps_scripts() {
    let fetch = Arc::new(
        MockFetch::new().with_page("/guide.md", "# Local\n\n<script>run()</script>\n"),
    );
    let mut docs = site(Config::default(), "http://x.io/#/guide", &fetch);
    docs.start().unwrap();
    assert!(docs.view().main.contains("<script>run()</script>"));
}

#[test]
fn test_embedded_markdown() {
    let fetch = Arc::new(
        MockFetch::new()
            .with_page("/guide.md", "# Guide\n\n[intro](_intro.md ':include')\n\nAfter")
            .with_page("/_intro.md", "Included text"),
    );
    let mut docs = site(Config::default(), "http://x.io/#/guide", &fetch);
    docs.start().unwrap();

    let main = &docs.view().main;
    assert!(main.contains("<p>Included text</p>"));
    assert!(main.find("Included text") < main.find("After"));
}

#[test]
fn test_html_page_bypasses_compiler() {
    let mut config = Config::default();
    config.router.alias = vec![quire_config::AliasRule {
        pattern: "/raw".to_owned(),
        target: "/raw.html".to_owned(),
    }];
    let fetch = Arc::new(MockFetch::new().with_page("/raw.html", "<div># not a heading</div>"));
    let mut docs = site(config, "http://x.io/#/raw", &fetch);
    docs.start().unwrap();
    assert_eq!(docs.view().main, "<div># not a heading</div>");
}

#[test]
fn test_history_mode_and_cross_origin_links() {
    let mut config = Config::default();
    config.router.mode = RouterMode::History;
    let fetch = Arc::new(
        MockFetch::new()
            .with_page(
                "/guide.md",
                "# Guide\n\n[Other](https://other.io/app ':crossorgin')\n",
            )
            .with_page("/api.md", "# API"),
    );
    let location = Location::new("http://x.io/guide").with_push_state(true);
    let mut docs = Docs::new(Arc::new(config), location, Arc::<MockFetch>::clone(&fetch))
        .with_highlighter(Box::new(PlainHighlighter));
    docs.start().unwrap();
    assert!(docs.view().main.contains("Guide"));

    docs.navigate(click("/api")).unwrap();
    assert!(docs.view().main.contains("API"));

    docs.navigate(click("https://other.io/app")).unwrap();
    assert_eq!(docs.view().open_self.as_deref(), Some("https://other.io/app"));
}
