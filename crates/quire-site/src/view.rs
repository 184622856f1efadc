//! The painted page.

use std::sync::LazyLock;

use quire_router::path::{is_absolute_path, join_path};
use regex::Regex;
use serde::Serialize;

static COVER_BACKGROUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<p><img.*?data-origin="(.*?)"[^a]+alt="(.*?)">([^<]*?)</p>$"#).unwrap()
});

/// Heading shown when no page could be fetched.
pub const NOT_FOUND_HTML: &str = "<h1>404 - Not found</h1>";

/// Scroll behavior requested after a navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollAction {
    #[default]
    None,
    /// Bring the heading `id` into view, `top_margin` pixels from the top.
    IntoView { id: String, top_margin: u32 },
    /// Scroll to `offset`.
    ToTop { offset: u32 },
}

/// Cover page background taken from a trailing image paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CoverBackground {
    /// `![color](#f0f0f0)`
    Color(String),
    Image(String),
}

/// Rendered cover page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cover {
    pub html: String,
    pub background: Option<CoverBackground>,
}

impl Cover {
    /// Split a trailing `![color](...)` or `![alt](image)` paragraph off the
    /// cover HTML into its background.
    #[must_use]
    pub fn from_html(html: &str, base_path: &str) -> Self {
        let trimmed = html.trim();
        let Some(caps) = COVER_BACKGROUND_RE.captures(trimmed) else {
            return Self {
                html: html.to_owned(),
                background: None,
            };
        };

        let origin = &caps[1];
        let background = if &caps[2] == "color" {
            CoverBackground::Color(format!("{origin}{}", &caps[3]))
        } else if is_absolute_path(origin) {
            CoverBackground::Image(origin.to_owned())
        } else {
            CoverBackground::Image(join_path(&[base_path, origin]))
        };
        Self {
            html: trimmed.replacen(&caps[0], "", 1),
            background: Some(background),
        }
    }
}

/// Everything a navigation cycle paints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct View {
    /// `.markdown-section` content.
    pub main: String,
    pub cover: Option<Cover>,
    /// Only the cover is shown for this route.
    pub cover_only: bool,
    pub sidebar: Option<String>,
    pub navbar: Option<String>,
    pub active_sidebar_link: Option<String>,
    pub active_navbar_link: Option<String>,
    /// Document title derived from the active sidebar entry.
    pub title: Option<String>,
    pub name_link: Option<String>,
    /// File of the current route.
    pub data_page: String,
    pub scroll: ScrollAction,
    /// Cross-origin URL the site was left for.
    pub open_self: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cover_color_background() {
        let html = r##"<h1>Quire</h1><p><img src="/%23f0f0f0" data-origin="#f0f0f0" alt="color"></p>"##;
        let cover = Cover::from_html(html, "/");
        assert_eq!(cover.html, "<h1>Quire</h1>");
        assert_eq!(
            cover.background,
            Some(CoverBackground::Color("#f0f0f0".to_owned()))
        );
    }

    #[test]
    fn test_cover_image_background() {
        let html = r#"<h1>Quire</h1><p><img src="/bg.png" data-origin="bg.png" alt="bg"></p>"#;
        let cover = Cover::from_html(html, "/docs/");
        assert_eq!(
            cover.background,
            Some(CoverBackground::Image("/docs/bg.png".to_owned()))
        );
    }

    #[test]
    fn test_cover_without_background() {
        let cover = Cover::from_html("<h1>Quire</h1>", "/");
        assert_eq!(cover.html, "<h1>Quire</h1>");
        assert_eq!(cover.background, None);
    }
}
