//! Embed descriptors and their detection in paragraph tokens.

use std::sync::LazyLock;

use quire_renderer::annotation;
use quire_renderer::lexer::{TokenKind, TokenStream};
use quire_router::path::{is_absolute_path, join_path, parent_path};
use quire_router::Router;
use regex::Regex;

/// Inline link or image: label, destination and optional quoted title.
static INLINE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"!?\[((?:\[[^\]]*\]|[^\[\]])*)\]\(\s*<?([^\s>)]+)>?(?:\s+("[^"]*"|'[^']*'|\([^)]*\)))?\s*\)"#,
    )
    .unwrap()
});
static EXTENSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(\w+)$").unwrap());
static MARKDOWN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(?:md|markdown)").unwrap());
static MERMAID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.mmd").unwrap());
static HTML_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.html?").unwrap());
static VIDEO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.(?:mp4|ogg)").unwrap());
static AUDIO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.mp3").unwrap());

/// What an embed turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    /// Fetched and lexed as Markdown.
    Markdown,
    /// Fetched and wrapped in a fenced code block.
    Code,
    /// Fetched and wrapped in a mermaid container.
    Mermaid,
    /// Fetched and inserted as raw HTML.
    Html,
    Iframe,
    Video,
    Audio,
}

impl EmbedKind {
    /// Parse a `:type=` annotation value.
    #[must_use]
    pub fn from_annotation(value: &str) -> Option<Self> {
        match value {
            "markdown" => Some(Self::Markdown),
            "code" => Some(Self::Code),
            "mermaid" => Some(Self::Mermaid),
            "html" => Some(Self::Html),
            "iframe" => Some(Self::Iframe),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    /// Kind implied by the target's extension.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        if MARKDOWN_RE.is_match(url) {
            Self::Markdown
        } else if MERMAID_RE.is_match(url) {
            Self::Mermaid
        } else if HTML_RE.is_match(url) {
            Self::Iframe
        } else if VIDEO_RE.is_match(url) {
            Self::Video
        } else if AUDIO_RE.is_match(url) {
            Self::Audio
        } else {
            Self::Code
        }
    }
}

/// A resolved `:include` directive.
///
/// Fetched kinds carry `url`; iframe, video and audio carry ready `html`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub kind: EmbedKind,
    pub url: Option<String>,
    pub html: Option<String>,
    /// Fence language of code embeds.
    pub lang: Option<String>,
    /// `:fragment=` marker name of code embeds.
    pub fragment: Option<String>,
}

/// An embed found in the paragraph at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedToken {
    pub index: usize,
    pub embed: Embed,
}

/// Where embed targets are resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedContext {
    /// Base path files are served from.
    pub content_base: String,
    /// Current route path.
    pub current_path: String,
    /// `scheme://host` of the document, prefixed to rewritten `./` links.
    pub origin: String,
}

impl EmbedContext {
    #[must_use]
    pub fn from_router(router: &Router) -> Self {
        Self {
            content_base: router.base_path(),
            current_path: router.current_path(),
            origin: router.location().origin().to_owned(),
        }
    }
}

impl Embed {
    /// Resolve a link into an embed.
    ///
    /// Returns `None` unless the title carries `:include`.
    #[must_use]
    pub fn compile(href: &str, title: &str, ctx: &EmbedContext) -> Option<Self> {
        let (title, config) = annotation::parse(title);
        if !config.has("include") {
            return None;
        }

        let url = if is_absolute_path(href) {
            href.to_owned()
        } else {
            join_path(&[&ctx.content_base, &parent_path(&ctx.current_path), href])
        };
        let kind = config
            .get("type")
            .and_then(EmbedKind::from_annotation)
            .unwrap_or_else(|| EmbedKind::from_url(&url));

        let mut embed = Self::media(kind, url, &title);
        embed.fragment = config.get("fragment").map(ToOwned::to_owned);
        Some(embed)
    }

    fn media(kind: EmbedKind, url: String, title: &str) -> Self {
        let with_default = |default: &'static str| {
            if title.is_empty() {
                default.to_owned()
            } else {
                title.to_owned()
            }
        };
        let html = match kind {
            EmbedKind::Iframe => Some(format!(
                r#"<iframe src="{url}" {}></iframe>"#,
                with_default("width=100% height=400")
            )),
            EmbedKind::Video => Some(format!(
                r#"<video src="{url}" {}>Not Support</video>"#,
                with_default("controls")
            )),
            EmbedKind::Audio => Some(format!(
                r#"<audio src="{url}" {}>Not Support</audio>"#,
                with_default("controls")
            )),
            EmbedKind::Markdown | EmbedKind::Code | EmbedKind::Mermaid | EmbedKind::Html => None,
        };
        let lang = (kind == EmbedKind::Code).then(|| {
            let lang = if title.is_empty() {
                EXTENSION_RE
                    .captures(&url)
                    .map(|caps| caps[1].to_owned())
                    .unwrap_or_default()
            } else {
                title.to_owned()
            };
            if lang == "md" { "markdown".to_owned() } else { lang }
        });

        match html {
            Some(html) => Self {
                kind,
                url: None,
                html: Some(html),
                lang,
                fragment: None,
            },
            None => Self {
                kind,
                url: Some(url),
                html: None,
                lang,
                fragment: None,
            },
        }
    }
}

/// Find every embed in the paragraphs of `stream`, in document order.
#[must_use]
pub fn detect(stream: &TokenStream, ctx: &EmbedContext) -> Vec<EmbedToken> {
    let mut found = Vec::new();
    for (index, token) in stream.tokens.iter().enumerate() {
        if token.kind != TokenKind::Paragraph {
            continue;
        }
        for caps in INLINE_LINK_RE.captures_iter(&token.text) {
            let href = &caps[2];
            let title = caps.get(3).map_or("", |m| m.as_str());
            if let Some(embed) = Embed::compile(href, title, ctx) {
                found.push(EmbedToken { index, embed });
            }
        }
    }
    found
}
