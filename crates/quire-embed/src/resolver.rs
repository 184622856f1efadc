//! Fetching embeds and splicing them into the page.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use quire_fetch::Fetch;
use quire_renderer::BACKTICK_PLACEHOLDER;
use quire_renderer::lexer::{LinkTable, Token, TokenStream, lex};
use quire_router::path::is_absolute_path;
use rayon::prelude::*;
use regex::{Captures, Regex};

use crate::embed::{Embed, EmbedContext, EmbedKind, detect};
use crate::fragment::extract_fragment;
use crate::plan::InsertionPlan;

static MARKDOWN_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]\(([^)]+)\)").unwrap());

/// Tokens and link definitions produced by one embed.
struct Expansion {
    tokens: Vec<Token>,
    links: LinkTable,
}

impl Expansion {
    fn html(html: String) -> Self {
        Self {
            tokens: vec![Token::html(html)],
            links: LinkTable::default(),
        }
    }
}

/// Resolves `:include` embeds, caching the spliced stream per source text.
#[derive(Debug, Default)]
pub struct EmbedResolver {
    headers: BTreeMap<String, String>,
    cache: HashMap<String, TokenStream>,
}

impl EmbedResolver {
    /// Create a resolver sending `headers` with every embed request.
    #[must_use]
    pub fn new(headers: BTreeMap<String, String>) -> Self {
        Self {
            headers,
            cache: HashMap::new(),
        }
    }

    /// Lex `source` and replace every embed paragraph with the embedded
    /// content.
    ///
    /// Embeds are fetched concurrently. A failed fetch drops its paragraph.
    pub fn resolve(&mut self, source: &str, ctx: &EmbedContext, fetch: &dyn Fetch) -> TokenStream {
        if let Some(cached) = self.cache.get(source) {
            tracing::debug!(path = %ctx.current_path, "Embed cache hit");
            return cached.clone();
        }

        let mut stream = lex(source);
        let embeds = detect(&stream, ctx);
        if !embeds.is_empty() {
            let headers = &self.headers;
            let expansions: Vec<Option<Expansion>> = embeds
                .par_iter()
                .map(|token| expand(&token.embed, ctx, fetch, headers))
                .collect();

            let mut plan = InsertionPlan::new();
            for (token, expansion) in embeds.iter().zip(expansions) {
                match expansion {
                    Some(expansion) => {
                        stream.links.merge(expansion.links);
                        plan.push(token.index, expansion.tokens);
                    }
                    None => plan.push(token.index, Vec::new()),
                }
            }
            tracing::debug!(
                path = %ctx.current_path,
                embeds = embeds.len(),
                "Resolved embeds"
            );
            stream.tokens = plan.apply(stream.tokens);
        }

        self.cache.insert(source.to_owned(), stream.clone());
        stream
    }
}

fn expand(
    embed: &Embed,
    ctx: &EmbedContext,
    fetch: &dyn Fetch,
    headers: &BTreeMap<String, String>,
) -> Option<Expansion> {
    if let Some(html) = &embed.html {
        return Some(Expansion::html(html.clone()));
    }
    let url = embed.url.as_deref()?;
    let text = match fetch.get(url, headers) {
        Ok(fetched) => fetched.body,
        Err(e) => {
            tracing::debug!(url, error = %e, "Embed fetch failed");
            return None;
        }
    };

    let expansion = match embed.kind {
        EmbedKind::Markdown => {
            let stream = lex(&rewrite_relative_links(&text, url, &ctx.origin));
            Expansion {
                tokens: stream.tokens,
                links: stream.links,
            }
        }
        EmbedKind::Code => {
            let text = match &embed.fragment {
                Some(name) => extract_fragment(&text, name),
                None => text,
            };
            let lang = embed.lang.as_deref().unwrap_or_default();
            let fenced = format!(
                "```{lang}\n{}\n```\n",
                text.replace('`', BACKTICK_PLACEHOLDER)
            );
            let stream = lex(&fenced);
            Expansion {
                tokens: stream.tokens,
                links: LinkTable::default(),
            }
        }
        EmbedKind::Mermaid => Expansion::html(format!("<div class=\"mermaid\">\n{text}\n</div>")),
        EmbedKind::Html | EmbedKind::Iframe | EmbedKind::Video | EmbedKind::Audio => {
            Expansion::html(text)
        }
    };
    Some(expansion)
}

/// Point `[x](./y)` links of an embedded document at the embed's directory.
fn rewrite_relative_links(text: &str, url: &str, origin: &str) -> String {
    let dir = url.rfind('/').map_or("", |i| &url[..i]);
    let base = if is_absolute_path(dir) {
        dir.to_owned()
    } else {
        format!("{origin}{dir}")
    };
    MARKDOWN_LINK_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let target = &caps[2];
            if target.starts_with('.') {
                format!("[{}]({base}/{target})", &caps[1])
            } else {
                caps[0].to_owned()
            }
        })
        .into_owned()
}
