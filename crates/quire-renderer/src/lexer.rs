//! Block lexer.
//!
//! Splits a document into its top-level blocks so that embeds can replace
//! whole paragraphs before compilation. Each [`Token`] keeps the Markdown
//! source of its block; reference definitions are collected into a
//! [`LinkTable`] shared by every token of the stream, so a reference still
//! resolves after the blocks are rearranged or spliced with embedded ones.

use std::collections::BTreeMap;
use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag};

/// Parser options shared by the lexer and the renderer.
///
/// GFM alerts stay off so `> [!NOTE]` renders as a plain blockquote.
#[must_use]
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Kind of a top-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Paragraph,
    Heading,
    Code,
    List,
    BlockQuote,
    Table,
    /// Raw HTML, emitted verbatim by the renderer.
    Html,
    Rule,
    Other,
}

/// A top-level block and its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Raw HTML token.
    #[must_use]
    pub fn html(text: impl Into<String>) -> Self {
        Self::new(TokenKind::Html, text)
    }
}

/// A link reference definition (`[label]: href "title"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDef {
    pub href: String,
    pub title: Option<String>,
}

/// Link reference definitions keyed by normalized label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    defs: BTreeMap<String, LinkDef>,
}

/// Labels match case-insensitively with inner whitespace collapsed.
fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl LinkTable {
    pub fn insert(&mut self, label: &str, def: LinkDef) {
        self.defs.insert(normalize_label(label), def);
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&LinkDef> {
        self.defs.get(&normalize_label(label))
    }

    /// Merge `other` into this table; its definitions overwrite ours.
    pub fn merge(&mut self, other: LinkTable) {
        self.defs.extend(other.defs);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Lexed document: blocks in order plus their shared link table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    pub tokens: Vec<Token>,
    pub links: LinkTable,
}

impl TokenStream {
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn token_kind(tag: &Tag<'_>) -> TokenKind {
    match tag {
        Tag::Paragraph => TokenKind::Paragraph,
        Tag::Heading { .. } => TokenKind::Heading,
        Tag::CodeBlock(_) => TokenKind::Code,
        Tag::List(_) => TokenKind::List,
        Tag::BlockQuote(_) => TokenKind::BlockQuote,
        Tag::Table(_) => TokenKind::Table,
        Tag::HtmlBlock => TokenKind::Html,
        _ => TokenKind::Other,
    }
}

/// Source of a block, widened to its line start when only indentation
/// precedes it (indented code blocks report their range after the indent).
fn block_text(source: &str, range: Range<usize>) -> String {
    let line_start = source[..range.start].rfind('\n').map_or(0, |idx| idx + 1);
    let start = if source[line_start..range.start].trim().is_empty() {
        line_start
    } else {
        range.start
    };
    source[start..range.end].to_owned()
}

/// Lex `source` into top-level block tokens.
///
/// # Examples
///
/// ```
/// use quire_renderer::lexer::{TokenKind, lex};
///
/// let stream = lex("# Title\n\nSee [docs][d].\n\n[d]: /docs.md\n");
/// assert_eq!(stream.tokens.len(), 2);
/// assert_eq!(stream.tokens[1].kind, TokenKind::Paragraph);
/// assert_eq!(stream.links.get("D").unwrap().href, "/docs.md");
/// ```
#[must_use]
pub fn lex(source: &str) -> TokenStream {
    let mut iter = Parser::new_ext(source, parser_options()).into_offset_iter();
    let mut tokens = Vec::new();
    let mut depth = 0usize;

    for (event, range) in iter.by_ref() {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    tokens.push(Token::new(token_kind(&tag), block_text(source, range)));
                }
                depth += 1;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Rule if depth == 0 => {
                tokens.push(Token::new(TokenKind::Rule, block_text(source, range)));
            }
            _ => {}
        }
    }

    let mut links = LinkTable::default();
    for (label, def) in iter.reference_definitions().iter() {
        links.insert(
            label,
            LinkDef {
                href: def.dest.to_string(),
                title: def.title.as_ref().map(ToString::to_string),
            },
        );
    }

    TokenStream { tokens, links }
}
