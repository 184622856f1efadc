//! Markdown compilation for Quire.
//!
//! The crate turns Markdown into the HTML the site shell paints:
//!
//! - [`lexer`] splits a document into top-level block tokens so embeds can
//!   be spliced in before compilation.
//! - [`MarkdownRenderer`] walks pulldown-cmark events and writes anchored
//!   headings, highlighted code, tip/warn paragraphs, task lists and links
//!   resolved through a [`LinkResolver`].
//! - [`Compiler`] keeps the caches and the table of contents across
//!   navigation cycles and builds the sidebar trees in [`toc`].
//!
//! # Example
//!
//! ```
//! use quire_config::Config;
//! use quire_renderer::{Compiler, PlainHighlighter};
//! use quire_router::{Location, Router};
//!
//! let config = Config::default();
//! let mut router = Router::new(&config, Location::new("http://localhost/#/guide"));
//! router.update_render();
//!
//! let mut compiler = Compiler::with_highlighter(&config, Box::new(PlainHighlighter));
//! let html = compiler.compile("## Setup\n\nRun it.", &router).unwrap();
//! assert!(html.starts_with(r#"<h2 id="setup">"#));
//! assert_eq!(compiler.toc()[0].slug, "#/guide?id=setup");
//! ```

pub mod annotation;
mod compiler;
mod emoji;
mod highlight;
pub mod lexer;
mod renderer;
mod resolver;
mod sanitize;
mod slug;
mod state;
pub mod toc;

pub use compiler::Compiler;
pub use emoji::emojify;
pub use highlight::{Highlighter, PlainHighlighter, SyntectHighlighter};
pub use renderer::{BACKTICK_PLACEHOLDER, CompileError, CompileOutput, MarkdownRenderer};
pub use resolver::{LinkPolicy, LinkResolver};
pub use sanitize::{HtmlSanitizer, Sanitizer};
pub use slug::{Slugger, slugify};
pub use state::escape_html;
pub use toc::TocEntry;
