//! Embed resolution for Quire.
//!
//! A paragraph holding a link annotated `:include` is replaced by the
//! linked content before the page is compiled:
//!
//! ```markdown
//! [intro](_snippets/intro.md ':include')
//! [example](src/main.rs ':include :fragment=demo')
//! [flow](flow.mmd ':include')
//! ```
//!
//! Markdown is spliced in as blocks, code is fenced, mermaid sources are
//! wrapped for the client renderer, and media links become inline tags.
//! Fetches run concurrently on the rayon pool; the result is spliced with an
//! [`InsertionPlan`] so document order does not depend on completion order.

mod embed;
mod fragment;
mod plan;
mod resolver;

pub use embed::{Embed, EmbedContext, EmbedKind, EmbedToken, detect};
pub use fragment::{extract_fragment, strip_indent};
pub use plan::InsertionPlan;
pub use resolver::EmbedResolver;
