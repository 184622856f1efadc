//! Code highlighting.

use std::sync::LazyLock;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::state::escape_html;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Turns code into HTML for the inside of `<code>`.
///
/// Implementations must escape anything they do not mark up.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, lang: &str) -> String;
}

/// Escapes code without markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, code: &str, _lang: &str) -> String {
        escape_html(code)
    }
}

/// CSS-class based highlighting with syntect's bundled syntaxes.
///
/// Unknown languages fall back to escaped plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> String {
        let Some(syntax) = SYNTAX_SET.find_syntax_by_token(lang) else {
            return escape_html(code);
        };

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                tracing::debug!(lang, error = %e, "Highlighting failed, using plain text");
                return escape_html(code);
            }
        }
        generator.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_escapes() {
        assert_eq!(PlainHighlighter.highlight("a < b", "rust"), "a &lt; b");
    }

    #[test]
    fn test_unknown_language_is_escaped() {
        assert_eq!(
            SyntectHighlighter::new().highlight("<x>", "no-such-lang"),
            "&lt;x&gt;"
        );
    }

    #[test]
    fn test_known_language_gets_classes() {
        let html = SyntectHighlighter::new().highlight("fn main() {}\n", "rust");
        assert!(html.contains("<span class=\""));
        assert!(html.contains("main"));
    }
}
