//! `:shortcode:` emoji replacement.

use std::sync::LazyLock;

use regex::{Captures, Regex};

const EMOJI_BASE_URL: &str = "https://github.githubassets.com/images/icons/emoji/";
const COLON_PLACEHOLDER: &str = "__colon__";

static VERBATIM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?:pre|template|code)[^>]*?>.+?</(?:pre|template|code)>").unwrap()
});
static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i):(\w+?):").unwrap());

/// Replace `:name:` with GitHub emoji images, leaving `<pre>`, `<code>` and
/// `<template>` content alone.
///
/// # Examples
///
/// ```
/// use quire_renderer::emojify;
///
/// assert_eq!(
///     emojify("<p>:tada:</p>"),
///     r#"<p><img class="emoji" src="https://github.githubassets.com/images/icons/emoji/tada.png" alt="tada" /></p>"#
/// );
/// ```
#[must_use]
pub fn emojify(html: &str) -> String {
    let html = html.replace(":+1:", ":thumbsup:").replace(":-1:", ":thumbsdown:");
    let html = VERBATIM_RE.replace_all(&html, |caps: &Captures<'_>| {
        caps[0].replace(':', COLON_PLACEHOLDER)
    });
    let html = SHORTCODE_RE.replace_all(&html, |caps: &Captures<'_>| {
        let name = &caps[1];
        format!(r#"<img class="emoji" src="{EMOJI_BASE_URL}{name}.png" alt="{name}" />"#)
    });
    html.replace(COLON_PLACEHOLDER, ":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert!(emojify(":+1:").contains("alt=\"thumbsup\""));
        assert!(emojify(":-1:").contains("alt=\"thumbsdown\""));
    }

    #[test]
    fn test_skips_code() {
        let html = "<p><code>a:b:c</code></p><pre><code>:x:</code></pre>";
        assert_eq!(emojify(html), html);
    }

    #[test]
    fn test_leaves_urls() {
        let html = r#"<a href="https://x.io/a">x</a>"#;
        assert_eq!(emojify(html), html);
    }
}
