//! Sanitizing HTML compiled from remote files.

use std::sync::LazyLock;

/// Allow-list for compiled page markup.
///
/// On top of ammonia's defaults it keeps the attributes the compiler emits:
/// heading ids, `data-*` hooks, `v-pre` on code blocks, task list checkboxes
/// and the external link `target`/`rel` pair.
static POLICY: LazyLock<ammonia::Builder<'static>> = LazyLock::new(|| {
    let mut builder = ammonia::Builder::default();
    builder
        .add_tags(&["input", "label"])
        .add_generic_attributes(&["id", "class"])
        .add_generic_attribute_prefixes(&["data-"])
        .add_tag_attributes("a", &["target", "rel"])
        .add_tag_attributes("pre", &["v-pre"])
        .add_tag_attributes("input", &["type", "checked", "disabled"])
        .link_rel(None);
    builder
});

/// Cleans compiled HTML before it is painted.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// html5ever-backed allow-list sanitizer.
///
/// Script-capable elements, event handler attributes and non-web URL
/// schemes are dropped after the markup is parsed the way a browser would,
/// so encoded or malformed payloads cannot slip through.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl Sanitizer for HtmlSanitizer {
    fn sanitize(&self, html: &str) -> String {
        POLICY.clean(html).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn clean(html: &str) -> String {
        HtmlSanitizer.sanitize(html)
    }

    #[test]
    fn test_removes_scripts() {
        assert_eq!(
            clean("<p>a</p><script>alert(1)</script><p>b</p>"),
            "<p>a</p><p>b</p>"
        );
    }

    #[test]
    fn test_removes_meta_and_base() {
        let html = clean(r#"<meta http-equiv="refresh"><p>kept</p><base href="/x">"#);
        assert_eq!(html, "<p>kept</p>");
    }

    #[test]
    fn test_removes_event_handlers() {
        let html = clean(r#"<img src="x.png" onerror="alert(1)">"#);
        assert!(html.contains(r#"src="x.png""#));
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn test_handler_after_slash() {
        let html = clean("<svg/onload=alert(1)><p>x</p>");
        assert!(!html.contains("onload"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_script_urls_in_every_spelling() {
        for html in [
            r#"<a href="javascript:alert(1)">x</a>"#,
            "<a href=javascript:alert(1)>x</a>",
            r#"<a href="&#106;avascript:alert(1)">x</a>"#,
            r#"<a href=" JaVaScRiPt:alert(1)">x</a>"#,
        ] {
            let cleaned = clean(html);
            assert!(!cleaned.to_lowercase().contains("javascript"), "{cleaned}");
            assert!(cleaned.contains(">x</a>"), "{cleaned}");
        }
    }

    #[test]
    fn test_split_script_tag_does_not_reassemble() {
        let html = clean("<scr<script></script>ipt>alert(1)</script>");
        assert!(!html.contains("<script"));
        assert!(!html.contains("<scr"));
    }

    #[test]
    fn test_keeps_compiled_markup() {
        let heading = r##"<h2 id="a"><a href="#/x?id=a" data-id="a" class="anchor"><span>A</span></a></h2>"##;
        assert_eq!(clean(heading), heading);

        let code = r#"<pre v-pre="" data-lang="rust"><code class="lang-rust">x</code></pre>"#;
        assert_eq!(clean(code), code);

        let external = r#"<a href="https://x.io" target="_blank" rel="noopener">x</a>"#;
        assert_eq!(clean(external), external);
    }

    #[test]
    fn test_keeps_task_list() {
        let html = clean(
            r#"<ul class="task-list"><li class="task-list-item"><label><input checked="" disabled="" type="checkbox"> done</label></li></ul>"#,
        );
        assert!(html.contains(r#"<ul class="task-list">"#));
        assert!(html.contains(r#"type="checkbox""#));
        assert!(html.contains("checked"));
    }
}
