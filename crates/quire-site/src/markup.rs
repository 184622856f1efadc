//! String-level edits on compiled sidebar and navbar HTML.

use std::sync::LazyLock;

use regex::Regex;

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").unwrap());
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhref\s*=\s*"([^"]*)""#).unwrap());
static CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bclass\s*=\s*""#).unwrap());
static LI_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<(/?)li\b[^>]*>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// An `<a>` element located in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Offset of `<a`.
    pub start: usize,
    /// Offset right after `</a>`.
    pub end: usize,
    pub href: String,
    /// Visible text with tags removed and entities decoded.
    pub text: String,
}

/// Every anchor carrying an `href`, in document order.
#[must_use]
pub fn anchors(html: &str) -> Vec<Anchor> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let href = HREF_RE.captures(&caps[1])?[1].to_owned();
            Some(Anchor {
                start: whole.start(),
                end: whole.end(),
                href,
                text: inner_text(&caps[2]),
            })
        })
        .collect()
}

/// The anchor whose href is the longest prefix of `url`.
#[must_use]
pub fn find_active(html: &str, url: &str) -> Option<Anchor> {
    let url = decode_entities(url);
    anchors(html)
        .into_iter()
        .filter(|anchor| {
            let href = decode_entities(&anchor.href);
            !href.is_empty() && url.starts_with(href.as_str())
        })
        .max_by(|a, b| a.href.len().cmp(&b.href.len()).then(b.start.cmp(&a.start)))
}

/// Insert `extra` at the end of the `<li>` holding `anchor`, or right after
/// the anchor when it is not inside a list item.
#[must_use]
pub fn append_to_item(html: &str, anchor: &Anchor, extra: &str) -> String {
    let at = enclosing_item(html, anchor.start).map_or(anchor.end, |(_, close)| close);
    let mut out = html.to_owned();
    out.insert_str(at, extra);
    out
}

/// Mark `anchor` active and return the edited document.
///
/// With `on_item` the enclosing `<li>` gets the class; otherwise, or when
/// there is no enclosing item, the anchor itself is marked.
#[must_use]
pub fn mark_active(html: &str, anchor: &Anchor, on_item: bool) -> String {
    let item = if on_item { enclosing_item(html, anchor.start) } else { None };
    let mut out = html.to_owned();
    add_class(&mut out, item.map_or(anchor.start, |(open, _)| open), "active");
    out
}

/// `(open, close)` offsets of the `<li>` containing `pos`: the start of its
/// opening tag and the start of its closing tag.
fn enclosing_item(html: &str, pos: usize) -> Option<(usize, usize)> {
    let mut open: Vec<usize> = Vec::new();
    let mut depth = 0usize;
    let mut item_start = None;

    for tag in LI_TAG_RE.captures_iter(html) {
        let Some(m) = tag.get(0) else { continue };
        let closing = !tag[1].is_empty();
        if m.start() < pos {
            if closing {
                open.pop();
            } else {
                open.push(m.start());
            }
            continue;
        }
        if item_start.is_none() {
            item_start = Some(*open.last()?);
        }
        if !closing {
            depth += 1;
        } else if depth == 0 {
            return item_start.map(|start| (start, m.start()));
        } else {
            depth -= 1;
        }
    }
    None
}

/// Add `class` to the tag starting at `tag_start`.
fn add_class(html: &mut String, tag_start: usize, class: &str) {
    let Some(tag_len) = html[tag_start..].find('>') else {
        return;
    };
    let tag = &html[tag_start..tag_start + tag_len];
    if let Some(m) = CLASS_RE.find(tag) {
        html.insert_str(tag_start + m.end(), &format!("{class} "));
        return;
    }
    let name_end = tag
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(tag.len());
    html.insert_str(tag_start + name_end, &format!(r#" class="{class}""#));
}

/// Whether the first element of `html` is an `<h1>`.
#[must_use]
pub fn starts_with_h1(html: &str) -> bool {
    html.trim_start()
        .get(..3)
        .is_some_and(|head| head.eq_ignore_ascii_case("<h1"))
}

/// Visible text of an HTML fragment.
#[must_use]
pub fn inner_text(html: &str) -> String {
    decode_entities(TAG_RE.replace_all(html, "").trim())
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
