//! Colon annotations embedded in link titles and heading text.
//!
//! `':include :type=code :fragment=demo'` parses into the remaining text
//! (empty here) and the annotations `include`, `type=code`, `fragment=demo`.
//! Keys that themselves contain a colon (`:ok:` emoji shortcodes) are left in
//! the text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ANNOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s):([\w-]+:?)=?([\w%-]+)?").unwrap());

/// Annotations parsed out of a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    values: BTreeMap<String, Option<String>>,
}

impl Annotations {
    /// Whether `key` was present, with or without a value.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Value of `key=value`; `None` for bare flags.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key)?.as_deref()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Split `input` into display text and annotations.
///
/// Surrounding quotes are dropped first.
///
/// # Examples
///
/// ```
/// use quire_renderer::annotation;
///
/// let (text, config) = annotation::parse("Logo :size=50x100 :no-zoom");
/// assert_eq!(text, "Logo");
/// assert_eq!(config.get("size"), Some("50x100"));
/// assert!(config.has("no-zoom"));
/// ```
#[must_use]
pub fn parse(input: &str) -> (String, Annotations) {
    let mut annotations = Annotations::default();
    if input.is_empty() {
        return (String::new(), annotations);
    }

    let unquoted = input.strip_prefix(['\'', '"']).unwrap_or(input);
    let unquoted = unquoted.strip_suffix(['\'', '"']).unwrap_or(unquoted);

    let text = ANNOTATION_RE.replace_all(unquoted, |caps: &Captures<'_>| {
        let key = &caps[1];
        if key.contains(':') {
            return caps[0].to_owned();
        }
        let value = caps
            .get(2)
            .map(|m| m.as_str().replace("&quot;", ""))
            .filter(|v| !v.is_empty());
        annotations.values.insert(key.to_owned(), value);
        String::new()
    });

    (text.trim().to_owned(), annotations)
}
