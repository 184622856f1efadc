//! Query string codec.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters escaped by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Reserved key holding the in-page anchor.
pub const ANCHOR_KEY: &str = "id";

/// Insertion-ordered query parameters.
///
/// A key without `=` has no value. Re-inserting a key keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Query {
    pairs: Vec<(String, Option<String>)>,
}

impl Query {
    /// Parse a query string; leading `?`, `#` and `&` are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use quire_router::Query;
    ///
    /// let query = Query::parse("?id=setup&lang=en+US");
    /// assert_eq!(query.get("id"), Some("setup"));
    /// assert_eq!(query.get("lang"), Some("en US"));
    /// ```
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let mut parsed = Self::default();
        let query = query.trim_start_matches(['?', '#', '&']);
        if query.is_empty() {
            return parsed;
        }

        for param in query.split('&') {
            let param = param.replace('+', " ");
            let mut parts = param.split('=');
            let key = parts.next().unwrap_or_default();
            let value = parts
                .next()
                .map(|v| percent_decode_str(v).decode_utf8_lossy().into_owned());
            parsed.insert(key, value);
        }
        parsed
    }

    /// Value for `key`; `None` when absent or valueless.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Set `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: &str, value: Option<String>) {
        if let Some(slot) = self.pairs.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value;
        } else {
            self.pairs.push((key.to_owned(), value));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Option<String>> {
        let idx = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(idx).1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Serialize to `?k=v&...`, skipping `ignores`.
    ///
    /// Encoded `key=value` pairs are lowercased; keys with an empty or missing
    /// value serialize bare. Returns an empty string when nothing remains.
    #[must_use]
    pub fn to_query_string(&self, ignores: &[&str]) -> String {
        let parts: Vec<String> = self
            .pairs
            .iter()
            .filter(|(k, _)| !ignores.contains(&k.as_str()))
            .map(|(k, v)| match v.as_deref() {
                Some(v) if !v.is_empty() => format!(
                    "{}={}",
                    utf8_percent_encode(k, COMPONENT),
                    utf8_percent_encode(v, COMPONENT)
                )
                .to_lowercase(),
                _ => utf8_percent_encode(k, COMPONENT).to_string(),
            })
            .collect();

        if parts.is_empty() {
            String::new()
        } else {
            format!("?{}", parts.join("&"))
        }
    }
}
