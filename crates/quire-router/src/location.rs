//! Browser location model.
//!
//! The router never reads ambient state: the current URL and its session
//! history live in a [`Location`] value that the caller owns and feeds
//! navigation signals against.

/// Origin used when a location is created from a bare path.
const DEFAULT_ORIGIN: &str = "http://localhost";

/// Current URL plus a session history stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    entries: Vec<String>,
    index: usize,
    supports_push_state: bool,
}

impl Location {
    /// Create a location at `href`. Bare paths get a `http://localhost` origin.
    #[must_use]
    pub fn new(href: &str) -> Self {
        let href = if href.contains("://") {
            href.to_owned()
        } else {
            format!("{DEFAULT_ORIGIN}/{}", href.trim_start_matches('/'))
        };
        Self {
            entries: vec![href],
            index: 0,
            supports_push_state: true,
        }
    }

    /// Declare whether the environment supports push-state history.
    #[must_use]
    pub fn with_push_state(mut self, supported: bool) -> Self {
        self.supports_push_state = supported;
        self
    }

    #[must_use]
    pub fn supports_push_state(&self) -> bool {
        self.supports_push_state
    }

    #[must_use]
    pub fn href(&self) -> &str {
        &self.entries[self.index]
    }

    /// `scheme://host[:port]`.
    #[must_use]
    pub fn origin(&self) -> &str {
        let href = self.href();
        let host_start = href.find("://").map_or(0, |i| i + 3);
        let host_end = href[host_start..]
            .find(['/', '?', '#'])
            .map_or(href.len(), |i| host_start + i);
        &href[..host_end]
    }

    /// Path component, `/` when empty.
    #[must_use]
    pub fn pathname(&self) -> &str {
        let rest = &self.href()[self.origin().len()..];
        let end = rest.find(['?', '#']).unwrap_or(rest.len());
        if end == 0 { "/" } else { &rest[..end] }
    }

    /// Query component including `?`, or empty.
    #[must_use]
    pub fn search(&self) -> &str {
        let rest = self.without_hash();
        rest.find('?').map_or("", |i| &rest[i..])
    }

    /// Fragment including `#`, or empty. Not percent-decoded.
    #[must_use]
    pub fn hash(&self) -> &str {
        let href = self.href();
        href.find('#').map_or("", |i| &href[i..])
    }

    /// The href with any fragment removed.
    #[must_use]
    pub fn without_hash(&self) -> &str {
        let href = self.href();
        href.find('#').map_or(href, |i| &href[..i])
    }

    /// Resolve a link href against the current location.
    #[must_use]
    pub fn resolve(&self, href: &str) -> String {
        if href.contains("://") {
            href.to_owned()
        } else if let Some(rest) = href.strip_prefix("//") {
            let scheme = self.origin().split("//").next().unwrap_or("http:");
            format!("{scheme}//{rest}")
        } else if href.starts_with('/') {
            format!("{}{href}", self.origin())
        } else if href.starts_with('#') {
            format!("{}{href}", self.without_hash())
        } else if href.starts_with('?') {
            format!("{}{}{href}", self.origin(), self.pathname())
        } else {
            let pathname = self.pathname();
            let dir = pathname.rfind('/').map_or("/", |i| &pathname[..=i]);
            format!("{}{dir}{href}", self.origin())
        }
    }

    /// Replace the current entry without adding to history.
    pub fn replace(&mut self, href: &str) {
        let href = self.resolve(href);
        self.entries[self.index] = href;
    }

    /// Push a new entry, dropping any forward entries.
    pub fn push(&mut self, href: &str) {
        let href = self.resolve(href);
        self.entries.truncate(self.index + 1);
        self.entries.push(href);
        self.index += 1;
    }

    /// Step back in history; returns the new href.
    pub fn back(&mut self) -> Option<&str> {
        self.index = self.index.checked_sub(1)?;
        Some(self.href())
    }

    /// Step forward in history; returns the new href.
    pub fn forward(&mut self) -> Option<&str> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.href())
    }

    /// Number of session history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.entries.len()
    }
}
