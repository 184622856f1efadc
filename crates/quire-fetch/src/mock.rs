//! Mock fetcher for testing.
//!
//! Provides [`MockFetch`] for unit testing without filesystem or network access.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::fetch::{Fetch, FetchError, FetchErrorKind, Fetched};

/// Mock fetcher for testing.
///
/// Serves bodies from memory. Use the builder methods to configure the mock
/// with test data; every request is recorded with its headers.
///
/// # Example
///
/// ```ignore
/// use quire_fetch::{Fetch, MockFetch};
///
/// let fetch = MockFetch::new()
///     .with_page("/README.md", "# Home")
///     .with_delay("/README.md", Duration::from_millis(20));
///
/// let page = fetch.get("/README.md", &BTreeMap::new()).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockFetch {
    pages: RwLock<HashMap<String, Fetched>>,
    errors: RwLock<HashMap<String, FetchErrorKind>>,
    delays: RwLock<HashMap<String, Duration>>,
    requests: RwLock<Vec<(String, BTreeMap<String, String>)>>,
}

/// Key used for lookups: the URL without query string.
fn key(url: &str) -> &str {
    url.split('?').next().unwrap_or_default()
}

impl MockFetch {
    /// Create a new empty mock fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_page(self, url: &str, body: impl Into<String>) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert(key(url).to_owned(), Fetched::new(body));
        self
    }

    /// Serve `body` for `url` with a modification time.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_updated_page(
        self,
        url: &str,
        body: impl Into<String>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        self.pages.write().unwrap().insert(
            key(url).to_owned(),
            Fetched {
                body: body.into(),
                updated_at: Some(updated_at),
            },
        );
        self
    }

    /// Fail requests for `url` with `kind`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_error(self, url: &str, kind: FetchErrorKind) -> Self {
        self.errors.write().unwrap().insert(key(url).to_owned(), kind);
        self
    }

    /// Delay responses for `url`, to exercise out-of-order completion.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_delay(self, url: &str, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(key(url).to_owned(), delay);
        self
    }

    /// URLs requested so far, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requests
            .read()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    /// Headers sent with the most recent request for `url`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn headers_for(&self, url: &str) -> Option<BTreeMap<String, String>> {
        self.requests
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(requested, _)| requested == url)
            .map(|(_, headers)| headers.clone())
    }
}

impl Fetch for MockFetch {
    fn get(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<Fetched, FetchError> {
        self.requests
            .write()
            .unwrap()
            .push((url.to_owned(), headers.clone()));

        let delay = self.delays.read().unwrap().get(key(url)).copied();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if let Some(kind) = self.errors.read().unwrap().get(key(url)) {
            return Err(FetchError::new(*kind).with_url(url).with_backend("Mock"));
        }

        self.pages
            .read()
            .unwrap()
            .get(key(url))
            .cloned()
            .ok_or_else(|| FetchError::not_found(url).with_backend("Mock"))
    }
}
