//! Fetch trait and error types.
//!
//! # URL Convention
//!
//! `url` parameters are what the router resolved for a file:
//! - `"/guide.md"` or `"guide.md"` - a file under the source directory
//! - `"/docs/_sidebar.md?v=2"` - query strings are ignored by local backends
//! - `"https://raw.example.com/README.md"` - a remote file

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Fetched file body plus its modification time, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: String,
    /// Last modification time (file mtime or `Last-Modified`).
    pub updated_at: Option<DateTime<Utc>>,
}

impl Fetched {
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            updated_at: None,
        }
    }
}

/// Fetch collaborator.
///
/// Implementations must be shareable across the rayon pool: embed fetches
/// and the main/navbar pair run concurrently.
pub trait Fetch: Send + Sync {
    /// Fetch `url` with extra request headers.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] with [`FetchErrorKind::NotFound`] for missing
    /// files, or another kind for transport failures.
    fn get(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<Fetched, FetchError>;
}

/// Whether `url` must be fetched over the network.
#[must_use]
pub fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with("//")
}

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// URL the backend cannot serve.
    InvalidUrl,
    /// Backend is temporarily unavailable or answered with an error status.
    Unavailable,
    /// Request timed out.
    Timeout,
    /// A newer request of the same kind superseded this one.
    Aborted,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (not found, invalid URL).
    #[default]
    Permanent,
    /// Retry immediately (timeout, connection reset).
    Temporary,
}

/// Fetch error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct FetchError {
    /// Semantic error category.
    pub kind: FetchErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// HTTP status code (if applicable).
    pub http_status: Option<u16>,
    /// URL context (if applicable).
    pub url: Option<String>,
    /// Backend identifier (e.g., "Fs", "Http", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl FetchError {
    /// Create a new fetch error.
    #[must_use]
    pub fn new(kind: FetchErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            http_status: None,
            url: None,
            backend: None,
            source: None,
        }
    }

    /// Attach URL context.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the HTTP status code.
    #[must_use]
    pub fn with_http_status(mut self, code: u16) -> Self {
        self.http_status = Some(code);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with URL.
    #[must_use]
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::NotFound).with_url(url)
    }

    /// Create an aborted error for a superseded request.
    #[must_use]
    pub fn aborted() -> Self {
        Self::new(FetchErrorKind::Aborted)
    }

    /// Whether the request was superseded rather than failed.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.kind == FetchErrorKind::Aborted
    }

    /// Create a fetch error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, url: Option<String>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => FetchErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => FetchErrorKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => FetchErrorKind::Timeout,
            _ => FetchErrorKind::Other,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut => ErrorStatus::Temporary,
            _ => ErrorStatus::Permanent,
        };
        let mut error = Self::new(kind).with_status(status).with_source(err);
        if let Some(u) = url {
            error = error.with_url(u);
        }
        error
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind (404): message (url: /foo.md)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            FetchErrorKind::NotFound => "Not found",
            FetchErrorKind::PermissionDenied => "Permission denied",
            FetchErrorKind::InvalidUrl => "Invalid URL",
            FetchErrorKind::Unavailable => "Unavailable",
            FetchErrorKind::Timeout => "Timeout",
            FetchErrorKind::Aborted => "Aborted",
            FetchErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(code) = self.http_status {
            write!(f, " ({code})")?;
        }

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(url) = &self.url {
            write!(f, " (url: {url})")?;
        }

        Ok(())
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
