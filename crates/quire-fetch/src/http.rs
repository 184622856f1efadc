//! HTTP fetcher and the local/remote router.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ureq::Agent;

use crate::fetch::{ErrorStatus, Fetch, FetchError, FetchErrorKind, Fetched, is_remote};
use crate::fs::FsFetch;

const BACKEND: &str = "Http";

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Fetches `http(s)://` URLs.
///
/// Relative URLs are joined onto `base_url` when one is configured.
#[derive(Clone)]
pub struct HttpFetch {
    agent: Agent,
    base_url: Option<String>,
}

impl std::fmt::Debug for HttpFetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetch")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Default for HttpFetch {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HttpFetch {
    /// Create a fetcher; `base_url` serves relative URLs.
    #[must_use]
    pub fn new(base_url: Option<&str>) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT)))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.map(|url| url.trim_end_matches('/').to_owned()),
        }
    }

    fn absolute_url(&self, url: &str) -> Result<String, FetchError> {
        if let Some(rest) = url.strip_prefix("//") {
            return Ok(format!("https://{rest}"));
        }
        if is_remote(url) {
            return Ok(url.to_owned());
        }
        match &self.base_url {
            Some(base) => Ok(format!("{base}/{}", url.trim_start_matches('/'))),
            None => Err(FetchError::new(FetchErrorKind::InvalidUrl)
                .with_url(url)
                .with_backend(BACKEND)),
        }
    }
}

fn transport_error(err: ureq::Error, url: &str) -> FetchError {
    let (kind, status) = match err {
        ureq::Error::Timeout(_) => (FetchErrorKind::Timeout, ErrorStatus::Temporary),
        ureq::Error::Io(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            (FetchErrorKind::Unavailable, ErrorStatus::Temporary)
        }
        _ => (FetchErrorKind::Other, ErrorStatus::Permanent),
    };
    FetchError::new(kind)
        .with_status(status)
        .with_url(url)
        .with_backend(BACKEND)
        .with_source(err)
}

impl Fetch for HttpFetch {
    fn get(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<Fetched, FetchError> {
        let url = self.absolute_url(url)?;

        let mut request = self.agent.get(&url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let mut response = request.call().map_err(|e| transport_error(e, &url))?;

        let code = response.status().as_u16();
        if code == 404 {
            return Err(FetchError::not_found(&url)
                .with_backend(BACKEND)
                .with_http_status(code));
        }
        if !response.status().is_success() {
            return Err(FetchError::new(FetchErrorKind::Unavailable)
                .with_url(&url)
                .with_backend(BACKEND)
                .with_http_status(code));
        }

        let updated_at = response
            .headers()
            .get("last-modified")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|d| d.with_timezone(&Utc));
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| transport_error(e, &url))?;

        tracing::debug!(url = %url, status = code, "Fetched remote file");
        Ok(Fetched { body, updated_at })
    }
}

/// Local paths go to the source directory, remote URLs over HTTP.
#[derive(Debug, Clone)]
pub struct LayeredFetch {
    local: FsFetch,
    remote: HttpFetch,
}

impl LayeredFetch {
    #[must_use]
    pub fn new(local: FsFetch, remote: HttpFetch) -> Self {
        Self { local, remote }
    }
}

impl Fetch for LayeredFetch {
    fn get(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<Fetched, FetchError> {
        if is_remote(url) {
            self.remote.get(url, headers)
        } else {
            self.local.get(url, headers)
        }
    }
}
