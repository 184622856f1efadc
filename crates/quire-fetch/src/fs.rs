//! Filesystem fetcher.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::fetch::{Fetch, FetchError, FetchErrorKind, Fetched, is_remote};

const BACKEND: &str = "Fs";

/// Serves files from a source directory.
///
/// URLs are interpreted relative to `root`; query strings and fragments are
/// ignored and `..` may not climb above the root.
#[derive(Debug, Clone)]
pub struct FsFetch {
    root: PathBuf,
}

impl FsFetch {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URL to a path under the root.
    fn resolve(&self, url: &str) -> Result<PathBuf, FetchError> {
        let invalid = || {
            FetchError::new(FetchErrorKind::InvalidUrl)
                .with_url(url)
                .with_backend(BACKEND)
        };

        if is_remote(url) || url.contains(':') {
            return Err(invalid());
        }

        let path = url.split(['?', '#']).next().unwrap_or_default();
        let mut resolved = self.root.clone();
        let mut depth = 0usize;
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(invalid());
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        Ok(resolved)
    }
}

impl Fetch for FsFetch {
    fn get(&self, url: &str, _headers: &BTreeMap<String, String>) -> Result<Fetched, FetchError> {
        let path = self.resolve(url)?;
        let body = std::fs::read_to_string(&path)
            .map_err(|e| FetchError::io(e, Some(url.to_owned())).with_backend(BACKEND))?;
        let updated_at = std::fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        tracing::debug!(url, path = %path.display(), "Fetched local file");
        Ok(Fetched { body, updated_at })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture() -> (tempfile::TempDir, FsFetch) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("guide")).unwrap();
        std::fs::write(dir.path().join("README.md"), "# Home").unwrap();
        std::fs::write(dir.path().join("guide/intro.md"), "# Intro").unwrap();
        let fetch = FsFetch::new(dir.path());
        (dir, fetch)
    }

    #[test]
    fn test_get_existing_file() {
        let (_dir, fetch) = fixture();
        let page = fetch.get("/guide/intro.md", &BTreeMap::new()).unwrap();
        assert_eq!(page.body, "# Intro");
        assert!(page.updated_at.is_some());
    }

    #[test]
    fn test_get_ignores_query_and_relative_prefix() {
        let (_dir, fetch) = fixture();
        assert_eq!(fetch.get("README.md?v=1", &BTreeMap::new()).unwrap().body, "# Home");
        assert_eq!(
            fetch.get("/guide/../README.md", &BTreeMap::new()).unwrap().body,
            "# Home"
        );
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (_dir, fetch) = fixture();
        let err = fetch.get("/missing.md", &BTreeMap::new()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::NotFound);
        assert_eq!(err.backend, Some("Fs"));
    }

    #[test]
    fn test_traversal_rejected() {
        let (_dir, fetch) = fixture();
        let err = fetch.get("/../etc/passwd", &BTreeMap::new()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::InvalidUrl);
    }

    #[test]
    fn test_remote_url_rejected() {
        let (_dir, fetch) = fixture();
        let err = fetch.get("https://x.io/a.md", &BTreeMap::new()).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::InvalidUrl);
    }
}
