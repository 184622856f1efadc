use crate::query::{ANCHOR_KEY, Query};

/// A parsed navigation target.
///
/// Created fresh on every parse and replaced, never mutated, on navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Route {
    /// Logical document path.
    pub path: String,
    /// Source file after alias, extension and homepage resolution.
    pub file: String,
    pub query: Query,
}

impl Route {
    /// In-page anchor (`?id=`), if any.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        self.query.get(ANCHOR_KEY).filter(|id| !id.is_empty())
    }
}
