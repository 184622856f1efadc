//! Page fetching for Quire.
//!
//! This crate provides a [`Fetch`] trait that the orchestrator and the embed
//! resolver use to load Markdown, HTML and code files. This enables:
//!
//! - **Unit testing** without touching the filesystem or the network
//! - **Backend flexibility** (local source directory, remote HTTP origin)
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Fetch`] trait with a single `get()` method
//! - [`FsFetch`] for a local source directory
//! - [`HttpFetch`] for `http(s)://` URLs, built on `ureq`
//! - [`LayeredFetch`] routing local paths and remote URLs to the right backend
//! - [`FetchSlot`] for last-request-wins cancellation per fetch kind
//! - [`MockFetch`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use quire_fetch::{Fetch, FsFetch};
//!
//! let fetch = FsFetch::new("docs");
//! let page = fetch.get("/guide.md", &BTreeMap::new())?;
//! println!("{}", page.body);
//! ```

mod fetch;
mod fs;
mod http;
#[cfg(feature = "mock")]
mod mock;
mod slot;

pub use fetch::{ErrorStatus, Fetch, FetchError, FetchErrorKind, Fetched, is_remote};
pub use fs::FsFetch;
pub use http::{HttpFetch, LayeredFetch};
#[cfg(feature = "mock")]
pub use mock::MockFetch;
pub use slot::{FetchSlot, Ticket};
