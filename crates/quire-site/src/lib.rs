//! Render orchestration and lifecycle hooks for Quire.
//!
//! [`Docs`] ties the router, fetcher, embed resolver and compiler together
//! and paints each navigation into a [`View`]:
//!
//! - cover page with an optional background
//! - main content, with `beforeEach`/`afterEach` hooks around compilation
//! - sidebar (file or generated) with the sub-sidebar under the active entry
//! - navbar with its active link marked
//! - scroll action for the host to apply
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use quire_config::Config;
//! use quire_fetch::FsFetch;
//! use quire_router::{Location, NavigationSignal};
//! use quire_site::Docs;
//!
//! let config = Arc::new(Config::load(None, None)?);
//! let fetch = Arc::new(FsFetch::new(&config.source_dir));
//! let mut docs = Docs::new(config, Location::new("http://localhost/#/"), fetch);
//! docs.start()?;
//!
//! docs.navigate(NavigationSignal::LinkClick {
//!     href: "#/guide".to_owned(),
//!     target: None,
//! })?;
//! println!("{}", docs.view().main);
//! # Ok(())
//! # }
//! ```

mod docs;
mod hooks;
mod loader;
pub mod markup;
mod updated;
mod view;

pub use docs::{Docs, FetchSlots, SiteError};
pub use hooks::{HookFlow, HookRegistry, Phase, Plugin};
pub use loader::not_found_path;
pub use updated::{UPDATED_PLACEHOLDER, format_date, format_updated};
pub use view::{Cover, CoverBackground, NOT_FOUND_HTML, ScrollAction, View};
