//! Routing for Quire.
//!
//! Resolves navigation targets into [`Route`]s. The [`Router`] owns a
//! [`Location`] (the browser URL plus its session history) and one of two
//! [`History`] strategies:
//!
//! - [`HashHistory`]: routes live in `#/path?query` fragments
//! - [`NativeHistory`]: routes are real paths driven by push-state
//!
//! Navigation signals ([`NavigationSignal`]) are classified into a
//! [`Navigation`]: an in-page anchor move or a full refetch.
//!
//! # Example
//!
//! ```
//! use quire_config::Config;
//! use quire_router::{Location, Router};
//!
//! let config = Config::default();
//! let mut router = Router::new(&config, Location::new("http://localhost/#/guide?id=intro"));
//! router.update_render();
//!
//! assert_eq!(router.route().path, "/guide");
//! assert_eq!(router.route().anchor(), Some("intro"));
//! ```

mod history;
mod location;
pub mod path;
mod query;
mod route;
mod router;

pub use history::{
    HashHistory, History, HistoryEvent, NativeHistory, NavigationSignal, Resolver, Source,
};
pub use location::Location;
pub use query::{ANCHOR_KEY, Query};
pub use route::Route;
pub use router::{Navigation, Router};
