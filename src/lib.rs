//! # Routeweave
//!
//! Configuration-translation core of an Envoy-based API gateway. Turns
//! user-authored routes, upstreams and upstream groups into envoy-types
//! route configuration and attaches per-destination filter configuration.
//!
//! ## Architecture
//!
//! ```text
//! domain objects → xds::route → envoy Route → plugins → decorated envoy Route
//!                                                ↓
//!                     xds::extraction / xds::propagate / validation cache
//! ```
//!
//! ## Core Components
//!
//! - **Extraction compiler** (`xds::extraction`): parameter templates such
//!   as `/users/{id}` to regex extraction rules
//! - **Destination propagator** (`xds::propagate`): places per-destination
//!   config on the route or on the matching weighted cluster entry
//! - **Validation cache** (`validation`): remembers proxy validation
//!   outcomes by content hash
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use routeweave::{ApiSnapshot, Result, Route};
//! use routeweave::plugins::TransformationPlugin;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run(snapshot: ApiSnapshot, route: Route) -> Result<()> {
//! let mut out = routeweave::xds::translate_route(&route, &snapshot)?;
//! let plugin: TransformationPlugin = TransformationPlugin::without_validation();
//! plugin.process_route(&snapshot, &CancellationToken::new(), &route, &mut out).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod plugins;
pub mod snapshot;
pub mod validation;
pub mod xds;

// Re-export commonly used types and traits
pub use crate::config::AppConfig;
pub use domain::{Destination, ResourceRef, Route, RouteAction, Upstream, UpstreamGroup};
pub use errors::{Result, TranslatorError};
pub use observability::init_observability;
pub use snapshot::{ApiSnapshot, ResourceLookup};
pub use validation::{ContentHash, ValidationCache};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
