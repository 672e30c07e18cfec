//! # Validation
//!
//! Generated filter configuration is checked by the proxy itself before it
//! is handed out. Those checks are slow, so their outcomes are memoized by
//! content hash:
//! - `hash`: the [`ContentHash`] capability and digest helpers
//! - `cache`: [`ValidationCache`] in front of any [`ConfigValidator`]
//! - `envoy`: [`EnvoyValidator`], the out-of-process `--mode validate` check

pub mod cache;
pub mod envoy;
pub mod hash;

pub use cache::{ConfigValidator, ValidationCache, ValidationOutcome};
pub use envoy::{bootstrap_from_filter, EnvoyValidator};
pub use hash::{hash_message, ContentHash};
