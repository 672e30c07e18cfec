//! Route plugins
//!
//! Plugins run after route translation and decorate the envoy route with
//! per-destination configuration:
//! - `transformation`: REST function request and response transformations
//! - `headers`: upstream-declared request headers

pub mod headers;
pub mod transformation;

pub use headers::HeaderPlugin;
pub use transformation::{transformation_for, TransformationPlugin};
