//! Envoy configuration generation
//!
//! Translates domain objects into envoy-types messages and attaches
//! per-destination filter configuration:
//! - `route`: routes and virtual hosts
//! - `filters`: filter config payloads and `Any` helpers
//! - `extraction`: parameter templates to regex extraction rules
//! - `propagate`: per-destination attachment of filter config and headers

pub mod extraction;
pub mod filters;
pub mod propagate;
pub mod route;

pub use extraction::{
    build_extractors, build_response_extractors, compile_template, CompiledTemplate,
};
pub use filters::{any_from_message, message_from_any, FilterConfigArtifact};
pub use propagate::{
    mark_headers, mark_per_filter_config, modify_per_filter_config, propagate_with,
    route_destinations,
};
pub use route::{translate_route, translate_virtual_host};
