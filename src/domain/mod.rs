//! Domain layer
//!
//! User-authored gateway objects: upstreams, upstream groups, routes and
//! virtual hosts. These types carry no proxy wire-format concerns; the
//! `xds` module translates them into envoy-types messages.
//!
//! ## Module Organization
//!
//! - `id`: resource identity shared by every stored object
//! - `route`: routes, matchers and the closed set of destination shapes
//! - `upstream`: upstream definitions and named upstream groups

pub mod id;
pub mod route;
pub mod upstream;

pub use id::ResourceRef;
pub use route::{
    Destination, DestinationSpec, HeaderMatch, MultiDestination, Parameters, PathMatch,
    ResponseParameters, Route, RouteAction, RouteMatcher, VirtualHost, WeightedDestination,
};
pub use upstream::{
    HeaderManipulation, HeaderValueSpec, StaticHost, TransformationTemplateSpec, Upstream,
    UpstreamGroup, UpstreamSpec,
};
