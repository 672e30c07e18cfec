//! Route domain types
//!
//! Routes pair a match specification with exactly one destination shape.
//! The shape is a closed enum, so "more than one shape populated" and
//! "unknown shape" cannot be expressed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::id::ResourceRef;
use super::upstream::TransformationTemplateSpec;

/// Path matching strategy for route selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMatch {
    /// Exact path match
    Exact(String),

    /// Prefix match
    Prefix(String),

    /// Regular expression match
    Regex(String),
}

impl Default for PathMatch {
    fn default() -> Self {
        PathMatch::Prefix("/".to_string())
    }
}

/// Header matching criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMatch {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub invert_match: bool,
}

/// Request matching for a route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMatcher {
    #[serde(default)]
    pub path: PathMatch,
    #[serde(default)]
    pub headers: Vec<HeaderMatch>,
    #[serde(default)]
    pub methods: Vec<String>,
}

/// Request parameters a function destination extracts values from.
///
/// Header templates are kept in a `BTreeMap` so extraction rules are built
/// in a stable, alphabetical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    /// header name -> template, e.g. `x-user-id: "{id}"`
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// path template, e.g. `/users/{id}`
    #[serde(default)]
    pub path: Option<String>,
}

/// Response headers a function destination extracts values from.
///
/// Unlike [`Parameters`] there is no path and no implicit `method`/`path`
/// extraction; only the listed header templates produce rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Protocol-specific destination data consumed by function plugins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationSpec {
    Rest {
        function_name: String,
        #[serde(default)]
        parameters: Option<Parameters>,
        /// Applied to the upstream's response; absent means no response transformation
        #[serde(default)]
        response_template: Option<TransformationTemplateSpec>,
        #[serde(default)]
        response_parameters: Option<ResponseParameters>,
    },
    Grpc {
        package: String,
        service: String,
        function: String,
        #[serde(default)]
        parameters: Option<Parameters>,
    },
    Aws {
        logical_name: String,
    },
    Azure {
        function_name: String,
    },
}

/// A single upstream target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub upstream: ResourceRef,
    #[serde(default)]
    pub destination_spec: Option<DestinationSpec>,
}

impl Destination {
    pub fn new(upstream: ResourceRef) -> Self {
        Self { upstream, destination_spec: None }
    }

    pub fn with_spec(mut self, spec: DestinationSpec) -> Self {
        self.destination_spec = Some(spec);
        self
    }
}

/// A destination with its share of traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedDestination {
    pub destination: Destination,
    #[serde(default)]
    pub weight: u32,
}

impl WeightedDestination {
    pub fn new(destination: Destination, weight: u32) -> Self {
        Self { destination, weight }
    }
}

/// Inline list of weighted destinations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiDestination {
    pub destinations: Vec<WeightedDestination>,
}

/// Where a route sends traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteAction {
    /// One upstream
    Single(Destination),
    /// Inline weighted upstreams
    Multi(MultiDestination),
    /// Weighted upstreams stored in a named group
    UpstreamGroup(ResourceRef),
}

/// A user-authored route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub matcher: RouteMatcher,
    pub action: RouteAction,
}

impl Route {
    /// Name used in logs and error messages
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}

/// A set of domains and the routes served for them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualHost {
    pub name: String,
    pub domains: Vec<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
}
