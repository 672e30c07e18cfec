//! Upstream domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::id::ResourceRef;
use super::route::WeightedDestination;

/// Host/port pair of a static upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticHost {
    pub addr: String,
    pub port: u32,
}

/// Request rendering for one REST function.
///
/// Header and body values are inja templates evaluated by the proxy's
/// transformation filter; they may reference any extracted parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationTemplateSpec {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Backend-specific upstream configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamSpec {
    Static {
        hosts: Vec<StaticHost>,
    },
    Rest {
        hosts: Vec<StaticHost>,
        /// function name -> request template
        #[serde(default)]
        transformations: BTreeMap<String, TransformationTemplateSpec>,
    },
}

/// One header to inject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderValueSpec {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub append: bool,
}

/// Headers added to or removed from requests sent to an upstream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderManipulation {
    #[serde(default)]
    pub request_headers_to_add: Vec<HeaderValueSpec>,
    #[serde(default)]
    pub request_headers_to_remove: Vec<String>,
}

impl HeaderManipulation {
    pub fn is_empty(&self) -> bool {
        self.request_headers_to_add.is_empty() && self.request_headers_to_remove.is_empty()
    }
}

/// A user-declared backend service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upstream {
    pub metadata: ResourceRef,
    pub spec: UpstreamSpec,
    #[serde(default)]
    pub header_manipulation: Option<HeaderManipulation>,
}

impl Upstream {
    /// Request template for `function_name`, if this is a REST upstream that defines one
    pub fn rest_function(&self, function_name: &str) -> Option<&TransformationTemplateSpec> {
        match &self.spec {
            UpstreamSpec::Rest { transformations, .. } => transformations.get(function_name),
            UpstreamSpec::Static { .. } => None,
        }
    }
}

/// Named, ordered list of weighted destinations referenced by routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamGroup {
    pub metadata: ResourceRef,
    pub destinations: Vec<WeightedDestination>,
}
