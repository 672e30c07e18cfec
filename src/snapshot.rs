//! Point-in-time view of the configuration objects routes refer to.

use serde::{Deserialize, Serialize};

use crate::domain::{ResourceRef, Upstream, UpstreamGroup};
use crate::errors::{Result, TranslatorError};

/// Indirect lookups needed while translating routes.
///
/// Missing objects are reported as [`TranslatorError::NotFound`] so callers
/// can tell a dangling reference apart from every other failure.
pub trait ResourceLookup {
    fn find_upstream_group(&self, group: &ResourceRef) -> Result<&UpstreamGroup>;

    fn find_upstream(&self, upstream: &ResourceRef) -> Result<&Upstream>;
}

/// Snapshot of upstreams and upstream groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSnapshot {
    #[serde(default)]
    pub upstreams: Vec<Upstream>,
    #[serde(default)]
    pub upstream_groups: Vec<UpstreamGroup>,
}

impl ApiSnapshot {
    /// Parse a snapshot from its YAML representation
    pub fn from_yaml(input: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(input)?)
    }

    /// Parse a snapshot from its JSON representation
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

impl ResourceLookup for ApiSnapshot {
    fn find_upstream_group(&self, group: &ResourceRef) -> Result<&UpstreamGroup> {
        self.upstream_groups
            .iter()
            .find(|g| &g.metadata == group)
            .ok_or_else(|| TranslatorError::not_found("UpstreamGroup", group.to_string()))
    }

    fn find_upstream(&self, upstream: &ResourceRef) -> Result<&Upstream> {
        self.upstreams
            .iter()
            .find(|u| &u.metadata == upstream)
            .ok_or_else(|| TranslatorError::not_found("Upstream", upstream.to_string()))
    }
}
