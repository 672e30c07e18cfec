//! Upstream header manipulation.
//!
//! Upstreams may declare headers to add to, or strip from, every request
//! sent to them. Those apply per destination, so a weighted route only
//! carries them on the cluster entries of the upstreams that declare them.

use envoy_types::pb::envoy::config::route::v3::Route as EnvoyRoute;

use crate::domain::{Destination, HeaderManipulation, Route};
use crate::errors::Result;
use crate::snapshot::ResourceLookup;
use crate::translation_span;
use crate::xds::propagate::mark_headers;

/// Attaches upstream-declared request headers to translated routes
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderPlugin;

impl HeaderPlugin {
    pub fn new() -> Self {
        Self
    }

    pub fn process_route(
        &self,
        lookup: &dyn ResourceLookup,
        input: &Route,
        out: &mut EnvoyRoute,
    ) -> Result<()> {
        let _span = translation_span!("headers", input.display_name()).entered();
        mark_headers(lookup, input, out, |dest| headers_for(lookup, dest))
    }
}

fn headers_for(lookup: &dyn ResourceLookup, dest: &Destination) -> Result<Option<HeaderManipulation>> {
    let upstream = lookup.find_upstream(&dest.upstream)?;
    Ok(upstream.header_manipulation.clone().filter(|h| !h.is_empty()))
}
