//! Route translation using envoy-types
//!
//! Converts domain routes and virtual hosts into envoy-types route messages.
//! Filter configuration is not attached here; plugins add it afterwards
//! through [`crate::xds::propagate`].

use envoy_types::pb::envoy::config::route::v3::{
    header_matcher::HeaderMatchSpecifier, route::Action, route_action::ClusterSpecifier,
    route_match::PathSpecifier, weighted_cluster::ClusterWeight, HeaderMatcher,
    Route as EnvoyRoute, RouteAction as EnvoyRouteAction, RouteMatch,
    VirtualHost as EnvoyVirtualHost, WeightedCluster,
};
use envoy_types::pb::envoy::r#type::matcher::v3::{
    string_matcher::MatchPattern, RegexMatcher, StringMatcher,
};
use envoy_types::pb::google::protobuf::UInt32Value;

use crate::domain::{
    HeaderMatch, PathMatch, Route, RouteAction, RouteMatcher, VirtualHost, WeightedDestination,
};
use crate::errors::Result;
use crate::snapshot::ResourceLookup;

/// Convert a domain route into an envoy route.
///
/// Weighted destinations keep their input order, so output entry `i`
/// always corresponds to input destination `i`.
pub fn translate_route(route: &Route, lookup: &dyn ResourceLookup) -> Result<EnvoyRoute> {
    let cluster_specifier = match &route.action {
        RouteAction::Single(dest) => ClusterSpecifier::Cluster(dest.upstream.cluster_name()),
        RouteAction::Multi(multi) => weighted_clusters(&multi.destinations),
        RouteAction::UpstreamGroup(group_ref) => {
            let group = lookup.find_upstream_group(group_ref)?;
            weighted_clusters(&group.destinations)
        }
    };

    #[allow(deprecated)]
    let route_action = EnvoyRouteAction {
        cluster_specifier: Some(cluster_specifier),
        ..Default::default()
    };

    Ok(EnvoyRoute {
        name: route.name.clone().unwrap_or_default(),
        r#match: Some(translate_matcher(&route.matcher)),
        action: Some(Action::Route(route_action)),
        ..Default::default()
    })
}

/// Convert a domain virtual host, translating each of its routes.
pub fn translate_virtual_host(
    virtual_host: &VirtualHost,
    lookup: &dyn ResourceLookup,
) -> Result<EnvoyVirtualHost> {
    let routes: Result<Vec<EnvoyRoute>> =
        virtual_host.routes.iter().map(|r| translate_route(r, lookup)).collect();

    Ok(EnvoyVirtualHost {
        name: virtual_host.name.clone(),
        domains: virtual_host.domains.clone(),
        routes: routes?,
        ..Default::default()
    })
}

/// Weighted cluster entries of `route`, or an empty slice for any other action.
pub fn cluster_weights(route: &EnvoyRoute) -> &[ClusterWeight] {
    match &route.action {
        Some(Action::Route(EnvoyRouteAction {
            cluster_specifier: Some(ClusterSpecifier::WeightedClusters(weighted)),
            ..
        })) => &weighted.clusters,
        _ => &[],
    }
}

/// Mutable counterpart of [`cluster_weights`]
pub fn cluster_weights_mut(route: &mut EnvoyRoute) -> Option<&mut Vec<ClusterWeight>> {
    match &mut route.action {
        Some(Action::Route(EnvoyRouteAction {
            cluster_specifier: Some(ClusterSpecifier::WeightedClusters(weighted)),
            ..
        })) => Some(&mut weighted.clusters),
        _ => None,
    }
}

fn weighted_clusters(destinations: &[WeightedDestination]) -> ClusterSpecifier {
    let clusters = destinations
        .iter()
        .map(|wd| ClusterWeight {
            name: wd.destination.upstream.cluster_name(),
            weight: Some(UInt32Value { value: wd.weight }),
            ..Default::default()
        })
        .collect();

    ClusterSpecifier::WeightedClusters(WeightedCluster { clusters, ..Default::default() })
}

fn translate_matcher(matcher: &RouteMatcher) -> RouteMatch {
    let path_specifier = match &matcher.path {
        PathMatch::Exact(path) => PathSpecifier::Path(path.clone()),
        PathMatch::Prefix(prefix) => PathSpecifier::Prefix(prefix.clone()),
        PathMatch::Regex(regex) => PathSpecifier::SafeRegex(RegexMatcher {
            regex: regex.clone(),
            ..Default::default()
        }),
    };

    let mut headers: Vec<HeaderMatcher> = matcher.headers.iter().map(translate_header).collect();

    if !matcher.methods.is_empty() {
        headers.push(HeaderMatcher {
            name: ":method".to_string(),
            header_match_specifier: Some(HeaderMatchSpecifier::StringMatch(StringMatcher {
                match_pattern: Some(MatchPattern::SafeRegex(RegexMatcher {
                    regex: matcher.methods.join("|"),
                    ..Default::default()
                })),
                ..Default::default()
            })),
            ..Default::default()
        });
    }

    RouteMatch { path_specifier: Some(path_specifier), headers, ..Default::default() }
}

fn translate_header(header: &HeaderMatch) -> HeaderMatcher {
    let specifier = match &header.value {
        None => HeaderMatchSpecifier::PresentMatch(true),
        Some(value) => {
            let pattern = if header.regex {
                MatchPattern::SafeRegex(RegexMatcher { regex: value.clone(), ..Default::default() })
            } else {
                MatchPattern::Exact(value.clone())
            };
            HeaderMatchSpecifier::StringMatch(StringMatcher {
                match_pattern: Some(pattern),
                ..Default::default()
            })
        }
    };

    HeaderMatcher {
        name: header.name.clone(),
        invert_match: header.invert_match,
        header_match_specifier: Some(specifier),
        ..Default::default()
    }
}
