//! Destination-aware propagation of per-destination configuration.
//!
//! A route sends traffic to one destination, an inline list of weighted
//! destinations, or a named upstream group. Plugins compute configuration
//! per destination; this module places each result on the matching
//! attachment point of the translated envoy route: the route itself for a
//! single destination, or the positional `ClusterWeight` otherwise.
//!
//! The traversal is shared. [`mark_per_filter_config`] and [`mark_headers`]
//! only differ in what they attach.

use envoy_types::pb::envoy::config::core::v3::{
    header_value_option::HeaderAppendAction, HeaderValue, HeaderValueOption,
};
use envoy_types::pb::envoy::config::route::v3::{
    weighted_cluster::ClusterWeight, Route as EnvoyRoute,
};
use envoy_types::pb::google::protobuf::Any;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::domain::{Destination, HeaderManipulation, Route, RouteAction, WeightedDestination};
use crate::errors::{Result, TranslatorError};
use crate::snapshot::ResourceLookup;
use crate::xds::route::{cluster_weights, cluster_weights_mut};

/// Destinations of `input` in order, with groups resolved through `lookup`.
///
/// For weighted shapes the number of output cluster entries must equal the
/// number of input destinations. An output route without weighted clusters
/// counts as zero entries.
pub fn route_destinations<'a>(
    lookup: &'a dyn ResourceLookup,
    input: &'a Route,
    out: &EnvoyRoute,
) -> Result<Vec<&'a Destination>> {
    let weighted: &[WeightedDestination] = match &input.action {
        RouteAction::Single(dest) => return Ok(vec![dest]),
        RouteAction::Multi(multi) => &multi.destinations,
        RouteAction::UpstreamGroup(group_ref) => {
            &lookup.find_upstream_group(group_ref)?.destinations
        }
    };

    let actual = cluster_weights(out).len();
    if actual != weighted.len() {
        return Err(TranslatorError::cardinality_mismatch(
            input.display_name(),
            weighted.len(),
            actual,
        ));
    }

    Ok(weighted.iter().map(|w| &w.destination).collect())
}

/// Walk the destinations of `input` and attach what `produce` returns.
///
/// `produce` runs once per destination, in input order, after the
/// cardinality check. `None` means the caller has nothing for that
/// destination and nothing is attached. All results are produced before
/// anything is attached, and attachment works on a copy of `out`, so on
/// error `out` is left as it was.
pub fn propagate_with<T, P, R, W>(
    lookup: &dyn ResourceLookup,
    input: &Route,
    out: &mut EnvoyRoute,
    mut produce: P,
    mut on_route: R,
    mut on_weight: W,
) -> Result<()>
where
    P: FnMut(&Destination) -> Result<Option<T>>,
    R: FnMut(&mut EnvoyRoute, T) -> Result<()>,
    W: FnMut(&mut ClusterWeight, T) -> Result<()>,
{
    let destinations = route_destinations(lookup, input, out)?;
    let produced = destinations
        .into_iter()
        .map(|dest| produce(dest))
        .collect::<Result<Vec<Option<T>>>>()?;

    if produced.iter().all(Option::is_none) {
        return Ok(());
    }

    let mut staged = out.clone();
    if let RouteAction::Single(_) = &input.action {
        if let Some(config) = produced.into_iter().next().flatten() {
            on_route(&mut staged, config)?;
        }
    } else if let Some(weights) = cluster_weights_mut(&mut staged) {
        for (cluster, config) in weights.iter_mut().zip(produced) {
            if let Some(config) = config {
                trace!(cluster = %cluster.name, "attaching destination config");
                on_weight(cluster, config)?;
            }
        }
    }

    *out = staged;
    Ok(())
}

/// Attach filter configuration under `filter_name` for every destination
/// `produce` returns a config for.
pub fn mark_per_filter_config<P>(
    lookup: &dyn ResourceLookup,
    input: &Route,
    out: &mut EnvoyRoute,
    filter_name: &str,
    produce: P,
) -> Result<()>
where
    P: FnMut(&Destination) -> Result<Option<Any>>,
{
    debug!(route = %input.display_name(), filter = %filter_name, "propagating filter config");

    propagate_with(
        lookup,
        input,
        out,
        produce,
        |route, config| {
            let location = format!("route '{}'", route.name);
            insert_filter_config(&mut route.typed_per_filter_config, filter_name, config, &location)
        },
        |cluster, config| {
            let location = format!("cluster weight '{}'", cluster.name);
            insert_filter_config(&mut cluster.typed_per_filter_config, filter_name, config, &location)
        },
    )
}

/// Attach header manipulation for every destination `produce` returns one for.
pub fn mark_headers<P>(
    lookup: &dyn ResourceLookup,
    input: &Route,
    out: &mut EnvoyRoute,
    produce: P,
) -> Result<()>
where
    P: FnMut(&Destination) -> Result<Option<HeaderManipulation>>,
{
    propagate_with(
        lookup,
        input,
        out,
        produce,
        |route, headers| {
            route.request_headers_to_add.extend(header_value_options(&headers));
            route.request_headers_to_remove.extend(headers.request_headers_to_remove);
            Ok(())
        },
        |cluster, headers| {
            cluster.request_headers_to_add.extend(header_value_options(&headers));
            cluster.request_headers_to_remove.extend(headers.request_headers_to_remove);
            Ok(())
        },
    )
}

/// Replace the config stored under `filter_name` with what `f` returns.
///
/// `f` receives a copy of the current value, if any. Returning `None`
/// removes the filter. When `f` fails the map is not touched.
pub fn modify_per_filter_config<F>(
    configs: &mut HashMap<String, Any>,
    filter_name: &str,
    f: F,
) -> Result<()>
where
    F: FnOnce(Option<Any>) -> Result<Option<Any>>,
{
    match f(configs.get(filter_name).cloned())? {
        Some(updated) => {
            configs.insert(filter_name.to_string(), updated);
        }
        None => {
            configs.remove(filter_name);
        }
    }
    Ok(())
}

fn insert_filter_config(
    configs: &mut HashMap<String, Any>,
    filter_name: &str,
    config: Any,
    location: &str,
) -> Result<()> {
    if configs.contains_key(filter_name) {
        return Err(TranslatorError::duplicate_filter_config(filter_name, location));
    }
    // unordered map; each Any is hashed on its own, never the map as a whole
    configs.insert(filter_name.to_string(), config);
    Ok(())
}

fn header_value_options(headers: &HeaderManipulation) -> Vec<HeaderValueOption> {
    headers
        .request_headers_to_add
        .iter()
        .map(|h| {
            let action = if h.append {
                HeaderAppendAction::AppendIfExistsOrAdd
            } else {
                HeaderAppendAction::OverwriteIfExistsOrAdd
            };
            HeaderValueOption {
                header: Some(HeaderValue {
                    key: h.key.clone(),
                    value: h.value.clone(),
                    ..Default::default()
                }),
                append_action: action as i32,
                ..Default::default()
            }
        })
        .collect()
}
