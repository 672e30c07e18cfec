//! Common test utilities for all integration tests.
//!
//! Provides shared snapshot fixtures and route builders.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use routeweave::domain::{
    Destination, DestinationSpec, MultiDestination, Parameters, ResourceRef, Route, RouteAction,
    RouteMatcher, WeightedDestination,
};
use routeweave::ApiSnapshot;

pub const NAMESPACE: &str = "test";

/// Upstreams `yes` and `no`, group `test/grp` = [yes, no], and a REST
/// upstream `petstore` with one templated function.
pub const SNAPSHOT_YAML: &str = r#"
upstreams:
  - metadata: { namespace: test, name: "yes" }
    spec:
      rest:
        hosts: [{ addr: 10.0.0.1, port: 8080 }]
        transformations:
          getItem:
            headers:
              ":path": "/items/{{ id }}"
    header_manipulation:
      request_headers_to_add:
        - { key: x-upstream, value: "yes" }
      request_headers_to_remove: [x-debug]
  - metadata: { namespace: test, name: "no" }
    spec:
      static:
        hosts: [{ addr: 10.0.0.2, port: 8080 }]
  - metadata: { namespace: test, name: petstore }
    spec:
      rest:
        hosts: [{ addr: petstore.test.svc, port: 8080 }]
        transformations:
          addPet:
            headers:
              ":method": POST
              ":path": /api/pets
            body: '{"id": {{ id }}, "name": "{{ name }}"}'
upstream_groups:
  - metadata: { namespace: test, name: grp }
    destinations:
      - destination: { upstream: { namespace: test, name: "yes" } }
        weight: 1
      - destination: { upstream: { namespace: test, name: "no" } }
        weight: 1
"#;

pub fn snapshot() -> ApiSnapshot {
    ApiSnapshot::from_yaml(SNAPSHOT_YAML).expect("fixture snapshot parses")
}

pub fn destination(name: &str) -> Destination {
    Destination::new(ResourceRef::new(NAMESPACE, name))
}

/// Destination calling `function` on upstream `name`
pub fn rest_destination(name: &str, function: &str, params: Parameters) -> Destination {
    destination(name).with_spec(DestinationSpec::Rest {
        function_name: function.to_string(),
        parameters: Some(params),
        response_template: None,
        response_parameters: None,
    })
}

pub fn route(name: &str, action: RouteAction) -> Route {
    Route { name: Some(name.to_string()), matcher: RouteMatcher::default(), action }
}

pub fn multi_route(name: &str, destinations: Vec<Destination>) -> Route {
    route(
        name,
        RouteAction::Multi(MultiDestination {
            destinations: destinations.into_iter().map(|d| WeightedDestination::new(d, 1)).collect(),
        }),
    )
}

pub fn group_route(name: &str, group: &str) -> Route {
    route(name, RouteAction::UpstreamGroup(ResourceRef::new(NAMESPACE, group)))
}
