//! REST function transformations.
//!
//! For destinations that call a function of a REST upstream, renders the
//! function's request template together with the extraction rules built
//! from the destination's parameters, plus the destination's response
//! template if it has one. Every generated config is validated before any
//! of them is attached as `io.solo.transformation` per-filter config.
//! Configs already attached under that name are merged with, not replaced.

use envoy_types::pb::envoy::config::route::v3::Route as EnvoyRoute;
use envoy_types::pb::google::protobuf::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::config::AppConfig;
use crate::domain::{Destination, DestinationSpec, Route};
use crate::errors::{Result, TranslatorError};
use crate::snapshot::ResourceLookup;
use crate::translation_span;
use crate::validation::{ConfigValidator, EnvoyValidator, ValidationCache};
use crate::xds::extraction::{build_extractors, build_response_extractors};
use crate::xds::filters::transformation::{
    RouteTransformations, TransformationTemplate, FILTER_NAME, ROUTE_TRANSFORMATIONS_TYPE_URL,
};
use crate::xds::filters::{any_from_message, message_from_any, FilterConfigArtifact};
use crate::xds::propagate::{modify_per_filter_config, propagate_with, route_destinations};

/// Attaches REST request and response transformations to translated routes
pub struct TransformationPlugin<V = EnvoyValidator>
where
    V: ConfigValidator<Artifact = FilterConfigArtifact>,
{
    validation: Option<Arc<ValidationCache<V>>>,
}

impl TransformationPlugin<EnvoyValidator> {
    /// Plugin validating through the configured proxy binary, or without
    /// validation when `validation.enabled` is off.
    pub fn from_config(config: &AppConfig) -> Self {
        if !config.validation.enabled {
            debug!("proxy-side validation disabled");
            return Self::without_validation();
        }
        let validator = EnvoyValidator::from_config(&config.validation);
        Self::new(Arc::new(ValidationCache::new(validator, config)))
    }
}

impl<V> TransformationPlugin<V>
where
    V: ConfigValidator<Artifact = FilterConfigArtifact>,
{
    /// Validate every generated config through `cache` before attaching it
    pub fn new(cache: Arc<ValidationCache<V>>) -> Self {
        Self { validation: Some(cache) }
    }

    /// Attach generated configs without proxy-side validation
    pub fn without_validation() -> Self {
        Self { validation: None }
    }

    pub fn validation_cache(&self) -> Option<&Arc<ValidationCache<V>>> {
        self.validation.as_ref()
    }

    /// Attach transformations for every REST function destination of `input`.
    ///
    /// `out` is only modified when every generated config passed validation
    /// and merged cleanly.
    pub async fn process_route(
        &self,
        lookup: &dyn ResourceLookup,
        cancel: &CancellationToken,
        input: &Route,
        out: &mut EnvoyRoute,
    ) -> Result<()> {
        let span = translation_span!("transformation", input.display_name());

        async {
            let configs = route_destinations(lookup, input, out)?
                .into_iter()
                .map(|dest| transformation_for(lookup, dest))
                .collect::<Result<Vec<_>>>()?;

            if let Some(cache) = &self.validation {
                for config in configs.iter().flatten() {
                    let artifact = FilterConfigArtifact::new(
                        FILTER_NAME,
                        any_from_message(ROUTE_TRANSFORMATIONS_TYPE_URL, config),
                    );
                    cache.validate(cancel, &artifact).await?;
                }
            }

            let attached = configs.iter().flatten().count();
            let mut replay = configs.into_iter();
            propagate_with(
                lookup,
                input,
                out,
                |_| Ok(replay.next().flatten()),
                |route, config| {
                    let location = format!("route '{}'", route.name);
                    merge_transformations(&mut route.typed_per_filter_config, config, &location)
                },
                |cluster, config| {
                    let location = format!("cluster weight '{}'", cluster.name);
                    merge_transformations(&mut cluster.typed_per_filter_config, config, &location)
                },
            )?;

            debug!(attached, "transformations attached");
            Ok::<(), TranslatorError>(())
        }
        .instrument(span)
        .await
    }
}

/// Transformation config for one destination, or `None` when the
/// destination does not call a REST function with a request template or
/// carry a response template.
pub fn transformation_for(
    lookup: &dyn ResourceLookup,
    dest: &Destination,
) -> Result<Option<RouteTransformations>> {
    let Some(DestinationSpec::Rest {
        function_name,
        parameters,
        response_template,
        response_parameters,
    }) = &dest.destination_spec
    else {
        return Ok(None);
    };

    let upstream = lookup.find_upstream(&dest.upstream)?;
    let request = match upstream.rest_function(function_name) {
        Some(template) => {
            let params = parameters.clone().unwrap_or_default();
            Some(TransformationTemplate::from_spec(template, build_extractors(&params)?))
        }
        None => {
            debug!(
                upstream = %dest.upstream,
                function = %function_name,
                "no request template for function"
            );
            None
        }
    };

    let response = match response_template {
        Some(template) => {
            let params = response_parameters.clone().unwrap_or_default();
            Some(TransformationTemplate::from_spec(template, build_response_extractors(&params)?))
        }
        None => None,
    };

    if request.is_none() && response.is_none() {
        return Ok(None);
    }
    Ok(Some(RouteTransformations::default().with_request(request).with_response(response)))
}

fn merge_transformations(
    configs: &mut HashMap<String, Any>,
    incoming: RouteTransformations,
    location: &str,
) -> Result<()> {
    modify_per_filter_config(configs, FILTER_NAME, |existing| {
        let merged = match existing {
            None => incoming,
            Some(any) => {
                let mut current: RouteTransformations =
                    message_from_any(ROUTE_TRANSFORMATIONS_TYPE_URL, &any)?;
                current.merge(incoming, location)?;
                current
            }
        };
        Ok(Some(any_from_message(ROUTE_TRANSFORMATIONS_TYPE_URL, &merged)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Parameters, ResourceRef, ResponseParameters, RouteAction, TransformationTemplateSpec,
    };
    use crate::snapshot::ApiSnapshot;
    use crate::xds::route::translate_route;
    use std::collections::BTreeMap;

    const SNAPSHOT: &str = r#"
upstreams:
  - metadata: { namespace: default, name: petstore }
    spec:
      rest:
        hosts: [{ addr: petstore.default.svc, port: 8080 }]
        transformations:
          findPetById:
            headers:
              ":path": "/api/pets/{{ id }}"
              ":method": GET
"#;

    fn rest_spec(function_name: &str) -> DestinationSpec {
        DestinationSpec::Rest {
            function_name: function_name.into(),
            parameters: Some(Parameters { path: Some("/pets/{id}".into()), ..Default::default() }),
            response_template: None,
            response_parameters: None,
        }
    }

    fn with_response(spec: DestinationSpec) -> DestinationSpec {
        let DestinationSpec::Rest { function_name, parameters, .. } = spec else {
            unreachable!()
        };
        DestinationSpec::Rest {
            function_name,
            parameters,
            response_template: Some(TransformationTemplateSpec {
                headers: BTreeMap::from([("x-pet-status".to_string(), "{{ status }}".to_string())]),
                body: None,
            }),
            response_parameters: Some(ResponseParameters {
                headers: BTreeMap::from([("x-status".to_string(), "pet-{status}".to_string())]),
            }),
        }
    }

    fn single(spec: DestinationSpec) -> Route {
        Route {
            name: Some("pets".into()),
            matcher: Default::default(),
            action: RouteAction::Single(
                Destination::new(ResourceRef::new("default", "petstore")).with_spec(spec),
            ),
        }
    }

    fn destination_of(route: &Route) -> &Destination {
        match &route.action {
            RouteAction::Single(dest) => dest,
            other => panic!("expected single destination, got {:?}", other),
        }
    }

    #[test]
    fn test_transformation_for_rest_function() {
        let snapshot = ApiSnapshot::from_yaml(SNAPSHOT).unwrap();
        let route = single(rest_spec("findPetById"));

        let config = transformation_for(&snapshot, destination_of(&route)).unwrap().unwrap();
        assert!(config.response_transformation.is_none());
        let template = config
            .request_transformation
            .and_then(|t| t.transformation_template)
            .unwrap();

        assert_eq!(template.extractors["id"].header, ":path");
        assert_eq!(template.extractors["id"].subgroup, 1);
        assert!(template.extractors.contains_key("method"));
        assert_eq!(template.headers[":method"].text, "GET");
    }

    #[test]
    fn test_response_template_uses_header_extractors_only() {
        let snapshot = ApiSnapshot::from_yaml(SNAPSHOT).unwrap();
        let route = single(with_response(rest_spec("findPetById")));

        let config = transformation_for(&snapshot, destination_of(&route)).unwrap().unwrap();
        assert!(config.request_transformation.is_some());
        let response = config
            .response_transformation
            .and_then(|t| t.transformation_template)
            .unwrap();

        assert_eq!(response.extractors.len(), 1);
        assert_eq!(response.extractors["status"].header, "x-status");
        assert!(!response.extractors.contains_key("method"));
        assert!(!response.extractors.contains_key("path"));
        assert_eq!(response.headers["x-pet-status"].text, "{{ status }}");
    }

    #[test]
    fn test_response_only_destination() {
        let snapshot = ApiSnapshot::from_yaml(SNAPSHOT).unwrap();
        let route = single(with_response(rest_spec("deletePet")));

        let config = transformation_for(&snapshot, destination_of(&route)).unwrap().unwrap();
        assert!(config.request_transformation.is_none());
        assert!(config.response_transformation.is_some());
    }

    #[test]
    fn test_unknown_function_opts_out() {
        let snapshot = ApiSnapshot::from_yaml(SNAPSHOT).unwrap();
        let route = single(rest_spec("deletePet"));
        assert!(transformation_for(&snapshot, destination_of(&route)).unwrap().is_none());

        let plain = Destination::new(ResourceRef::new("default", "petstore"));
        assert!(transformation_for(&snapshot, &plain).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_process_route_without_validation() {
        let snapshot = ApiSnapshot::from_yaml(SNAPSHOT).unwrap();
        let route = single(rest_spec("findPetById"));
        let mut out = translate_route(&route, &snapshot).unwrap();

        let plugin: TransformationPlugin = TransformationPlugin::without_validation();
        plugin
            .process_route(&snapshot, &CancellationToken::new(), &route, &mut out)
            .await
            .unwrap();

        assert!(out.typed_per_filter_config.contains_key(FILTER_NAME));
        assert!(plugin.validation_cache().is_none());
    }

    #[tokio::test]
    async fn test_merges_with_existing_transformation() {
        let snapshot = ApiSnapshot::from_yaml(SNAPSHOT).unwrap();
        let route = single(rest_spec("findPetById"));
        let mut out = translate_route(&route, &snapshot).unwrap();

        let response_only = RouteTransformations::response(TransformationTemplate::from_spec(
            &TransformationTemplateSpec::default(),
            BTreeMap::new(),
        ));
        out.typed_per_filter_config.insert(
            FILTER_NAME.to_string(),
            any_from_message(ROUTE_TRANSFORMATIONS_TYPE_URL, &response_only),
        );

        let plugin: TransformationPlugin = TransformationPlugin::without_validation();
        plugin
            .process_route(&snapshot, &CancellationToken::new(), &route, &mut out)
            .await
            .unwrap();

        let merged: RouteTransformations = message_from_any(
            ROUTE_TRANSFORMATIONS_TYPE_URL,
            &out.typed_per_filter_config[FILTER_NAME],
        )
        .unwrap();
        assert!(merged.request_transformation.is_some());
        assert_eq!(merged.response_transformation, response_only.response_transformation);
    }

    #[tokio::test]
    async fn test_conflicting_transformation_leaves_route_untouched() {
        let snapshot = ApiSnapshot::from_yaml(SNAPSHOT).unwrap();
        let route = single(rest_spec("findPetById"));
        let mut out = translate_route(&route, &snapshot).unwrap();

        let other_request = RouteTransformations::request(TransformationTemplate::from_spec(
            &TransformationTemplateSpec::default(),
            BTreeMap::new(),
        ));
        out.typed_per_filter_config.insert(
            FILTER_NAME.to_string(),
            any_from_message(ROUTE_TRANSFORMATIONS_TYPE_URL, &other_request),
        );
        let before = out.clone();

        let plugin: TransformationPlugin = TransformationPlugin::without_validation();
        let err = plugin
            .process_route(&snapshot, &CancellationToken::new(), &route, &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, TranslatorError::DuplicateFilterConfig { .. }));
        assert_eq!(out, before);
    }

    #[test]
    fn test_from_config_honours_validation_switch() {
        let mut config = AppConfig::default();
        config.observability.enable_metrics = false;
        let plugin = TransformationPlugin::from_config(&config);
        let cache = plugin.validation_cache().expect("validation enabled by default");
        assert_eq!(cache.validator().binary(), "envoy");
        assert!(!cache.emits_metrics());

        config.validation.enabled = false;
        assert!(TransformationPlugin::from_config(&config).validation_cache().is_none());
    }
}
