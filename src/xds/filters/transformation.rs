//! Transformation filter configuration.
//!
//! Messages for the `io.solo.transformation` HTTP filter. Map fields use
//! `BTreeMap` so that encoding, and therefore the content hash used by the
//! validation cache, is stable for equal configurations.

use prost::{Message, Oneof};
use std::collections::BTreeMap;

use crate::domain::TransformationTemplateSpec;
use crate::errors::{Result, TranslatorError};

/// Filter name used for `typed_per_filter_config`
pub const FILTER_NAME: &str = "io.solo.transformation";

/// Type URL of [`RouteTransformations`]
pub const ROUTE_TRANSFORMATIONS_TYPE_URL: &str =
    "type.googleapis.com/envoy.api.v2.filter.http.RouteTransformations";

/// Pull one value out of a header via a regex capture group
#[derive(Clone, PartialEq, Eq, Message)]
pub struct Extraction {
    #[prost(string, tag = "1")]
    pub header: String,
    #[prost(string, tag = "2")]
    pub regex: String,
    #[prost(uint32, tag = "3")]
    pub subgroup: u32,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct InjaTemplate {
    #[prost(string, tag = "1")]
    pub text: String,
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct Passthrough {}

#[derive(Clone, PartialEq, Eq, Oneof)]
pub enum BodyTransformation {
    #[prost(message, tag = "4")]
    Body(InjaTemplate),
    #[prost(message, tag = "5")]
    Passthrough(Passthrough),
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct TransformationTemplate {
    #[prost(btree_map = "string, message", tag = "2")]
    pub extractors: BTreeMap<String, Extraction>,
    #[prost(btree_map = "string, message", tag = "3")]
    pub headers: BTreeMap<String, InjaTemplate>,
    #[prost(oneof = "BodyTransformation", tags = "4, 5")]
    pub body_transformation: Option<BodyTransformation>,
}

impl TransformationTemplate {
    /// Render a user template spec together with the extractors built for the route.
    pub fn from_spec(spec: &TransformationTemplateSpec, extractors: BTreeMap<String, Extraction>) -> Self {
        let headers = spec
            .headers
            .iter()
            .map(|(name, text)| (name.clone(), InjaTemplate { text: text.clone() }))
            .collect();

        let body_transformation = Some(match &spec.body {
            Some(text) => BodyTransformation::Body(InjaTemplate { text: text.clone() }),
            None => BodyTransformation::Passthrough(Passthrough {}),
        });

        Self { extractors, headers, body_transformation }
    }
}

#[derive(Clone, PartialEq, Eq, Message)]
pub struct Transformation {
    #[prost(message, optional, tag = "1")]
    pub transformation_template: Option<TransformationTemplate>,
}

/// Per-route (or per-cluster-weight) transformation config
#[derive(Clone, PartialEq, Eq, Message)]
pub struct RouteTransformations {
    #[prost(message, optional, tag = "1")]
    pub request_transformation: Option<Transformation>,
    #[prost(message, optional, tag = "2")]
    pub response_transformation: Option<Transformation>,
    #[prost(bool, tag = "3")]
    pub clear_route_cache: bool,
}

impl RouteTransformations {
    /// Config that applies `template` to requests
    pub fn request(template: TransformationTemplate) -> Self {
        Self::default().with_request(Some(template))
    }

    /// Config that applies `template` to responses
    pub fn response(template: TransformationTemplate) -> Self {
        Self::default().with_response(Some(template))
    }

    pub fn with_request(mut self, template: Option<TransformationTemplate>) -> Self {
        self.request_transformation =
            template.map(|t| Transformation { transformation_template: Some(t) });
        self
    }

    pub fn with_response(mut self, template: Option<TransformationTemplate>) -> Self {
        self.response_transformation =
            template.map(|t| Transformation { transformation_template: Some(t) });
        self
    }

    /// Fold `other` into `self`.
    ///
    /// Each direction holds one transformation: a direction `self` leaves
    /// empty takes the one from `other`, an identical one is kept, and two
    /// different ones for the same direction are a conflict. On conflict
    /// `self` is unchanged.
    pub fn merge(&mut self, other: RouteTransformations, location: &str) -> Result<()> {
        let directions = [
            ("request", &self.request_transformation, &other.request_transformation),
            ("response", &self.response_transformation, &other.response_transformation),
        ];
        for (direction, current, incoming) in directions {
            if let (Some(current), Some(incoming)) = (current, incoming) {
                if current != incoming {
                    return Err(TranslatorError::duplicate_filter_config(
                        FILTER_NAME,
                        format!("{} ({} transformation)", location, direction),
                    ));
                }
            }
        }

        if self.request_transformation.is_none() {
            self.request_transformation = other.request_transformation;
        }
        if self.response_transformation.is_none() {
            self.response_transformation = other.response_transformation;
        }
        self.clear_route_cache |= other.clear_route_cache;
        Ok(())
    }
}
