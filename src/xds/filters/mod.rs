//! Filter configuration helpers.
//!
//! Per-route filter configuration travels to the proxy as
//! `google.protobuf.Any` values keyed by filter name. This module holds the
//! helpers for building and reading those values and the artifact type that
//! is handed to the validation cache.
//!
//! # Available Filters
//!
//! - **Transformation** (`io.solo.transformation`): request/response
//!   templating with header and path extraction

pub mod transformation;

use envoy_types::pb::google::protobuf::Any;
use prost::Message;
use sha2::{Digest, Sha256};

use crate::errors::{Result, TranslatorError};
use crate::validation::{hash::truncate_digest, ContentHash};

/// Helper for building Envoy `Any` values from prost messages.
pub fn any_from_message<M: Message>(type_url: impl Into<String>, msg: &M) -> Any {
    Any { type_url: type_url.into(), value: msg.encode_to_vec() }
}

/// Decode an `Any` back into `M`, checking the type URL first.
pub fn message_from_any<M: Message + Default>(type_url: &str, any: &Any) -> Result<M> {
    if any.type_url != type_url {
        return Err(TranslatorError::internal(format!(
            "expected filter config of type '{}', found '{}'",
            type_url, any.type_url
        )));
    }
    M::decode(any.value.as_slice()).map_err(|e| {
        TranslatorError::internal(format!("failed to decode '{}': {}", type_url, e))
    })
}

/// A filter configuration destined for one attachment point, as submitted to
/// proxy-side validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfigArtifact {
    pub filter_name: String,
    pub config: Any,
}

impl FilterConfigArtifact {
    pub fn new(filter_name: impl Into<String>, config: Any) -> Self {
        Self { filter_name: filter_name.into(), config }
    }
}

impl ContentHash for FilterConfigArtifact {
    /// SHA-256 over filter name, type URL and encoded payload, truncated to 64 bits.
    fn content_hash(&self) -> Result<u64> {
        let mut hasher = Sha256::new();
        hasher.update(self.filter_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.config.type_url.as_bytes());
        hasher.update([0u8]);
        hasher.update(&self.config.value);
        truncate_digest(&hasher.finalize())
    }
}
