//! Out-of-process validation with the proxy binary.
//!
//! The filter config is wrapped into a minimal static bootstrap, written to
//! a temporary binary proto file and checked with `envoy --mode validate`.

use async_trait::async_trait;
use envoy_types::pb::envoy::config::bootstrap::v3::{bootstrap::StaticResources, Bootstrap};
use envoy_types::pb::envoy::config::core::v3::{
    address, socket_address, Address, Node, SocketAddress,
};
use envoy_types::pb::envoy::config::listener::v3::{filter, Filter, FilterChain, Listener};
use envoy_types::pb::envoy::config::route::v3::{RouteConfiguration, VirtualHost};
use envoy_types::pb::envoy::extensions::filters::http::router::v3::Router;
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_connection_manager::RouteSpecifier, http_filter, HttpConnectionManager, HttpFilter,
};
use envoy_types::pb::google::protobuf::Any;
use prost::Message;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use super::cache::{ConfigValidator, ValidationOutcome};
use crate::config::ValidationConfig;
use crate::errors::{Result, TranslatorError};
use crate::xds::filters::{any_from_message, FilterConfigArtifact};

pub const HTTP_CONNECTION_MANAGER_FILTER: &str = "envoy.filters.network.http_connection_manager";
const HTTP_CONNECTION_MANAGER_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager";
const ROUTER_FILTER: &str = "envoy.filters.http.router";
const ROUTER_TYPE_URL: &str = "type.googleapis.com/envoy.extensions.filters.http.router.v3.Router";

const PLACEHOLDER_PORT: u32 = 8081;

/// Static bootstrap carrying `config` as typed per-filter config on a
/// single catch-all virtual host.
pub fn bootstrap_from_filter(filter_name: &str, config: Any) -> Bootstrap {
    let virtual_host = VirtualHost {
        name: "placeholder_host".to_string(),
        domains: vec!["*".to_string()],
        typed_per_filter_config: HashMap::from([(filter_name.to_string(), config)]),
        ..Default::default()
    };

    let hcm = HttpConnectionManager {
        stat_prefix: "placeholder".to_string(),
        route_specifier: Some(RouteSpecifier::RouteConfig(RouteConfiguration {
            virtual_hosts: vec![virtual_host],
            ..Default::default()
        })),
        http_filters: vec![HttpFilter {
            name: ROUTER_FILTER.to_string(),
            config_type: Some(http_filter::ConfigType::TypedConfig(any_from_message(
                ROUTER_TYPE_URL,
                &Router::default(),
            ))),
            ..Default::default()
        }],
        ..Default::default()
    };

    let listener = Listener {
        name: "placeholder_listener".to_string(),
        address: Some(Address {
            address: Some(address::Address::SocketAddress(SocketAddress {
                address: "0.0.0.0".to_string(),
                port_specifier: Some(socket_address::PortSpecifier::PortValue(PLACEHOLDER_PORT)),
                ..Default::default()
            })),
        }),
        filter_chains: vec![FilterChain {
            name: "placeholder_filter_chain".to_string(),
            filters: vec![Filter {
                name: HTTP_CONNECTION_MANAGER_FILTER.to_string(),
                config_type: Some(filter::ConfigType::TypedConfig(any_from_message(
                    HTTP_CONNECTION_MANAGER_TYPE_URL,
                    &hcm,
                ))),
            }],
            ..Default::default()
        }],
        ..Default::default()
    };

    Bootstrap {
        node: Some(Node {
            id: "validation-node-id".to_string(),
            cluster: "validation-cluster".to_string(),
            ..Default::default()
        }),
        static_resources: Some(StaticResources {
            listeners: vec![listener],
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Runs the proxy binary in validate mode
#[derive(Debug, Clone)]
pub struct EnvoyValidator {
    binary: String,
}

impl EnvoyValidator {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.envoy_binary.clone())
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

#[async_trait]
impl ConfigValidator for EnvoyValidator {
    type Artifact = FilterConfigArtifact;

    async fn validate(&self, artifact: &FilterConfigArtifact) -> Result<ValidationOutcome> {
        let bootstrap = bootstrap_from_filter(&artifact.filter_name, artifact.config.clone());

        let file = tempfile::Builder::new()
            .prefix("routeweave-bootstrap-")
            .suffix(".pb")
            .tempfile()
            .map_err(|e| TranslatorError::io(e, "failed to create bootstrap file"))?;
        tokio::fs::write(file.path(), bootstrap.encode_to_vec())
            .await
            .map_err(|e| TranslatorError::io(e, "failed to write bootstrap file"))?;

        debug!(
            binary = %self.binary,
            filter = %artifact.filter_name,
            path = %file.path().display(),
            "running proxy config validation"
        );

        let output = Command::new(&self.binary)
            .arg("--mode")
            .arg("validate")
            .arg("-c")
            .arg(file.path())
            .arg("-l")
            .arg("critical")
            .arg("--log-format")
            .arg("%v")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TranslatorError::validator_invocation(
                    format!("failed to run '{}'", self.binary),
                    Some(Box::new(e)),
                )
            })?;

        if output.status.success() {
            return Ok(ValidationOutcome::Accepted);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let reason = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|text| !text.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("validation failed with {}", output.status));

        warn!(filter = %artifact.filter_name, reason = %reason, "proxy rejected filter config");
        Ok(ValidationOutcome::Rejected(reason))
    }
}
