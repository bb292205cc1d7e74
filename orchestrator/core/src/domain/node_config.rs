// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Fleet Configuration Types
//
// Defines the configuration schema for the check dispatcher, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - The static agent node fleet
// - Dispatch pool sizing and per-call timeout
// - Network and observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

pub const API_VERSION: &str = "fleetcheck.io/v1";
pub const KIND: &str = "FleetConfig";
pub const CONFIG_PATH_ENV: &str = "FLEETCHECK_CONFIG_PATH";

/// Top-level Kubernetes-style fleet configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// API version (must be "fleetcheck.io/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "FleetConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: FleetConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable dispatcher name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Configuration specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfigSpec {
    pub fleet: FleetSpec,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetSpec {
    /// Ordered, static list of agent nodes. In production this would come
    /// from a membership service; here it is fixed for the process lifetime.
    pub nodes: Vec<AgentNode>,
}

/// A fleet member able to evaluate checks locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentNode {
    /// Label reported in check results (e.g. "Machine-9000")
    pub label: String,

    /// Base URL of the agent (e.g. "http://127.0.0.1:9000/")
    pub address: String,
}

impl AgentNode {
    pub fn new(label: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            address: address.into(),
        }
    }

    /// Resolve a kind-specific endpoint against this node's base address.
    ///
    /// The base is treated as a directory even without a trailing slash, so
    /// `http://host:9000/agent` + `does-exist` gives `/agent/does-exist`.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        let mut base = Url::parse(&self.address)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(endpoint)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum number of remote calls in flight across the whole process.
    /// Keep well below the open file descriptor limit.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Buffered jobs waiting for a free worker before submitters block
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Per-call timeout in seconds. Expiry is classified as unreachable.
    /// Unset means each call runs to completion or transport failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prometheus scrape port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    64
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

/// The four local machines of the reference deployment.
fn default_nodes() -> Vec<AgentNode> {
    (9000..=9003)
        .map(|port| {
            AgentNode::new(
                format!("Machine-{}", port),
                format!("http://127.0.0.1:{}/", port),
            )
        })
        .collect()
}

impl Default for FleetConfigSpec {
    fn default() -> Self {
        Self {
            fleet: FleetSpec {
                nodes: default_nodes(),
            },
            dispatch: DispatchConfig::default(),
            network: NetworkConfig::default(),
            observability: None,
        }
    }
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "fleetcheck-dispatcher".to_string(),
                version: Some("1.0.0".to_string()),
            },
            spec: FleetConfigSpec::default(),
        }
    }
}

impl FleetConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn nodes(&self) -> &[AgentNode] {
        &self.spec.fleet.nodes
    }

    /// Discover configuration file using precedence order
    /// 1. FLEETCHECK_CONFIG_PATH environment variable
    /// 2. ./fleetcheck-config.yaml (working directory)
    /// 3. ~/.fleetcheck/config.yaml (user home)
    /// 4. /etc/fleetcheck/config.yaml (Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./fleetcheck-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".fleetcheck").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/fleetcheck/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails hard when missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using built-in fleet.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FLEETCHECK_WORKERS") {
            match val.parse::<usize>() {
                Ok(workers) => {
                    tracing::info!("Environment override: FLEETCHECK_WORKERS={}", workers);
                    self.spec.dispatch.workers = workers;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for FLEETCHECK_WORKERS: '{}'. Expected a positive integer. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(val) = std::env::var("FLEETCHECK_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: FLEETCHECK_PORT={}", port);
                    self.spec.network.port = port;
                }
                Err(_) => {
                    tracing::warn!("Invalid value for FLEETCHECK_PORT: '{}'. Ignoring.", val);
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.dispatch.workers == 0 {
            anyhow::bail!("spec.dispatch.workers must be at least 1");
        }

        if self.spec.dispatch.queue_capacity == 0 {
            anyhow::bail!("spec.dispatch.queue_capacity must be at least 1");
        }

        if self.spec.fleet.nodes.is_empty() {
            anyhow::bail!("spec.fleet.nodes must list at least one agent node");
        }

        let mut labels = HashSet::new();
        for node in &self.spec.fleet.nodes {
            if node.label.is_empty() {
                anyhow::bail!("Agent node label cannot be empty (address: {})", node.address);
            }

            if !labels.insert(node.label.as_str()) {
                anyhow::bail!("Duplicate agent node label: {}", node.label);
            }

            let url = Url::parse(&node.address).map_err(|e| {
                anyhow::anyhow!("Invalid address for node {}: {} ({})", node.label, node.address, e)
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                anyhow::bail!(
                    "Node {} address must use http or https, got '{}'",
                    node.label,
                    url.scheme()
                );
            }
        }

        Ok(())
    }
}
