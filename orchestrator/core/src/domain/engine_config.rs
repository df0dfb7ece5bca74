// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Engine Configuration Types
//
// Defines the configuration schema for the template parameterization engine:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Location of extracted VNF packages
// - Userdata strategy used when a request names none
// - Stack creation timeout and log level

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "100monkeys.ai/v1";
pub const KIND: &str = "VnfmConfig";

/// Class name of the anonymous (capacity-only) strategy
pub const DEFAULT_USERDATA_CLASS: &str = "DefaultUserData";
/// Class name of the indexed strategy
pub const STANDARD_USERDATA_CLASS: &str = "StandardUserData";

/// Strategies compiled into the engine
pub const BUILTIN_USERDATA_CLASSES: [&str; 2] = [DEFAULT_USERDATA_CLASS, STANDARD_USERDATA_CLASS];

/// Top-level Kubernetes-style engine configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfigManifest {
    /// API version (must be "100monkeys.ai/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "VnfmConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: EngineConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Engine configuration specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfigSpec {
    /// Directory holding extracted VNF packages, one sub-directory per vnfd id
    #[serde(default = "default_csar_root")]
    pub csar_root: PathBuf,

    /// Userdata class used when a request does not select one
    #[serde(default = "default_userdata")]
    pub default_userdata: String,

    /// Passed to the backend as the stack timeout
    #[serde(default = "default_stack_create_timeout")]
    pub stack_create_timeout_mins: u32,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_csar_root() -> PathBuf {
    PathBuf::from("/var/lib/vnfm/csar")
}

fn default_userdata() -> String {
    DEFAULT_USERDATA_CLASS.to_string()
}

fn default_stack_create_timeout() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for EngineConfigSpec {
    fn default() -> Self {
        Self {
            csar_root: default_csar_root(),
            default_userdata: default_userdata(),
            stack_create_timeout_mins: default_stack_create_timeout(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "vnfm".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: EngineConfigSpec::default(),
        }
    }
}

impl EngineConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. VNFM_CONFIG_PATH environment variable
    /// 2. ./vnfm-config.yaml (working directory)
    /// 3. ~/.vnfm/config.yaml (user home)
    /// 4. /etc/vnfm/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("VNFM_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./vnfm-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".vnfm").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/vnfm/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must load
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VNFM_CSAR_ROOT") {
            if val.trim().is_empty() {
                tracing::warn!("Ignoring empty VNFM_CSAR_ROOT");
            } else {
                tracing::info!("Environment override: VNFM_CSAR_ROOT={}", val);
                self.spec.csar_root = PathBuf::from(val);
            }
        }
    }

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

        if !BUILTIN_USERDATA_CLASSES.contains(&self.spec.default_userdata.as_str()) {
            anyhow::bail!(
                "Unknown spec.default_userdata '{}'. Expected one of: {}",
                self.spec.default_userdata,
                BUILTIN_USERDATA_CLASSES.join(", ")
            );
        }

        if self.spec.stack_create_timeout_mins == 0 {
            anyhow::bail!("spec.stack_create_timeout_mins must be greater than 0");
        }

        Ok(())
    }
}
