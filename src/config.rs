//! Configuration management for the data architecture
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (datarch.toml)
//! - Environment variables (DATARCH__*)
//!
//! ## Example config file (datarch.toml):
//! ```toml
//! base_path = "./data_architecture"
//! enable_governance = true
//! enable_integration = true
//! enable_metadata = true
//! quality_threshold = 0.85
//! compliance_frameworks = ["GDPR", "HIPAA"]
//! default_retention_policy = "7_years"
//! strict_integrity = true
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ArchError, Result};
use crate::governance::ComplianceFramework;

/// Orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitectureConfig {
    /// Root directory for all managers
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    #[serde(default = "default_true")]
    pub enable_governance: bool,

    #[serde(default = "default_true")]
    pub enable_integration: bool,

    #[serde(default = "default_true")]
    pub enable_metadata: bool,

    /// Run registered discoverers on system registration
    #[serde(default = "default_true")]
    pub auto_discovery: bool,

    /// Minimum acceptable overall quality score
    #[serde(default = "default_quality_threshold")]
    pub quality_threshold: f64,

    /// Framework names, e.g. "GDPR"; unknown names are skipped
    #[serde(default = "default_frameworks")]
    pub compliance_frameworks: Vec<String>,

    #[serde(default = "default_retention_policy")]
    pub default_retention_policy: String,

    #[serde(default = "default_true")]
    pub encryption_required: bool,

    /// Fail schema reads whose hash does not match
    #[serde(default)]
    pub strict_integrity: bool,

    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./data_architecture")
}

fn default_true() -> bool {
    true
}

fn default_quality_threshold() -> f64 {
    0.8
}

fn default_frameworks() -> Vec<String> {
    vec!["GDPR".to_string(), "SOC2".to_string()]
}

fn default_retention_policy() -> String {
    "7_years".to_string()
}

fn default_search_limit() -> usize {
    20
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            enable_governance: true,
            enable_integration: true,
            enable_metadata: true,
            auto_discovery: true,
            quality_threshold: default_quality_threshold(),
            compliance_frameworks: default_frameworks(),
            default_retention_policy: default_retention_policy(),
            encryption_required: true,
            strict_integrity: false,
            search_limit: default_search_limit(),
        }
    }
}

impl ArchitectureConfig {
    /// Default configuration rooted at `base_path`
    pub fn at(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Self::default()
        }
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        for location in ["datarch.toml", ".datarch.toml", "config/datarch.toml"] {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "data-architecture", "datarch") {
            let xdg_config = dirs.config_dir().join("datarch.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("DATARCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("compliance_frameworks"),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ArchError::Internal(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Configured frameworks that are recognized
    pub fn frameworks(&self) -> Vec<ComplianceFramework> {
        self.compliance_frameworks
            .iter()
            .filter_map(|name| match name.parse::<ComplianceFramework>() {
                Ok(framework) => Some(framework),
                Err(_) => {
                    tracing::warn!(framework = %name, "Skipping unknown compliance framework");
                    None
                }
            })
            .collect()
    }

    /// Resolve the base path against the current directory
    pub fn resolved_base_path(&self) -> PathBuf {
        if self.base_path.is_absolute() {
            self.base_path.clone()
        } else {
            std::env::current_dir().unwrap_or_default().join(&self.base_path)
        }
    }
}
