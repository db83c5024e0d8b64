//! Tool config file loader
//!
//! Loads the optional YAML config file carrying site defaults and
//! user-defined flavors. A missing file yields the built-in defaults;
//! a file that exists but does not parse is fatal.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info};

use crate::ProvisionError;
use crate::flavor::Flavor;

/// Parsed tool config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Site-wide defaults, each optional
    pub defaults: ToolDefaults,

    /// Extra flavors; a flavor named like a built-in replaces it
    pub flavors: BTreeMap<String, Flavor>,
}

/// Site-wide default settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolDefaults {
    /// VM memory in MiB
    pub memory: Option<u32>,

    /// Virtual CPU count
    pub vcpus: Option<u32>,

    /// Primary disk size in GB
    pub disk_size: Option<u32>,

    /// Bridge for the VM network interface
    pub bridge: Option<String>,

    /// Flavor used when none is given on the command line
    pub flavor: Option<String>,

    /// Directory flavor template names are resolved against
    pub template_dir: Option<PathBuf>,
}

/// Load the tool config from a single file
pub async fn load_tool_config(path: impl AsRef<Path>) -> Result<ToolConfig, ProvisionError> {
    let path = path.as_ref();

    if !path.exists() {
        debug!("No config file at {}, using built-in defaults", path.display());
        return Ok(ToolConfig::default());
    }

    let content = fs::read_to_string(path).await?;
    let config: ToolConfig = serde_yaml::from_str(&content)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}
