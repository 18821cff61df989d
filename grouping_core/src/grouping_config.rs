//! Configuration for the role grouping core.
//!
//! Loaded from `grouping_config.json` with support for an environment
//! variable override. Unknown role or class names in the file are ignored
//! rather than rejected.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use bevy::prelude::Resource;
use serde::Deserialize;
use thiserror::Error;

use crate::roles::{Class, Role};

pub const BUILTIN_GROUPING_CONFIG: &str = include_str!("data/grouping_config.json");

/// Fixed column height shared by every projected layout group.
pub const UNITS_PER_COLUMN: u32 = 5;

/// Root configuration for the grouping core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Role assigned to each of the four ordered layout slots.
    pub slot_roles: Vec<String>,
    /// Classes whose healers are displayed with the melee group.
    pub melee_healer_classes: Vec<String>,
    /// When true, tank/healer assignments from the external authority
    /// override the computed role.
    pub prefer_assigned_role: bool,
    /// When true, a fifth layout slot collects pets.
    pub pet_group: bool,
    /// Upper bound on active players outside instances.
    pub raid_size_cap: u32,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            slot_roles: vec![
                "tank".to_string(),
                "melee".to_string(),
                "ranged".to_string(),
                "healer".to_string(),
            ],
            melee_healer_classes: Vec::new(),
            prefer_assigned_role: false,
            pet_group: false,
            raid_size_cap: 40,
        }
    }
}

/// Fallback slot assignment used when a configured role name is unknown.
const DEFAULT_SLOT_ROLES: [Role; 4] = [Role::Tank, Role::Melee, Role::Ranged, Role::Healer];

impl GroupingConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            serde_json::from_str(BUILTIN_GROUPING_CONFIG)
                .expect("builtin grouping config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, GroupingConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| GroupingConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = GroupingConfig::from_json_str(&contents)?;
        Ok(config)
    }

    /// Role for a layout slot (0-based). Unknown names fall back to the
    /// default assignment for that slot.
    pub fn slot_role(&self, slot: usize) -> Role {
        self.slot_roles
            .get(slot)
            .and_then(|name| Role::from_str(name).ok())
            .unwrap_or(DEFAULT_SLOT_ROLES[slot.min(DEFAULT_SLOT_ROLES.len() - 1)])
    }

    /// Number of layout slots, including the optional pet slot.
    pub fn slot_count(&self) -> usize {
        if self.pet_group {
            DEFAULT_SLOT_ROLES.len() + 1
        } else {
            DEFAULT_SLOT_ROLES.len()
        }
    }

    /// Whether healers of `class` are displayed with the melee group.
    /// Unrecognized class names in the configured set are ignored.
    pub fn is_melee_healer(&self, class: Class) -> bool {
        self.melee_healer_classes
            .iter()
            .filter_map(|name| Class::from_str(name).ok())
            .any(|configured| configured == class)
    }
}

#[derive(Debug, Error)]
pub enum GroupingConfigError {
    #[error("failed to parse grouping config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read grouping config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Handle for accessing the grouping configuration.
#[derive(Resource, Debug, Clone)]
pub struct GroupingConfigHandle(pub Arc<GroupingConfig>);

impl GroupingConfigHandle {
    pub fn new(config: Arc<GroupingConfig>) -> Self {
        Self(config)
    }

    pub fn get(&self) -> Arc<GroupingConfig> {
        Arc::clone(&self.0)
    }

    pub fn replace(&mut self, config: Arc<GroupingConfig>) {
        self.0 = config;
    }
}

/// Load grouping configuration from environment override or default path,
/// falling back to the builtin document.
pub fn load_grouping_config_from_env() -> Arc<GroupingConfig> {
    let override_path = env::var("GROUPING_CONFIG_PATH").ok().map(PathBuf::from);
    let default_path =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/grouping_config.json");

    let candidates: Vec<PathBuf> = match override_path {
        Some(ref path) => vec![path.clone()],
        None => vec![default_path.clone()],
    };

    for path in candidates {
        match GroupingConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "role_grid::config",
                    path = %path.display(),
                    "grouping_config.loaded=file"
                );
                return Arc::new(config);
            }
            Err(err) => {
                tracing::warn!(
                    target: "role_grid::config",
                    path = %path.display(),
                    error = %err,
                    "grouping_config.load_failed"
                );
            }
        }
    }

    let config = GroupingConfig::builtin();
    tracing::info!(target: "role_grid::config", "grouping_config.loaded=builtin");
    config
}
