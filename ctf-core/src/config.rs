//! Configuration for the CTF engine.
//!
//! Maps directly to `ctf.toml`. Every field has a default, so an empty file
//! (or no file at all) yields the stock rules.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CtfError, Result};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CtfConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Scoring and anti-abuse limits.
    #[serde(default)]
    pub rules: RulesConfig,
    /// Flag distribution settings.
    #[serde(default)]
    pub placement: PlacementConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Host-side settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl CtfConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `CtfError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| CtfError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject settings the engine cannot honour.
    ///
    /// # Errors
    /// Returns `CtfError::Config` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let p = &self.placement;
        if p.min_radius < 0 || p.furthest_centre < 0 {
            return Err(CtfError::Config("placement distances must not be negative".into()));
        }
        if p.min_radius > p.max_radius {
            return Err(CtfError::Config(format!(
                "placement.min_radius ({}) exceeds placement.max_radius ({})",
                p.min_radius, p.max_radius
            )));
        }
        if p.deploy_height < 0 || p.deploy_height >= p.world_height {
            return Err(CtfError::Config(format!(
                "placement.deploy_height ({}) must lie within the world (0..{})",
                p.deploy_height, p.world_height
            )));
        }
        if p.search_radius_cap < 0 {
            return Err(CtfError::Config("placement.search_radius_cap must not be negative".into()));
        }
        if self.rules.max_captures == 0 {
            return Err(CtfError::Config("rules.max_captures must be at least 1".into()));
        }
        if self.rules.capture_reward < 0 || self.rules.capture_penalty < 0 {
            return Err(CtfError::Config(format!(
                "rules.capture_reward ({}) and rules.capture_penalty ({}) must not be negative",
                self.rules.capture_reward, self.rules.capture_penalty
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit newline-delimited JSON logs instead of human-readable lines.
    #[serde(default)]
    pub log_json: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Scoring and capture limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Captures allowed per (capturing team, captured flag) per event.
    #[serde(default = "default_2")]
    pub max_captures: u32,
    /// Points the capturing team gains.
    #[serde(default = "default_20")]
    pub capture_reward: i32,
    /// Points the captured team loses.
    #[serde(default = "default_10")]
    pub capture_penalty: i32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_captures: 2,
            capture_reward: 20,
            capture_penalty: 10,
        }
    }
}

/// Flag distribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Maximum distance of the circle centre from spawn, per axis.
    #[serde(default = "default_500")]
    pub furthest_centre: i32,
    /// Smallest circle radius.
    #[serde(default = "default_100")]
    pub min_radius: i32,
    /// Largest circle radius.
    #[serde(default = "default_500")]
    pub max_radius: i32,
    /// Height the free-space search starts from.
    #[serde(default = "default_255")]
    pub deploy_height: i32,
    /// Give up placing a marker beyond this search distance.
    #[serde(default = "default_64")]
    pub search_radius_cap: i32,
    /// Exclusive upper bound on block heights.
    #[serde(default = "default_256")]
    pub world_height: i32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            furthest_centre: 500,
            min_radius: 100,
            max_radius: 500,
            deploy_height: 255,
            search_radius_cap: 64,
            world_height: 256,
        }
    }
}

/// Persistence / save configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Number of rotating backups to keep.
    #[serde(default = "default_3")]
    pub backup_count: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            wal_mode: true,
            backup_count: 3,
        }
    }
}

/// Host-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Permission level required to run the `ctf` command.
    #[serde(default = "default_permission")]
    pub command_permission_level: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command_permission_level: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_db_path() -> PathBuf { PathBuf::from("ctf.db") }
fn default_permission() -> u8 { 2 }
fn default_2() -> u32 { 2 }
fn default_3() -> u32 { 3 }
fn default_10() -> i32 { 10 }
fn default_20() -> i32 { 20 }
fn default_64() -> i32 { 64 }
fn default_100() -> i32 { 100 }
fn default_255() -> i32 { 255 }
fn default_256() -> i32 { 256 }
fn default_500() -> i32 { 500 }
