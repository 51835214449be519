//! New-game configuration, loadable from RON, TOML or JSON.
//!
//! The format is picked from the file extension. Every field has a
//! default, so an empty file (or [`GameConfig::default`]) describes the
//! standard game.

use std::path::{Path, PathBuf};

use gridforge_core::fixed::{Fixed64, MAX_UNITS, f64_to_fixed64};
use gridforge_core::id::Resource;
use gridforge_core::ledger::ResourceLedger;
use gridforge_research::{DEFAULT_COOLDOWN_SECS, ResearchController, ResearchError, Tier, standard_tiers};
use gridforge_spatial::GridPosition;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file has an extension we don't support.
    #[error("unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("parse error in {}: {detail}", file.display())]
    Parse { file: PathBuf, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid research tiers: {0}")]
    Tiers(#[from] ResearchError),

    #[error("research cooldown must be a finite, non-negative number of seconds, got {0}")]
    InvalidCooldown(f64),

    #[error("{resource:?} amount {amount} exceeds the largest supported amount ({MAX_UNITS})")]
    AmountTooLarge { resource: Resource, amount: u32 },
}

// ===========================================================================
// Format detection
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a config file from its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn parse<T: DeserializeOwned>(content: &str, format: Format, file: &Path) -> Result<T, ConfigError> {
    let parse_err = |detail: String| ConfigError::Parse {
        file: file.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

// ===========================================================================
// GameConfig
// ===========================================================================

/// A whole-unit starting amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingAmount {
    pub resource: Resource,
    pub amount: u32,
}

/// Everything needed to start (or reset to) a new game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub starting_resources: Vec<StartingAmount>,
    pub starting_discovered: Vec<Resource>,
    pub research_cooldown_secs: f64,
    /// Replaces the standard tier table when set.
    pub tiers: Option<Vec<Tier>>,
    /// Where the camera starts and returns to on reset.
    pub spawn: GridPosition,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_resources: vec![StartingAmount {
                resource: Resource::Iron,
                amount: 8,
            }],
            starting_discovered: vec![Resource::Iron],
            research_cooldown_secs: DEFAULT_COOLDOWN_SECS as f64,
            tiers: None,
            spawn: GridPosition::new(0, 0),
        }
    }
}

impl GameConfig {
    /// Load from a `.ron`, `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = parse(&content, format, path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from an in-memory string.
    pub fn from_str_as(content: &str, format: Format) -> Result<Self, ConfigError> {
        let config: Self = parse(content, format, Path::new("<inline>"))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the cooldown, the amounts and the tier table without
    /// building anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.research_cooldown()?;
        let starting = self.starting_resources.iter().map(|s| (s.resource, s.amount));
        let required = self
            .tiers
            .iter()
            .flatten()
            .flat_map(|t| t.requirements.iter().copied());
        for (resource, amount) in starting.chain(required) {
            if amount > MAX_UNITS {
                return Err(ConfigError::AmountTooLarge { resource, amount });
            }
        }
        self.research_controller()?;
        Ok(())
    }

    pub fn research_cooldown(&self) -> Result<Fixed64, ConfigError> {
        let secs = self.research_cooldown_secs;
        if !secs.is_finite() || secs < 0.0 {
            return Err(ConfigError::InvalidCooldown(secs));
        }
        Ok(f64_to_fixed64(secs))
    }

    /// The ledger a new game starts with.
    pub fn starting_ledger(&self) -> ResourceLedger {
        let mut ledger = ResourceLedger::new();
        for start in &self.starting_resources {
            ledger.credit_units(start.resource, start.amount);
        }
        for &resource in &self.starting_discovered {
            ledger.discover(resource);
        }
        ledger
    }

    /// A level-0 research controller over the configured tiers.
    pub fn research_controller(&self) -> Result<ResearchController, ConfigError> {
        let tiers = self.tiers.clone().unwrap_or_else(standard_tiers);
        Ok(ResearchController::new(tiers, self.research_cooldown()?)?)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
