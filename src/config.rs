//! Configuration for the tonezone engine
//!
//! Zone records arrive fully formed: country code, description, ring cadence
//! integers, tone-kind to pattern-text mapping, and the four calibration
//! levels. Loading is TOML from a file, environment variables with a
//! `TONEZONE_` prefix, or the builtin zone table.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cadence::pattern::{RingCadence, ToneKind};
use crate::levels::CalibrationLevels;
use crate::zonedata;
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneZoneConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub zones: Vec<ZoneConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Country code whose patterns back `resolve_with_fallback`
    pub default_zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "compact")]
    Compact,
    #[serde(rename = "full")]
    Full,
}

/// One zone record as supplied by configuration. Pattern texts are kept as
/// strings here; the registry parses and caches them at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// Stable numeric zone id, non-negative
    pub id: i32,
    /// Short lowercase country code, unique across the table
    pub country: String,
    pub description: String,
    /// Alternating ring-active/ring-silent durations in milliseconds
    pub ring_cadence: Vec<u32>,
    /// Cadence pattern text per tone kind; kinds may be absent
    pub tones: Vec<ToneDef>,
    #[serde(default)]
    pub levels: CalibrationLevels,
}

/// One tone kind's pattern text within a zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToneDef {
    pub kind: ToneKind,
    pub pattern: String,
}

impl ToneZoneConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ToneZoneConfig = toml::from_str(&contents)
            .map_err(|e| Error::parse(format!("Invalid TOML: {}", e)))?;
        Ok(config)
    }

    pub fn load_from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("TONEZONE").separator("_"))
            .build()?;
        let config = settings.try_deserialize()?;
        Ok(config)
    }

    /// Builtin zone table with US patterns as the fallback zone
    pub fn default_config() -> Self {
        Self {
            general: GeneralConfig {
                default_zone: "us".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
                format: LogFormat::Full,
            },
            zones: zonedata::builtin_zones(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.zones.is_empty() {
            return Err(Error::configuration("No zones configured"));
        }

        if !self
            .zones
            .iter()
            .any(|z| z.country == self.general.default_zone)
        {
            return Err(Error::configuration(format!(
                "Default zone '{}' is not in the zone table",
                self.general.default_zone
            )));
        }

        for zone in &self.zones {
            zone.validate()?;
        }

        Ok(())
    }
}

impl ZoneConfig {
    pub fn validate(&self) -> Result<()> {
        if self.id < 0 {
            return Err(Error::configuration(format!(
                "Zone '{}' has negative id {}",
                self.country, self.id
            )));
        }

        if self.country.is_empty() {
            return Err(Error::configuration("Zone with empty country code"));
        }

        if self
            .country
            .chars()
            .any(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-')
        {
            return Err(Error::configuration(format!(
                "Country code '{}' is not a short lowercase identifier",
                self.country
            )));
        }

        RingCadence::new(self.ring_cadence.clone()).map_err(|e| {
            Error::configuration(format!("Zone '{}': {}", self.country, e))
        })?;

        if self.tones.is_empty() {
            return Err(Error::configuration(format!(
                "Zone '{}' defines no tones",
                self.country
            )));
        }

        let mut seen = BTreeSet::new();
        for def in &self.tones {
            if !seen.insert(def.kind) {
                return Err(Error::configuration(format!(
                    "Zone '{}' defines {} twice",
                    self.country, def.kind
                )));
            }
        }

        Ok(())
    }
}
