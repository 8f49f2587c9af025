//! Tone zone registry
//!
//! Built once from configuration, immutable afterwards, and safe to share
//! across lines without locking. Construction validates uniqueness of
//! country codes and zone ids and parses every cadence pattern up front, so
//! bad zone data fails fast instead of surfacing mid-call. Parse results are
//! cached by source text; many zones share pattern strings verbatim.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cadence::parser::parse;
use crate::cadence::pattern::{CadencePattern, RingCadence, ToneKind};
use crate::config::{ToneZoneConfig, ZoneConfig};
use crate::levels::{self, CalibrationLevels};
use crate::{Error, Result};

/// One country's tone, cadence, and level definitions with all patterns
/// parsed and ready for playback.
#[derive(Debug)]
pub struct ToneZone {
    pub id: i32,
    pub country: String,
    pub description: String,
    pub ring_cadence: RingCadence,
    tones: BTreeMap<ToneKind, Arc<CadencePattern>>,
    pub levels: CalibrationLevels,
}

impl ToneZone {
    /// The pattern for a tone kind, if this zone specifies one
    pub fn tone(&self, kind: ToneKind) -> Option<Arc<CadencePattern>> {
        self.tones.get(&kind).cloned()
    }

    pub fn tone_kinds(&self) -> impl Iterator<Item = ToneKind> + '_ {
        self.tones.keys().copied()
    }

    /// Transmit level for a frequency set under this zone's calibration
    pub fn level_for(&self, frequencies: &[u32]) -> i32 {
        levels::level_for(&self.levels, frequencies)
    }
}

/// Immutable zone lookup table
pub struct ToneZoneRegistry {
    zones: Vec<Arc<ToneZone>>,
    by_country: HashMap<String, usize>,
    by_id: HashMap<i32, usize>,
    default_zone: String,
}

impl ToneZoneRegistry {
    /// Build from a validated configuration. Fails fast on duplicate
    /// country codes or zone ids and on any unparsable pattern.
    pub fn build(config: &ToneZoneConfig) -> Result<Self> {
        config.validate()?;
        Self::from_zones(&config.zones, &config.general.default_zone)
    }

    /// Registry over the builtin zone table with the US zone as fallback
    pub fn builtin() -> Result<Self> {
        Self::build(&ToneZoneConfig::default_config())
    }

    fn from_zones(zone_configs: &[ZoneConfig], default_zone: &str) -> Result<Self> {
        let mut zones = Vec::with_capacity(zone_configs.len());
        let mut by_country = HashMap::new();
        let mut by_id = HashMap::new();
        let mut pattern_cache: HashMap<String, Arc<CadencePattern>> = HashMap::new();
        let mut cache_hits = 0usize;

        for config in zone_configs {
            let index = zones.len();

            if by_country.insert(config.country.clone(), index).is_some() {
                return Err(Error::configuration(format!(
                    "Duplicate country code '{}'",
                    config.country
                )));
            }
            if by_id.insert(config.id, index).is_some() {
                return Err(Error::configuration(format!(
                    "Duplicate zone id {} ('{}')",
                    config.id, config.country
                )));
            }

            let mut tones = BTreeMap::new();
            for def in &config.tones {
                let pattern = match pattern_cache.get(&def.pattern) {
                    Some(cached) => {
                        cache_hits += 1;
                        Arc::clone(cached)
                    }
                    None => {
                        let parsed = parse(&def.pattern).map_err(|e| {
                            Error::configuration(format!(
                                "Zone '{}' {}: {}",
                                config.country, def.kind, e
                            ))
                        })?;
                        let parsed = Arc::new(parsed);
                        pattern_cache.insert(def.pattern.clone(), Arc::clone(&parsed));
                        parsed
                    }
                };
                tones.insert(def.kind, pattern);
            }

            zones.push(Arc::new(ToneZone {
                id: config.id,
                country: config.country.clone(),
                description: config.description.clone(),
                ring_cadence: RingCadence::new(config.ring_cadence.clone())?,
                tones,
                levels: config.levels,
            }));
        }

        if !by_country.contains_key(default_zone) {
            return Err(Error::configuration(format!(
                "Default zone '{}' is not in the zone table",
                default_zone
            )));
        }

        info!(
            zones = zones.len(),
            unique_patterns = pattern_cache.len(),
            cache_hits,
            "Tone zone registry built"
        );

        Ok(Self {
            zones,
            by_country,
            by_id,
            default_zone: default_zone.to_string(),
        })
    }

    pub fn lookup_country(&self, country: &str) -> Option<Arc<ToneZone>> {
        self.by_country
            .get(country)
            .map(|&i| Arc::clone(&self.zones[i]))
    }

    pub fn lookup_id(&self, id: i32) -> Option<Arc<ToneZone>> {
        self.by_id.get(&id).map(|&i| Arc::clone(&self.zones[i]))
    }

    pub fn all_zones(&self) -> impl Iterator<Item = &Arc<ToneZone>> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn default_zone(&self) -> &str {
        &self.default_zone
    }

    /// The pattern a zone plays for a tone kind. A zone without that kind
    /// yields `Error::NotSpecified`; callers choose the fallback policy.
    pub fn resolve_tone(&self, zone: &ToneZone, kind: ToneKind) -> Result<Arc<CadencePattern>> {
        zone.tone(kind)
            .ok_or_else(|| Error::not_specified(zone.country.clone(), kind))
    }

    /// Resolve a tone for a country, falling back to the default zone's
    /// pattern when the country's zone does not specify the kind.
    pub fn resolve_with_fallback(
        &self,
        country: &str,
        kind: ToneKind,
    ) -> Result<Arc<CadencePattern>> {
        let zone = self
            .lookup_country(country)
            .ok_or_else(|| Error::configuration(format!("Unknown zone '{}'", country)))?;

        match self.resolve_tone(&zone, kind) {
            Ok(pattern) => Ok(pattern),
            Err(Error::NotSpecified { .. }) => {
                debug!(
                    country,
                    kind = %kind,
                    fallback = %self.default_zone,
                    "Tone not specified, using default zone"
                );
                let fallback = self
                    .lookup_country(&self.default_zone)
                    .ok_or_else(|| Error::internal("Default zone vanished from registry"))?;
                self.resolve_tone(&fallback, kind)
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneralConfig;
    use crate::zonedata::builtin_zones;

    fn registry() -> ToneZoneRegistry {
        ToneZoneRegistry::builtin().unwrap()
    }

    fn config_with_zones(zones: Vec<ZoneConfig>) -> ToneZoneConfig {
        let mut config = ToneZoneConfig::default_config();
        config.general = GeneralConfig {
            default_zone: zones[0].country.clone(),
        };
        config.zones = zones;
        config
    }

    #[test]
    fn test_lookup_by_country_and_id() {
        let registry = registry();

        let us = registry.lookup_country("us").unwrap();
        assert_eq!(us.id, 0);
        assert_eq!(us.description, "United States / North America");

        let uk = registry.lookup_id(4).unwrap();
        assert_eq!(uk.country, "uk");
        assert_eq!(uk.ring_cadence.steps(), &[400, 200, 400, 2000]);

        assert!(registry.lookup_country("xx").is_none());
        assert!(registry.lookup_id(999).is_none());
    }

    #[test]
    fn test_all_zones() {
        let registry = registry();
        assert_eq!(registry.all_zones().count(), registry.len());
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_duplicate_country_rejected() {
        let mut zones = builtin_zones();
        zones[1].country = "us".to_string();
        zones[1].id = 99;
        let result = ToneZoneRegistry::build(&config_with_zones(zones));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut zones = builtin_zones();
        zones[1].id = zones[0].id;
        let result = ToneZoneRegistry::build(&config_with_zones(zones));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_bad_pattern_fails_build() {
        let mut zones = builtin_zones();
        zones[0]
            .tones
            .iter_mut()
            .find(|def| def.kind == ToneKind::Busy)
            .unwrap()
            .pattern = "480+620/500,0/".to_string();
        let result = ToneZoneRegistry::build(&config_with_zones(zones));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_resolve_missing_kind_is_not_specified() {
        let mut zones = builtin_zones();
        zones[0].tones.retain(|def| def.kind != ToneKind::RecordTone);
        let registry = ToneZoneRegistry::build(&config_with_zones(zones)).unwrap();

        let zone = registry.lookup_country("us").unwrap();
        let result = registry.resolve_tone(&zone, ToneKind::RecordTone);
        assert!(matches!(result, Err(Error::NotSpecified { .. })));
        assert!(result.unwrap_err().is_recoverable());
    }

    #[test]
    fn test_fallback_to_default_zone() {
        let mut zones = builtin_zones();
        // au keeps its own busy tone but loses recordtone
        zones[1].tones.retain(|def| def.kind != ToneKind::RecordTone);
        let mut config = config_with_zones(zones);
        config.general.default_zone = "us".to_string();
        let registry = ToneZoneRegistry::build(&config).unwrap();

        let fallback = registry
            .resolve_with_fallback("au", ToneKind::RecordTone)
            .unwrap();
        let us = registry.lookup_country("us").unwrap();
        assert_eq!(*fallback, *us.tone(ToneKind::RecordTone).unwrap());

        let own = registry.resolve_with_fallback("au", ToneKind::Busy).unwrap();
        let au = registry.lookup_country("au").unwrap();
        assert!(Arc::ptr_eq(&own, &au.tone(ToneKind::Busy).unwrap()));
    }

    #[test]
    fn test_unknown_country_in_fallback() {
        let registry = registry();
        let result = registry.resolve_with_fallback("zz", ToneKind::Busy);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_pattern_cache_shares_identical_texts() {
        let registry = registry();
        // us and fr share the recall pattern string verbatim
        let us = registry.lookup_country("us").unwrap();
        let fr = registry.lookup_country("fr").unwrap();
        let us_recall = us.tone(ToneKind::DialRecall).unwrap();
        let fr_recall = fr.tone(ToneKind::DialRecall).unwrap();
        assert!(Arc::ptr_eq(&us_recall, &fr_recall));
    }

    #[test]
    fn test_zone_level_lookup() {
        let registry = registry();
        let fr = registry.lookup_country("fr").unwrap();
        assert_eq!(fr.level_for(&[697, 770]), -11);
        assert_eq!(fr.level_for(&[1209]), -9);
        assert_eq!(fr.level_for(&[440]), crate::levels::NOMINAL_TONE_LEVEL_DB);
    }
}
