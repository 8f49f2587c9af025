//! Builtin tone zone definitions
//!
//! A representative set of country zones so the engine works with zero
//! configuration. Frequencies and cadences follow ITU E.180 Supplement 2
//! and national carrier specifications (BT SIN 350 for the UK). Deployments
//! with other requirements supply their own zone table via configuration.

use crate::cadence::pattern::ToneKind;
use crate::config::{ToneDef, ZoneConfig};
use crate::levels::CalibrationLevels;

fn zone(
    id: i32,
    country: &str,
    description: &str,
    ring_cadence: &[u32],
    tones: &[(ToneKind, &str)],
    levels: CalibrationLevels,
) -> ZoneConfig {
    ZoneConfig {
        id,
        country: country.to_string(),
        description: description.to_string(),
        ring_cadence: ring_cadence.to_vec(),
        tones: tones
            .iter()
            .map(|(kind, text)| ToneDef {
                kind: *kind,
                pattern: text.to_string(),
            })
            .collect(),
        levels,
    }
}

const LEVELS_NA: CalibrationLevels = CalibrationLevels {
    dtmf_high_level: -10,
    dtmf_low_level: -10,
    mfr1_level: -10,
    mfr2_level: -8,
};

const LEVELS_ETSI: CalibrationLevels = CalibrationLevels {
    dtmf_high_level: -9,
    dtmf_low_level: -11,
    mfr1_level: -7,
    mfr2_level: -8,
};

/// The builtin zone table
pub fn builtin_zones() -> Vec<ZoneConfig> {
    use ToneKind::*;

    vec![
        zone(
            0,
            "us",
            "United States / North America",
            &[2000, 4000],
            &[
                (DialTone, "350+440"),
                (Busy, "480+620/500,0/500"),
                (RingTone, "440+480/2000,0/4000"),
                (Congestion, "480+620/250,0/250"),
                (CallWait, "440/300,0/10000"),
                (DialRecall, "!350+440/100,!0/100,!350+440/100,!0/100,!350+440/100,!0/100,350+440"),
                (RecordTone, "1400/500,0/15000"),
                (Info, "!950/330,!1400/330,!1800/330,0"),
                (Stutter, "!350+440/100,!0/100,!350+440/100,!0/100,!350+440/100,!0/100,!350+440/100,!0/100,!350+440/100,!0/100,!350+440/100,!0/100,350+440"),
            ],
            LEVELS_NA,
        ),
        zone(
            1,
            "au",
            "Australia",
            &[400, 200, 400, 2000],
            &[
                (DialTone, "413+438"),
                (Busy, "425/375,0/375"),
                (RingTone, "413+438/400,0/200,413+438/400,0/2000"),
                (Congestion, "425/375,0/375,420/375,0/375"),
                (CallWait, "425/100,0/200,425/200,0/4400"),
                (DialRecall, "413+428"),
                (RecordTone, "!425/1000,!0/15000,425/360,0/15000"),
                (Info, "425/2500,0/500"),
                (Stutter, "413+438/100,0/40"),
            ],
            LEVELS_NA,
        ),
        zone(
            2,
            "fr",
            "France",
            &[1500, 3500],
            &[
                (DialTone, "440"),
                (Busy, "440/500,0/500"),
                (RingTone, "440/1500,0/3500"),
                (Congestion, "440/250,0/250"),
                (CallWait, "440/300,0/10000"),
                (DialRecall, "!350+440/100,!0/100,!350+440/100,!0/100,!350+440/100,!0/100,350+440"),
                (RecordTone, "1400/500,0/15000"),
                (Info, "!950/330,!1400/330,!1800/330,0"),
                (Stutter, "!440/100,!0/100,!440/100,!0/100,!440/100,!0/100,!440/100,!0/100,!440/100,!0/100,!440/100,!0/100,440"),
            ],
            LEVELS_ETSI,
        ),
        zone(
            3,
            "nl",
            "Netherlands",
            &[1000, 4000],
            &[
                (DialTone, "425"),
                (Busy, "425/500,0/500"),
                (RingTone, "425/1000,0/4000"),
                (Congestion, "425/250,0/250"),
                (CallWait, "425/500,0/9500"),
                (DialRecall, "!425/100,!0/100,!425/100,!0/100,!425/100,!0/100,425"),
                (RecordTone, "1400/500,0/15000"),
                (Info, "950/330,1400/330,1800/330,0/1000"),
                (Stutter, "425/500,0/50"),
            ],
            LEVELS_ETSI,
        ),
        zone(
            4,
            "uk",
            "United Kingdom",
            &[400, 200, 400, 2000],
            &[
                (DialTone, "350+440"),
                (Busy, "400/375,0/375"),
                (RingTone, "400+450/400,0/200,400+450/400,0/2000"),
                (Congestion, "400/400,0/350,400/225,0/525"),
                (CallWait, "400/100,0/4000"),
                (DialRecall, "350+440"),
                (RecordTone, "1400/500,0/60000"),
                (Info, "950/330,0/15,1400/330,0/15,1800/330,0/1000"),
                (Stutter, "350+440/750,440/750"),
            ],
            LEVELS_ETSI,
        ),
        zone(
            5,
            "fi",
            "Finland",
            &[1000, 4000],
            &[
                (DialTone, "425"),
                (Busy, "425/300,0/300"),
                (RingTone, "425/1000,0/4000"),
                (Congestion, "425/200,0/200"),
                (CallWait, "425/150,0/150,425/150,0/8000"),
                (DialRecall, "425/650,0/25"),
                (RecordTone, "1400/500,0/15000"),
                (Info, "950/650,0/325,950/325,0/30,1400/1300,0/2600"),
                (Stutter, "425/650,0/25"),
            ],
            LEVELS_ETSI,
        ),
        zone(
            6,
            "es",
            "Spain",
            &[1500, 3000],
            &[
                (DialTone, "425"),
                (Busy, "425/200,0/200"),
                (RingTone, "425/1500,0/3000"),
                (Congestion, "425/200,0/200,425/200,0/200,425/200,0/600"),
                (CallWait, "425/175,0/175,425/175,0/3500"),
                (DialRecall, "!425/200,!0/200,!425/200,!0/200,!425/200,!0/200,425"),
                (RecordTone, "1400/500,0/15000"),
                (Info, "950/330,0/1000"),
                (Stutter, "425/500,0/50"),
            ],
            LEVELS_ETSI,
        ),
        zone(
            7,
            "jp",
            "Japan",
            &[1000, 2000],
            &[
                (DialTone, "400"),
                (Busy, "400/500,0/500"),
                (RingTone, "400+15/1000,0/2000"),
                (Congestion, "400/500,0/500"),
                (CallWait, "400+16/500,0/8000"),
                (DialRecall, "!400/200,!0/200,!400/200,!0/200,!400/200,!0/200,400"),
                (RecordTone, "1400/500,0/15000"),
                (Info, "!950/330,!1400/330,!1800/330,0"),
                (Stutter, "!400/100,!0/100,!400/100,!0/100,!400/100,!0/100,!400/100,!0/100,!400/100,!0/100,!400/100,!0/100,400"),
            ],
            CalibrationLevels {
                dtmf_high_level: -7,
                dtmf_low_level: -7,
                mfr1_level: -7,
                mfr2_level: -8,
            },
        ),
        zone(
            8,
            "no",
            "Norway",
            &[1000, 4000],
            &[
                (DialTone, "425"),
                (Busy, "425/500,0/500"),
                (RingTone, "425/1000,0/4000"),
                (Congestion, "425/200,0/200"),
                (CallWait, "425/200,0/600,425/200,0/10000"),
                (DialRecall, "470/400,425/400"),
                (RecordTone, "1400/400,0/15000"),
                (Info, "!950/330,!1400/330,!1800/330,!0/1000,!950/330,!1400/330,!1800/330,!0/1000,!950/330,!1400/330,!1800/330,!0/1000,0"),
                (Stutter, "470/400,425/400"),
            ],
            LEVELS_NA,
        ),
        zone(
            9,
            "at",
            "Austria",
            &[1000, 5000],
            &[
                (DialTone, "420"),
                (Busy, "420/400,0/400"),
                (RingTone, "420/1000,0/5000"),
                (Congestion, "420/200,0/200"),
                (CallWait, "420/40,0/1960"),
                (DialRecall, "420"),
                (RecordTone, "1400/80,0/14920"),
                (Info, "950/330,1450/330,1850/330,0/1000"),
                (Stutter, "380+420"),
            ],
            CalibrationLevels {
                dtmf_high_level: -9,
                dtmf_low_level: -11,
                mfr1_level: -10,
                mfr2_level: -8,
            },
        ),
        zone(
            10,
            "nz",
            "New Zealand",
            &[400, 200, 400, 2000],
            &[
                (DialTone, "400"),
                (Busy, "400/500,0/500"),
                (RingTone, "400+450/400,0/200,400+450/400,0/2000"),
                (Congestion, "400/250,0/250"),
                (CallWait, "400/250,0/250,400/250,0/3250"),
                (DialRecall, "!400/100,!0/100,!400/100,!0/100,!400/100,!0/100,400"),
                (RecordTone, "1400/425,0/15000"),
                (Info, "400/750,0/100,400/750,0/100,400/750,0/100,400/750,0/400"),
                (Stutter, "!400/100,!0/100,!400/100,!0/100,!400/100,!0/100,!400/100,!0/100,!400/100,!0/100,!400/100,!0/100,400"),
            ],
            CalibrationLevels {
                dtmf_high_level: -11,
                dtmf_low_level: -9,
                mfr1_level: -7,
                mfr2_level: -8,
            },
        ),
        zone(
            12,
            "us-old",
            "United States Circa 1950 / North America",
            &[2000, 4000],
            &[
                (DialTone, "600*120"),
                (Busy, "500*100/500,0/500"),
                (RingTone, "420*40/2000,0/4000"),
                (Congestion, "500*100/250,0/250"),
                (CallWait, "440/300,0/10000"),
                (DialRecall, "!600*120/100,!0/100,!600*120/100,!0/100,!600*120/100,!0/100,600*120"),
                (RecordTone, "1400/500,0/15000"),
                (Info, "!950/330,!1400/330,!1800/330,0"),
                (Stutter, "!600*120/100,!0/100,!600*120/100,!0/100,!600*120/100,!0/100,!600*120/100,!0/100,!600*120/100,!0/100,!600*120/100,!0/100,600*120"),
            ],
            LEVELS_NA,
        ),
        zone(
            18,
            "sg",
            "Singapore",
            &[400, 200, 400, 2000],
            &[
                (DialTone, "425"),
                (Busy, "425/750,0/750"),
                (RingTone, "425*24/400,0/200,425*24/400,0/2000"),
                (Congestion, "425/250,0/250"),
                (CallWait, "425*24/300,0/200,425*24/300,0/3200"),
                (DialRecall, "425*24/500,0/500,425/500,0/2500"),
                (RecordTone, "1400/500,0/15000"),
                (Info, "950/330,1400/330,1800/330,0/1000"),
                (Stutter, "!425/200,!0/200,!425/600,!0/200,!425/200,!0/200,!425/600,!0/200,!425/200,!0/200,!425/600,!0/200,!425/200,!0/200,!425/600,!0/200,425"),
            ],
            CalibrationLevels {
                dtmf_high_level: -11,
                dtmf_low_level: -9,
                mfr1_level: -7,
                mfr2_level: -8,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cadence::parser::parse;
    use std::collections::HashSet;

    #[test]
    fn test_builtin_zones_validate() {
        for zone in builtin_zones() {
            zone.validate().unwrap();
        }
    }

    #[test]
    fn test_builtin_ids_and_countries_unique() {
        let zones = builtin_zones();
        let ids: HashSet<_> = zones.iter().map(|z| z.id).collect();
        let countries: HashSet<_> = zones.iter().map(|z| z.country.clone()).collect();
        assert_eq!(ids.len(), zones.len());
        assert_eq!(countries.len(), zones.len());
    }

    #[test]
    fn test_builtin_patterns_parse() {
        for zone in builtin_zones() {
            for def in &zone.tones {
                parse(&def.pattern).unwrap_or_else(|e| {
                    panic!("{} {} failed to parse: {}", zone.country, def.kind, e)
                });
            }
        }
    }

    #[test]
    fn test_every_builtin_zone_covers_all_kinds() {
        for zone in builtin_zones() {
            assert_eq!(zone.tones.len(), ToneKind::ALL.len(), "{}", zone.country);
        }
    }
}
