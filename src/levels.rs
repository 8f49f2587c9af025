//! Signaling level calibration
//!
//! Zones carry four amplitude offsets for the DTMF and MF R1/R2 signaling
//! families. `level_for` classifies a segment's frequency set against those
//! families and returns the zone's level for it; frequency sets outside the
//! signaling families (ordinary call-progress tones) get the fixed nominal
//! level.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Nominal transmit level for call-progress tones, in dBm0
pub const NOMINAL_TONE_LEVEL_DB: i32 = -10;

/// DTMF low group (row frequencies)
static DTMF_LOW_GROUP: Lazy<Vec<u32>> = Lazy::new(|| vec![697, 770, 852, 941]);

/// DTMF high group (column frequencies)
static DTMF_HIGH_GROUP: Lazy<Vec<u32>> = Lazy::new(|| vec![1209, 1336, 1477, 1633]);

/// MF R1 tone set (North American interregister signaling)
static MFR1_GROUP: Lazy<Vec<u32>> = Lazy::new(|| vec![700, 900, 1100, 1300, 1500, 1700]);

/// MF R2 tone set, forward and backward directions combined
static MFR2_GROUP: Lazy<Vec<u32>> = Lazy::new(|| {
    vec![
        540, 660, 780, 900, 1020, 1140, 1380, 1500, 1620, 1740, 1860, 1980,
    ]
});

/// Per-zone signaling level offsets in dB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationLevels {
    pub dtmf_high_level: i32,
    pub dtmf_low_level: i32,
    pub mfr1_level: i32,
    pub mfr2_level: i32,
}

impl Default for CalibrationLevels {
    fn default() -> Self {
        Self {
            dtmf_high_level: -10,
            dtmf_low_level: -10,
            mfr1_level: -10,
            mfr2_level: -8,
        }
    }
}

/// Signaling family a frequency set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneFamily {
    DtmfLow,
    DtmfHigh,
    Mfr1,
    Mfr2,
    /// Ordinary call-progress tone, no calibration applies
    None,
}

/// Classify a frequency set. Every member must belong to the family; R1 wins
/// over R2 where the sets overlap (900 and 1500 Hz appear in both).
pub fn classify(frequencies: &[u32]) -> ToneFamily {
    let in_group = |group: &[u32]| {
        !frequencies.is_empty() && frequencies.iter().all(|f| group.contains(f))
    };

    if in_group(&DTMF_LOW_GROUP) {
        ToneFamily::DtmfLow
    } else if in_group(&DTMF_HIGH_GROUP) {
        ToneFamily::DtmfHigh
    } else if in_group(&MFR1_GROUP) {
        ToneFamily::Mfr1
    } else if in_group(&MFR2_GROUP) {
        ToneFamily::Mfr2
    } else {
        ToneFamily::None
    }
}

/// Transmit level in dB for a frequency set under the given calibration.
pub fn level_for(levels: &CalibrationLevels, frequencies: &[u32]) -> i32 {
    match classify(frequencies) {
        ToneFamily::DtmfLow => levels.dtmf_low_level,
        ToneFamily::DtmfHigh => levels.dtmf_high_level,
        ToneFamily::Mfr1 => levels.mfr1_level,
        ToneFamily::Mfr2 => levels.mfr2_level,
        ToneFamily::None => NOMINAL_TONE_LEVEL_DB,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> CalibrationLevels {
        CalibrationLevels {
            dtmf_high_level: -9,
            dtmf_low_level: -11,
            mfr1_level: -7,
            mfr2_level: -8,
        }
    }

    #[test]
    fn test_dtmf_groups() {
        assert_eq!(classify(&[697]), ToneFamily::DtmfLow);
        assert_eq!(classify(&[770, 941]), ToneFamily::DtmfLow);
        assert_eq!(classify(&[1209, 1477]), ToneFamily::DtmfHigh);
        assert_eq!(level_for(&levels(), &[852]), -11);
        assert_eq!(level_for(&levels(), &[1336]), -9);
    }

    #[test]
    fn test_mf_groups() {
        assert_eq!(classify(&[700, 1100]), ToneFamily::Mfr1);
        assert_eq!(classify(&[540, 1980]), ToneFamily::Mfr2);
        assert_eq!(level_for(&levels(), &[1300, 1700]), -7);
        assert_eq!(level_for(&levels(), &[660, 780]), -8);
    }

    #[test]
    fn test_overlap_prefers_r1() {
        // 900 and 1500 sit in both MF sets
        assert_eq!(classify(&[900, 1500]), ToneFamily::Mfr1);
    }

    #[test]
    fn test_mixed_set_is_not_a_family() {
        // One DTMF row plus one column frequency is a digit, not a group
        assert_eq!(classify(&[697, 1209]), ToneFamily::None);
        assert_eq!(level_for(&levels(), &[697, 1209]), NOMINAL_TONE_LEVEL_DB);
    }

    #[test]
    fn test_progress_tones_use_nominal() {
        assert_eq!(classify(&[350, 440]), ToneFamily::None);
        assert_eq!(classify(&[0]), ToneFamily::None);
        assert_eq!(level_for(&levels(), &[480, 620]), NOMINAL_TONE_LEVEL_DB);
    }
}
