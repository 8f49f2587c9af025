//! Cadence pattern data model
//!
//! A parsed cadence pattern is an ordered list of segments. Each segment is a
//! sum of one to three sine components, optionally amplitude-modulated, played
//! for a fixed number of milliseconds or held indefinitely. A pattern whose
//! last segment has a finite duration loops from the top; a pattern whose last
//! segment is the bare-frequency hold form terminates in a steady tone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Call-progress tone categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToneKind {
    DialTone,
    Busy,
    RingTone,
    Congestion,
    CallWait,
    DialRecall,
    RecordTone,
    Info,
    Stutter,
}

impl ToneKind {
    pub const ALL: [ToneKind; 9] = [
        ToneKind::DialTone,
        ToneKind::Busy,
        ToneKind::RingTone,
        ToneKind::Congestion,
        ToneKind::CallWait,
        ToneKind::DialRecall,
        ToneKind::RecordTone,
        ToneKind::Info,
        ToneKind::Stutter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToneKind::DialTone => "dialtone",
            ToneKind::Busy => "busy",
            ToneKind::RingTone => "ringtone",
            ToneKind::Congestion => "congestion",
            ToneKind::CallWait => "callwait",
            ToneKind::DialRecall => "dialrecall",
            ToneKind::RecordTone => "recordtone",
            ToneKind::Info => "info",
            ToneKind::Stutter => "stutter",
        }
    }
}

impl fmt::Display for ToneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToneKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dialtone" | "dial" => Ok(ToneKind::DialTone),
            "busy" => Ok(ToneKind::Busy),
            "ringtone" | "ring" => Ok(ToneKind::RingTone),
            "congestion" => Ok(ToneKind::Congestion),
            "callwait" => Ok(ToneKind::CallWait),
            "dialrecall" => Ok(ToneKind::DialRecall),
            "recordtone" => Ok(ToneKind::RecordTone),
            "info" => Ok(ToneKind::Info),
            "stutter" => Ok(ToneKind::Stutter),
            other => Err(Error::parse(format!("Unknown tone kind: {}", other))),
        }
    }
}

/// How long a segment plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentDuration {
    /// Fixed duration in milliseconds
    Millis(u32),
    /// Terminal hold: play until the sequencer is cancelled
    Indefinite,
}

impl SegmentDuration {
    pub fn is_indefinite(&self) -> bool {
        matches!(self, SegmentDuration::Indefinite)
    }

    pub fn millis(&self) -> Option<u32> {
        match self {
            SegmentDuration::Millis(ms) => Some(*ms),
            SegmentDuration::Indefinite => None,
        }
    }
}

/// One step of a cadence pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Additive sine components in Hz. The single component `0` means
    /// silence; otherwise every component is a positive frequency.
    pub frequencies: Vec<u32>,
    /// Amplitude interruption rate in Hz, if the tone warbles
    pub modulation_hz: Option<u32>,
    pub duration: SegmentDuration,
    /// Gated segments always play to completion; cancellation is deferred
    /// to the segment boundary.
    pub gated: bool,
}

impl Segment {
    pub fn is_silence(&self) -> bool {
        self.frequencies == [0]
    }
}

/// What happens after the final segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Restart from segment 0 (busy, ring, congestion style cadences)
    Loop,
    /// The final segment is an indefinite hold (steady dial tone style)
    Hold,
    /// Play the segments once and stop
    Stop,
}

/// A fully parsed cadence pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadencePattern {
    segments: Vec<Segment>,
    termination: Termination,
}

impl CadencePattern {
    /// Build a pattern, inferring the termination from the last segment:
    /// an indefinite final segment holds, a finite one loops.
    pub fn new(segments: Vec<Segment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(Error::grammar("Pattern has no segments"));
        }
        let termination = if segments[segments.len() - 1].duration.is_indefinite() {
            Termination::Hold
        } else {
            Termination::Loop
        };
        Self::with_termination(segments, termination)
    }

    /// Build a pattern with an explicit termination. The pattern grammar
    /// never produces `Stop`, but the sequencer supports one-shot playback
    /// for programmatically built patterns.
    pub fn with_termination(segments: Vec<Segment>, termination: Termination) -> Result<Self> {
        if segments.is_empty() {
            return Err(Error::grammar("Pattern has no segments"));
        }
        for (index, segment) in segments.iter().enumerate() {
            if segment.duration.is_indefinite() && index != segments.len() - 1 {
                return Err(Error::grammar(format!(
                    "Indefinite segment at position {} is not last",
                    index
                )));
            }
        }
        if termination == Termination::Hold
            && !segments[segments.len() - 1].duration.is_indefinite()
        {
            return Err(Error::grammar(
                "Hold termination requires an indefinite final segment",
            ));
        }
        if termination != Termination::Hold
            && segments[segments.len() - 1].duration.is_indefinite()
        {
            return Err(Error::grammar(
                "Indefinite final segment requires hold termination",
            ));
        }
        Ok(Self {
            segments,
            termination,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Duration of one full pass over the finite segments, in milliseconds
    pub fn cycle_millis(&self) -> u64 {
        self.segments
            .iter()
            .filter_map(|s| s.duration.millis())
            .map(u64::from)
            .sum()
    }
}

/// Power ring cadence: alternating ring-active/ring-silent durations in
/// milliseconds, starting with active. Cycles for as long as the line rings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingCadence {
    steps: Vec<u32>,
}

impl RingCadence {
    pub fn new(steps: Vec<u32>) -> Result<Self> {
        if steps.is_empty() {
            return Err(Error::configuration("Ring cadence is empty"));
        }
        if steps.len() % 2 != 0 {
            return Err(Error::configuration(format!(
                "Ring cadence has {} entries, expected an even count",
                steps.len()
            )));
        }
        if steps.iter().any(|&ms| ms == 0) {
            return Err(Error::configuration(
                "Ring cadence durations must be positive",
            ));
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[u32] {
        &self.steps
    }

    /// Total length of one ring cycle in milliseconds
    pub fn cycle_millis(&self) -> u64 {
        self.steps.iter().map(|&ms| u64::from(ms)).sum()
    }

    /// Endless iterator of (active, duration_ms) steps
    pub fn cycle(&self) -> impl Iterator<Item = (bool, u32)> + '_ {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, &ms)| (i % 2 == 0, ms))
            .cycle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(freqs: &[u32], duration: SegmentDuration) -> Segment {
        Segment {
            frequencies: freqs.to_vec(),
            modulation_hz: None,
            duration,
            gated: false,
        }
    }

    #[test]
    fn test_termination_inference() {
        let looping = CadencePattern::new(vec![
            seg(&[480, 620], SegmentDuration::Millis(500)),
            seg(&[0], SegmentDuration::Millis(500)),
        ])
        .unwrap();
        assert_eq!(looping.termination(), Termination::Loop);

        let holding =
            CadencePattern::new(vec![seg(&[413, 428], SegmentDuration::Indefinite)]).unwrap();
        assert_eq!(holding.termination(), Termination::Hold);
    }

    #[test]
    fn test_indefinite_only_last() {
        let result = CadencePattern::new(vec![
            seg(&[440], SegmentDuration::Indefinite),
            seg(&[0], SegmentDuration::Millis(500)),
        ]);
        assert!(matches!(result, Err(Error::Grammar(_))));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(CadencePattern::new(Vec::new()).is_err());
    }

    #[test]
    fn test_stop_termination() {
        let pattern = CadencePattern::with_termination(
            vec![seg(&[440], SegmentDuration::Millis(300))],
            Termination::Stop,
        )
        .unwrap();
        assert_eq!(pattern.termination(), Termination::Stop);
    }

    #[test]
    fn test_cycle_millis() {
        let pattern = CadencePattern::new(vec![
            seg(&[440, 480], SegmentDuration::Millis(2000)),
            seg(&[0], SegmentDuration::Millis(4000)),
        ])
        .unwrap();
        assert_eq!(pattern.cycle_millis(), 6000);
    }

    #[test]
    fn test_ring_cadence_validation() {
        assert!(RingCadence::new(vec![2000, 4000]).is_ok());
        assert!(RingCadence::new(vec![400, 200, 400, 2000]).is_ok());
        assert!(RingCadence::new(Vec::new()).is_err());
        assert!(RingCadence::new(vec![2000, 4000, 1000]).is_err());
        assert!(RingCadence::new(vec![2000, 0]).is_err());
    }

    #[test]
    fn test_ring_cadence_cycles() {
        let cadence = RingCadence::new(vec![400, 200, 400, 2000]).unwrap();
        let steps: Vec<_> = cadence.cycle().take(6).collect();
        assert_eq!(
            steps,
            vec![
                (true, 400),
                (false, 200),
                (true, 400),
                (false, 2000),
                (true, 400),
                (false, 200),
            ]
        );
        assert_eq!(cadence.cycle_millis(), 3000);
    }

    #[test]
    fn test_tone_kind_round_trip() {
        for kind in ToneKind::ALL {
            assert_eq!(kind.as_str().parse::<ToneKind>().unwrap(), kind);
        }
        assert!("carrier".parse::<ToneKind>().is_err());
    }
}
