//! tonezone - call-progress tone cadence engine
//!
//! Per-country call-progress tone definitions (dial, busy, ring, congestion,
//! call-wait and friends) with a compact cadence pattern language, an
//! immutable zone registry, and a per-line playback state machine that
//! honors gated bursts and deferred cancellation. Tone synthesis, line-state
//! detection, and zone selection live behind external collaborators.

pub mod cadence;
pub mod config;
pub mod error;
pub mod levels;
pub mod registry;
pub mod utils;
pub mod zonedata;

pub use cadence::{
    parse, CadencePattern, EmitCommand, RingCadence, Segment, SegmentDuration, Sequencer,
    SequencerState, Termination, ToneKind, ToneSink,
};
pub use error::{Error, Result};
pub use levels::{level_for, CalibrationLevels, ToneFamily, NOMINAL_TONE_LEVEL_DB};
pub use registry::{ToneZone, ToneZoneRegistry};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
