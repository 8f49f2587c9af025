//! Cadence pattern language: grammar, parsed model, and the playback
//! state machine.

pub mod parser;
pub mod pattern;
pub mod sequencer;

pub use parser::parse;
pub use pattern::{CadencePattern, RingCadence, Segment, SegmentDuration, Termination, ToneKind};
pub use sequencer::{EmitCommand, Sequencer, SequencerState, ToneSink};
