//! Cadence playback state machine
//!
//! A `Sequencer` walks one parsed pattern for one line. The state machine
//! itself is synchronous and timer-free so tests can drive and inspect it
//! directly; `play` wraps it in a tokio driver that sleeps out segment
//! durations and watches a cancellation channel.
//!
//! Cancellation semantics are the engine's one concurrency invariant: a
//! cancellation that arrives during a gated segment is buffered and applied
//! at the segment boundary, so gated bursts always play their full declared
//! duration. Ungated segments cancel immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::pattern::{CadencePattern, SegmentDuration, Termination};
use crate::{Error, Result};

/// One instruction to the synthesis collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitCommand {
    /// Sine components in Hz; `[0]` means silence
    pub frequencies: Vec<u32>,
    pub modulation_hz: Option<u32>,
    pub level_db: i32,
    pub duration: SegmentDuration,
    pub gated: bool,
}

/// Tone synthesis boundary. Implementations turn emit commands into audio;
/// the engine only specifies what is emitted.
#[async_trait]
pub trait ToneSink: Send {
    async fn emit(&mut self, command: &EmitCommand) -> Result<()>;

    /// Called when playback stops before the pattern does (cancellation or
    /// sink failure) so the output can be silenced.
    async fn quiesce(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sequencer lifecycle. `Holding`, `Cancelled` and `Done` are terminal for
/// this pattern instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Playing { index: usize },
    Holding,
    Cancelled,
    Done,
}

impl SequencerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SequencerState::Holding | SequencerState::Cancelled | SequencerState::Done
        )
    }
}

/// Per-call cadence player. Create one per active tone request; never share
/// across lines.
pub struct Sequencer {
    pattern: Arc<CadencePattern>,
    level_db: i32,
    state: SequencerState,
    pending_cancel: bool,
}

impl Sequencer {
    pub fn new(pattern: Arc<CadencePattern>, level_db: i32) -> Self {
        Self {
            pattern,
            level_db,
            state: SequencerState::Idle,
            pending_cancel: false,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn pending_cancel(&self) -> bool {
        self.pending_cancel
    }

    pub fn pattern(&self) -> &CadencePattern {
        &self.pattern
    }

    /// Begin playback at segment 0. Returns the first emit command.
    pub fn start(&mut self) -> Result<EmitCommand> {
        if self.state != SequencerState::Idle {
            return Err(Error::invalid_state(format!(
                "Sequencer started in state {:?}",
                self.state
            )));
        }
        Ok(self.enter_segment(0))
    }

    /// Advance past a finite segment whose duration has elapsed. Returns the
    /// next emit command, or `None` once a terminal state is reached.
    pub fn segment_elapsed(&mut self) -> Option<EmitCommand> {
        let index = match self.state {
            SequencerState::Playing { index } => index,
            _ => return None,
        };

        if self.pending_cancel {
            debug!(segment = index, "Applying deferred cancellation at segment boundary");
            self.state = SequencerState::Cancelled;
            return None;
        }

        let next = index + 1;
        if next < self.pattern.len() {
            return Some(self.enter_segment(next));
        }

        match self.pattern.termination() {
            Termination::Loop => Some(self.enter_segment(0)),
            // A hold pattern parks on its indefinite final segment, so its
            // duration never elapses; reaching here means the pattern was
            // built inconsistently.
            Termination::Hold => {
                self.state = SequencerState::Holding;
                None
            }
            Termination::Stop => {
                debug!("Pattern complete");
                self.state = SequencerState::Done;
                None
            }
        }
    }

    /// Request cancellation. Immediate for ungated segments; deferred to the
    /// segment boundary while a gated segment is playing.
    pub fn cancel(&mut self) {
        match self.state {
            SequencerState::Playing { index } => {
                let gated = self
                    .pattern
                    .segment(index)
                    .map(|s| s.gated)
                    .unwrap_or(false);
                if gated {
                    debug!(segment = index, "Cancellation deferred, segment is gated");
                    self.pending_cancel = true;
                } else {
                    self.state = SequencerState::Cancelled;
                }
            }
            SequencerState::Idle | SequencerState::Holding => {
                self.state = SequencerState::Cancelled;
            }
            SequencerState::Cancelled | SequencerState::Done => {}
        }
    }

    /// Record a synthesis failure: the sequencer stops and never retries.
    fn fail(&mut self) {
        self.state = SequencerState::Cancelled;
    }

    fn enter_segment(&mut self, index: usize) -> EmitCommand {
        let segment = &self.pattern.segments()[index];
        self.state = if segment.duration.is_indefinite() {
            SequencerState::Holding
        } else {
            SequencerState::Playing { index }
        };
        debug!(
            segment = index,
            frequencies = ?segment.frequencies,
            modulation = ?segment.modulation_hz,
            duration = ?segment.duration,
            gated = segment.gated,
            "Entering segment"
        );
        EmitCommand {
            frequencies: segment.frequencies.clone(),
            modulation_hz: segment.modulation_hz,
            level_db: self.level_db,
            duration: segment.duration,
            gated: segment.gated,
        }
    }

    /// Drive the pattern against `sink` in wall-clock time until it holds,
    /// completes, is cancelled through `cancel_rx`, or the sink fails.
    ///
    /// The driver only suspends between segment boundaries; it never blocks a
    /// thread. Returns the terminal state.
    pub async fn play<S>(
        &mut self,
        sink: &mut S,
        cancel_rx: &mut watch::Receiver<bool>,
    ) -> Result<SequencerState>
    where
        S: ToneSink + ?Sized,
    {
        let mut command = self.start()?;

        loop {
            if let Err(err) = sink.emit(&command).await {
                warn!(error = %err, "Tone sink failed, stopping playback");
                self.fail();
                let _ = sink.quiesce().await;
                return Err(err);
            }

            match command.duration {
                SegmentDuration::Indefinite => {
                    // Holding: nothing further is emitted until cancellation.
                    loop {
                        if *cancel_rx.borrow() {
                            self.cancel();
                            sink.quiesce().await?;
                            return Ok(self.state);
                        }
                        if cancel_rx.changed().await.is_err() {
                            // Cancel source went away; the line keeps its
                            // steady tone and the caller owns the sink now.
                            return Ok(self.state);
                        }
                    }
                }
                SegmentDuration::Millis(ms) => {
                    let nap = sleep(Duration::from_millis(u64::from(ms)));
                    tokio::pin!(nap);

                    if command.gated {
                        // Gated bursts always complete; sample cancellation
                        // only once the timer runs out.
                        nap.await;
                        if *cancel_rx.borrow() {
                            self.cancel();
                        }
                    } else {
                        if *cancel_rx.borrow() {
                            self.cancel();
                            sink.quiesce().await?;
                            return Ok(self.state);
                        }
                        loop {
                            tokio::select! {
                                _ = &mut nap => break,
                                changed = cancel_rx.changed() => {
                                    match changed {
                                        Ok(()) if *cancel_rx.borrow() => {
                                            self.cancel();
                                            sink.quiesce().await?;
                                            return Ok(self.state);
                                        }
                                        Ok(()) => {}
                                        Err(_) => {
                                            (&mut nap).await;
                                            break;
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            match self.segment_elapsed() {
                Some(next) => command = next,
                None => {
                    if self.state == SequencerState::Cancelled {
                        sink.quiesce().await?;
                    }
                    return Ok(self.state);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cadence::parser::parse;
    use crate::cadence::pattern::{Segment, Termination};

    fn sequencer(text: &str) -> Sequencer {
        Sequencer::new(Arc::new(parse(text).unwrap()), -10)
    }

    struct RecordingSink {
        emitted: Vec<EmitCommand>,
        quiesced: bool,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                emitted: Vec::new(),
                quiesced: false,
            }
        }
    }

    #[async_trait]
    impl ToneSink for RecordingSink {
        async fn emit(&mut self, command: &EmitCommand) -> Result<()> {
            self.emitted.push(command.clone());
            Ok(())
        }

        async fn quiesce(&mut self) -> Result<()> {
            self.quiesced = true;
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl ToneSink for FailingSink {
        async fn emit(&mut self, _command: &EmitCommand) -> Result<()> {
            Err(Error::playback("Codec underrun"))
        }
    }

    #[test]
    fn test_loop_returns_to_segment_zero() {
        let mut seq = sequencer("480+620/500,0/500");

        let first = seq.start().unwrap();
        assert_eq!(seq.state(), SequencerState::Playing { index: 0 });

        let second = seq.segment_elapsed().unwrap();
        assert!(second.frequencies == vec![0]);

        let looped = seq.segment_elapsed().unwrap();
        assert_eq!(looped, first);
        assert_eq!(seq.state(), SequencerState::Playing { index: 0 });
    }

    #[test]
    fn test_terminal_hold() {
        let mut seq = sequencer("!425/100,!0/100,425");

        seq.start().unwrap();
        seq.segment_elapsed().unwrap();
        let held = seq.segment_elapsed().unwrap();
        assert_eq!(held.duration, SegmentDuration::Indefinite);
        assert_eq!(seq.state(), SequencerState::Holding);

        // Nothing further after the hold starts
        assert!(seq.segment_elapsed().is_none());
        assert_eq!(seq.state(), SequencerState::Holding);
    }

    #[test]
    fn test_ungated_cancel_is_immediate() {
        let mut seq = sequencer("440/300,0/10000");
        seq.start().unwrap();

        seq.cancel();
        assert_eq!(seq.state(), SequencerState::Cancelled);
        assert!(seq.segment_elapsed().is_none());
    }

    #[test]
    fn test_gated_cancel_waits_for_boundary() {
        let mut seq = sequencer("!1400/500,0/15000");
        seq.start().unwrap();

        seq.cancel();
        // Still playing: the gated burst must complete
        assert_eq!(seq.state(), SequencerState::Playing { index: 0 });
        assert!(seq.pending_cancel());

        // The boundary applies the queued cancellation instead of advancing
        assert!(seq.segment_elapsed().is_none());
        assert_eq!(seq.state(), SequencerState::Cancelled);
    }

    #[test]
    fn test_cancel_while_holding() {
        let mut seq = sequencer("413+428");
        seq.start().unwrap();
        assert_eq!(seq.state(), SequencerState::Holding);

        seq.cancel();
        assert_eq!(seq.state(), SequencerState::Cancelled);
    }

    #[test]
    fn test_one_shot_pattern_reaches_done() {
        let segments = vec![
            Segment {
                frequencies: vec![440],
                modulation_hz: None,
                duration: SegmentDuration::Millis(200),
                gated: false,
            },
            Segment {
                frequencies: vec![0],
                modulation_hz: None,
                duration: SegmentDuration::Millis(200),
                gated: false,
            },
        ];
        let pattern = CadencePattern::with_termination(segments, Termination::Stop).unwrap();
        let mut seq = Sequencer::new(Arc::new(pattern), -10);

        seq.start().unwrap();
        seq.segment_elapsed().unwrap();
        assert!(seq.segment_elapsed().is_none());
        assert_eq!(seq.state(), SequencerState::Done);
    }

    #[test]
    fn test_start_twice_rejected() {
        let mut seq = sequencer("440/300,0/300");
        seq.start().unwrap();
        assert!(seq.start().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_one_shot_emits_all_segments() {
        let segments = vec![
            Segment {
                frequencies: vec![950],
                modulation_hz: None,
                duration: SegmentDuration::Millis(330),
                gated: false,
            },
            Segment {
                frequencies: vec![1400],
                modulation_hz: None,
                duration: SegmentDuration::Millis(330),
                gated: false,
            },
        ];
        let pattern = CadencePattern::with_termination(segments, Termination::Stop).unwrap();
        let mut seq = Sequencer::new(Arc::new(pattern), -10);
        let mut sink = RecordingSink::new();
        let (_tx, mut rx) = watch::channel(false);

        let state = seq.play(&mut sink, &mut rx).await.unwrap();
        assert_eq!(state, SequencerState::Done);
        assert_eq!(sink.emitted.len(), 2);
        assert_eq!(sink.emitted[0].frequencies, vec![950]);
        assert_eq!(sink.emitted[1].frequencies, vec![1400]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_hold_until_cancelled() {
        let mut seq = sequencer("413+428");
        let mut sink = RecordingSink::new();
        let (tx, mut rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let state = seq.play(&mut sink, &mut rx).await.unwrap();
            (state, sink)
        });

        tokio::task::yield_now().await;
        tx.send(true).unwrap();

        let (state, sink) = handle.await.unwrap();
        assert_eq!(state, SequencerState::Cancelled);
        // The hold segment was emitted exactly once
        assert_eq!(sink.emitted.len(), 1);
        assert_eq!(
            sink.emitted[0].duration,
            SegmentDuration::Indefinite
        );
        assert!(sink.quiesced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_gated_segment_completes_despite_cancel() {
        let mut seq = sequencer("!1400/500,0/15000");
        let mut sink = RecordingSink::new();
        let (tx, mut rx) = watch::channel(false);

        // Cancellation lands before the gated burst starts sleeping
        tx.send(true).unwrap();

        let state = seq.play(&mut sink, &mut rx).await.unwrap();
        assert_eq!(state, SequencerState::Cancelled);
        // The gated segment was emitted with its full declared duration and
        // the silence segment after it never started.
        assert_eq!(sink.emitted.len(), 1);
        assert_eq!(sink.emitted[0].duration, SegmentDuration::Millis(500));
        assert!(sink.emitted[0].gated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_ungated_cancel_stops_before_emit() {
        let mut seq = sequencer("440/300,0/10000");
        let mut sink = RecordingSink::new();
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();

        let state = seq.play(&mut sink, &mut rx).await.unwrap();
        assert_eq!(state, SequencerState::Cancelled);
        // First segment was emitted, then the pre-sleep cancellation check
        // stopped playback.
        assert_eq!(sink.emitted.len(), 1);
        assert!(sink.quiesced);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_surfaces_sink_errors() {
        let mut seq = sequencer("440/300,0/300");
        let mut sink = FailingSink;
        let (_tx, mut rx) = watch::channel(false);

        let result = seq.play(&mut sink, &mut rx).await;
        assert!(matches!(result, Err(Error::Playback(_))));
        assert_eq!(seq.state(), SequencerState::Cancelled);
    }
}
