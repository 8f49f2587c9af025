//! Cadence pattern grammar
//!
//! Pattern text is a comma-separated list of segments:
//!
//! ```text
//! segment  := ['!'] freq ('+' freq){0,2} ['*' rate] ['/' millis]
//! ```
//!
//! `!` gates the segment (it always plays to completion), `+` sums up to
//! three simultaneous sine components, `*` adds amplitude modulation at the
//! given rate, and `/` gives the duration in milliseconds. A segment without
//! a duration is the pattern's terminal hold and is only legal in last
//! position; a pattern ending in a finite segment loops from the top. The
//! frequency `0` stands for silence and must be a segment's only component.
//!
//! The loop-vs-hold convention is inferred from how real zone tables use the
//! notation (busy and ring cadences always repeat, recall tones settle into a
//! steady dial tone) rather than stated by the notation itself.
//!
//! Parsing is pure and deterministic. The registry caches results keyed on
//! the source text, since many zones share pattern strings verbatim.

use super::pattern::{CadencePattern, Segment, SegmentDuration};
use crate::{Error, Result};

/// Maximum additive sine components per segment
pub const MAX_FREQUENCIES: usize = 3;

/// Compile pattern text into a `CadencePattern`.
///
/// Never partially succeeds: any malformed segment fails the whole parse.
pub fn parse(text: &str) -> Result<CadencePattern> {
    if text.trim().is_empty() {
        return Err(Error::grammar("Empty pattern text"));
    }

    let raw_segments: Vec<&str> = text.split(',').collect();
    let last = raw_segments.len() - 1;

    let mut segments = Vec::with_capacity(raw_segments.len());
    for (index, raw) in raw_segments.iter().enumerate() {
        let segment = parse_segment(raw, index).map_err(|e| match e {
            Error::Grammar(msg) => Error::grammar(format!("{} in {:?}", msg, text)),
            other => other,
        })?;
        if segment.duration.is_indefinite() && index != last {
            return Err(Error::grammar(format!(
                "Segment {} of {:?} has no duration but is not last",
                index, text
            )));
        }
        segments.push(segment);
    }

    CadencePattern::new(segments)
}

fn parse_segment(raw: &str, index: usize) -> Result<Segment> {
    let mut rest = raw.trim();
    if rest.is_empty() {
        return Err(Error::grammar(format!("Segment {} is empty", index)));
    }

    let gated = rest.starts_with('!');
    if gated {
        rest = rest[1..].trim_start();
        if rest.starts_with('!') {
            return Err(Error::grammar(format!(
                "Segment {} has a duplicate gate marker",
                index
            )));
        }
    }

    // freq-expr [* rate] [/ millis], split from the right
    let (rest, duration) = match rest.split_once('/') {
        Some((head, millis)) => {
            let ms = parse_number(millis, "duration")?;
            if ms == 0 {
                return Err(Error::grammar(format!(
                    "Segment {} has a zero duration",
                    index
                )));
            }
            (head.trim_end(), SegmentDuration::Millis(ms))
        }
        None => (rest, SegmentDuration::Indefinite),
    };

    let (freq_expr, modulation) = match rest.split_once('*') {
        Some((head, rate)) => {
            let rate = parse_number(rate, "modulation rate")?;
            if rate == 0 {
                return Err(Error::grammar(format!(
                    "Segment {} has a zero modulation rate",
                    index
                )));
            }
            (head.trim_end(), Some(rate))
        }
        None => (rest, None),
    };

    let frequencies = parse_frequencies(freq_expr, index)?;

    // Modulation on silence is accepted and dropped; on a tone it must sit
    // below every carrier component.
    let modulation_hz = if frequencies == [0] {
        None
    } else if let Some(rate) = modulation {
        let lowest = *frequencies.iter().min().unwrap_or(&0);
        if rate >= lowest {
            return Err(Error::grammar(format!(
                "Segment {} modulation rate {} Hz is not below carrier {} Hz",
                index, rate, lowest
            )));
        }
        Some(rate)
    } else {
        None
    };

    Ok(Segment {
        frequencies,
        modulation_hz,
        duration,
        gated,
    })
}

fn parse_frequencies(expr: &str, index: usize) -> Result<Vec<u32>> {
    let parts: Vec<&str> = expr.split('+').collect();
    if parts.len() > MAX_FREQUENCIES {
        return Err(Error::grammar(format!(
            "Segment {} has {} frequency components, at most {} are supported",
            index,
            parts.len(),
            MAX_FREQUENCIES
        )));
    }

    let mut frequencies = Vec::with_capacity(parts.len());
    for part in parts {
        frequencies.push(parse_number(part, "frequency")?);
    }

    // 0 is silence and stands alone
    if frequencies.contains(&0) && frequencies.len() > 1 {
        return Err(Error::grammar(format!(
            "Segment {} mixes silence (0) with tone components",
            index
        )));
    }

    Ok(frequencies)
}

fn parse_number(token: &str, what: &str) -> Result<u32> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::grammar(format!("Missing {}", what)));
    }
    token
        .parse::<u32>()
        .map_err(|_| Error::grammar(format!("Malformed {} {:?}", what, token)))
}
