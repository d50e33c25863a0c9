use thiserror::Error;

/// Failures that abort a timeline conversion run.
///
/// Everything else the converter runs into (orphaned note-offs, unclosed notes, low
/// pitches, unknown events) is absorbed and only shows up in the shape of the result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimelineError {
    /// The stream carries no tempo change, so no initial tempo can be established.
    #[error("No tempo events found, cannot convert ticks to seconds..!")]
    MissingTempo,

    /// The stream carries no time signature change, so measures cannot be laid out.
    #[error("No time signature events found, cannot compute measures..!")]
    MissingTimeSignature,

    #[error("Ticks per beat must be greater than 0..!")]
    InvalidResolution,

    #[error("Tempo change at tick {tick} has 0 microseconds per beat..!")]
    InvalidTempo { tick: u64 },

    #[error("Time signature {numerator}/{denominator} at tick {tick} is not usable..!")]
    InvalidTimeSignature {
        tick: u64,
        numerator: u8,
        denominator: u8,
    },
}
