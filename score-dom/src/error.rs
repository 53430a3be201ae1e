//! Errors of DOM assembly and rendering.

use fraction::Fraction;
use thiserror::Error;

use crate::notation::NotationError;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Can not split event of length {length} at {at}")]
    SplitTooLong { length: Fraction, at: Fraction },
    #[error("Event {event} can not be split")]
    Unsplittable { event: String },
    #[error(
        "Overlapping events: event at {position} ends at {end}, \
        but the next one starts at {next}"
    )]
    Overlap {
        position: String,
        end: String,
        next: String,
    },
    #[error("Overlaps can not be resolved, stuck at {position}")]
    UnresolvedOverlap { position: String },
    #[error("Fraction {0} can not be represented as note length")]
    UnrepresentableLength(Fraction),
    #[error(
        "Can not append event of length {event} to chord of length {chord}"
    )]
    ChordLengthMismatch { chord: Fraction, event: Fraction },
    #[error("Notation for pitch {pitch} can not be applied to {target}")]
    PitchMismatch { pitch: u8, target: String },
    #[error("Unexpected event in {context}: {event}")]
    UnexpectedEvent { context: String, event: String },
    #[error("Position {position} is before the start of the TimeMap")]
    BeforeStart { position: String },
    #[error("Can not build TimeMap without measures")]
    EmptyTimeMap,
    #[error(transparent)]
    Notation(#[from] NotationError),
    #[error("Can not read render settings: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type DomResult<T> = Result<T, DomError>;
