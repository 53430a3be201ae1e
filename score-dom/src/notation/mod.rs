//! Annotations of events: field mutations and attached markup.

use crate::{
    error::{DomError, DomResult},
    primitives::{EventInfo, EventType},
};

pub mod attachment;
pub mod note_notations;

pub use attachment::{Attachment, Beaming, Clef, Direction};
pub use note_notations::{NoteHead, NoteNotations};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum NotationError {
    #[error("Unexpected Token: {0}")]
    UnexpectedToken(String),
    #[error(
        "Unexpected Notation: Can not apply notation \
        to object: {notation}, {object}"
    )]
    UnexpectedNotation { notation: String, object: String },
}
pub type NotationResult<T> = Result<T, NotationError>;

/// Way to decide which note should carry the notation on note-split.
///
/// if corresponding function returns true → it will be kept at the head, at
/// tail or in both. By default, only head specified, then tail is inverted.
/// But both functions can be implemented.
pub trait NotationSplitPosition {
    fn is_head(&self) -> bool;
    fn is_tail(&self) -> bool {
        !self.is_head()
    }
}

/// Any annotation, that can be applied to event.
#[derive(Debug, PartialEq, Clone)]
pub enum NotationType {
    Note(NoteNotations),
    Event(Attachment),
}
impl NotationType {
    pub fn apply_to_event(&self, event: &mut EventInfo) -> NotationResult<()> {
        match self {
            Self::Note(notation) => notation.apply_to_event(event, None),
            Self::Event(attachment) => {
                attachment.apply_to_event(event);
                Ok(())
            }
        }
    }
}
impl From<Attachment> for NotationType {
    fn from(value: Attachment) -> Self {
        Self::Event(value)
    }
}
impl From<NoteNotations> for NotationType {
    fn from(value: NoteNotations) -> Self {
        Self::Note(value)
    }
}

/// Annotation, bound to the exact pitch at position.
#[derive(Debug, PartialEq, Clone)]
pub struct PitchNotation {
    pub midi: u8,
    pub notation: NotationType,
}
impl PitchNotation {
    pub fn new(midi: u8, notation: impl Into<NotationType>) -> Self {
        Self {
            midi,
            notation: notation.into(),
        }
    }

    /// True if event sounds the pitch.
    pub fn matches(&self, event: &EventInfo) -> bool {
        match &event.event {
            EventType::Note(pitch) => pitch.midi() == self.midi,
            EventType::Chord(chord) => chord.contains(self.midi),
            _ => false,
        }
    }

    /// Fails with [DomError::PitchMismatch] if event does not sound the
    /// pitch.
    pub fn apply_to_event(&self, event: &mut EventInfo) -> DomResult<()> {
        if !self.matches(event) {
            return Err(DomError::PitchMismatch {
                pitch: self.midi,
                target: format!("{:?}", event.event),
            });
        }
        match &self.notation {
            NotationType::Note(notation) => {
                notation.apply_to_event(event, Some(self.midi))?
            }
            NotationType::Event(attachment) => attachment.apply_to_event(event),
        }
        Ok(())
    }
}
