use std::{fmt::Display, str::FromStr};

use super::{NotationError, NotationResult};
use crate::primitives::{Accidental, EventInfo, EventType};

/// Notations, that change the event itself instead of being rendered.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NoteNotations {
    Accidental(Accidental),
    Voice(u8),
    Staff(u8),
    /// Tremolo subdivision, like 32 for `:32`.
    Tremolo(u32),
}
impl Display for NoteNotations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accidental(acc) => write!(f, "accidental:{:?}", acc),
            Self::Voice(idx) => write!(f, "voice:{}", idx),
            Self::Staff(idx) => write!(f, "staff:{}", idx),
            Self::Tremolo(denom) => write!(f, "trem:{}", denom),
        }
    }
}
impl NoteNotations {
    /// Mutate event.
    ///
    /// If `midi` is given, accidental goes only to the pitch of the chord
    /// with the same midi number.
    pub fn apply_to_event(
        &self,
        event: &mut EventInfo,
        midi: Option<u8>,
    ) -> NotationResult<()> {
        match self {
            Self::Accidental(acc) => match &mut event.event {
                EventType::Note(pitch) => {
                    pitch.set_accidental(Some(*acc));
                }
                EventType::Chord(chord) => {
                    for pitch in chord.pitches_mut() {
                        if midi.is_none() || midi == Some(pitch.midi()) {
                            pitch.set_accidental(Some(*acc));
                        }
                    }
                }
                other => {
                    return Err(NotationError::UnexpectedNotation {
                        notation: self.to_string(),
                        object: format!("{:?}", other),
                    })
                }
            },
            Self::Voice(voice) => event.voice = *voice,
            Self::Staff(staff) => event.staff = *staff,
            Self::Tremolo(denom) => {
                event.length.set_trem_denom(Some(*denom));
            }
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum NoteHead {
    #[default]
    Default,
    AltDefault,
    Baroque,
    Neomensural,
    Mensural,
    Petrucci,
    Harmonic,
    HarmonicBlack,
    HarmonicMixed,
    Diamond,
    Cross,
    XCircle,
    Triangle,
    Slash,
}
impl Display for NoteHead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let style = match *self {
            Self::Default => "default",
            Self::AltDefault => "altdefault",
            Self::Baroque => "baroque",
            Self::Neomensural => "neomensural",
            Self::Mensural => "mensural",
            Self::Petrucci => "petrucci",
            Self::Harmonic => "harmonic",
            Self::HarmonicBlack => "harmonic-black",
            Self::HarmonicMixed => "harmonic-mixed",
            Self::Diamond => "diamond",
            Self::Cross => "cross",
            Self::XCircle => "xcircle",
            Self::Triangle => "triangle",
            Self::Slash => "slash",
        };
        write!(f, "{style}")
    }
}
impl FromStr for NoteHead {
    type Err = NotationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "altdefault" => Ok(Self::AltDefault),
            "baroque" => Ok(Self::Baroque),
            "neomensural" => Ok(Self::Neomensural),
            "mensural" => Ok(Self::Mensural),
            "petrucci" => Ok(Self::Petrucci),
            "harmonic" => Ok(Self::Harmonic),
            "harmonic-black" => Ok(Self::HarmonicBlack),
            "harmonic-mixed" => Ok(Self::HarmonicMixed),
            "diamond" => Ok(Self::Diamond),
            "cross" => Ok(Self::Cross),
            "xcircle" => Ok(Self::XCircle),
            "triangle" => Ok(Self::Triangle),
            "slash" => Ok(Self::Slash),
            x => Err(NotationError::UnexpectedToken(x.to_string())),
        }
    }
}
