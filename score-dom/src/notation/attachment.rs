//! Markup, which is rendered before or after the event.
use std::{fmt::Display, mem::discriminant, str::FromStr};

use super::{NotationError, NotationSplitPosition, NoteHead};
use crate::{
    lilypond_render::{alphabet, RendersToLilypond},
    primitives::{EventInfo, Grace, GraceType, Key, TimeSignature},
};

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Clef {
    #[default]
    Treble,
    Bass,
    Alto,
    Tenor,
    Percussion,
    GG,
    French,
    Soprano,
    MezzoSoprano,
    Baritone,
    AltovarC,
    TenorvarC,
    Subbass,
}
impl Clef {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Treble => "treble",
            Self::Bass => "bass",
            Self::Alto => "alto",
            Self::Tenor => "tenor",
            Self::Percussion => "percussion",
            Self::GG => "GG",
            Self::French => "french",
            Self::Soprano => "soprano",
            Self::MezzoSoprano => "mezzosoprano",
            Self::Baritone => "baritone",
            Self::AltovarC => "altovarC",
            Self::TenorvarC => "tenorvarC",
            Self::Subbass => "subbass",
        }
    }
}
impl FromStr for Clef {
    type Err = NotationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "treble" | "G" | "violin" => Ok(Self::Treble),
            "bass" | "F" => Ok(Self::Bass),
            "alto" | "C" => Ok(Self::Alto),
            "tenor" => Ok(Self::Tenor),
            "percussion" => Ok(Self::Percussion),
            "GG" => Ok(Self::GG),
            "french" => Ok(Self::French),
            "soprano" => Ok(Self::Soprano),
            "mezzosoprano" => Ok(Self::MezzoSoprano),
            "baritone" => Ok(Self::Baritone),
            "altovarC" => Ok(Self::AltovarC),
            "tenorvarC" => Ok(Self::TenorvarC),
            "subbass" => Ok(Self::Subbass),
            x => Err(NotationError::UnexpectedToken(x.to_string())),
        }
    }
}
impl RendersToLilypond for Clef {
    fn render_lilypond(&self) -> String {
        format!(r"\clef {}", self.as_str())
    }
}

/// Placement of articulation.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Direction {
    Up,
    Down,
    #[default]
    Neutral,
}
impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "^"),
            Self::Down => write!(f, "_"),
            Self::Neutral => write!(f, "-"),
        }
    }
}
impl FromStr for Direction {
    type Err = NotationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "^" | "up" => Ok(Self::Up),
            "_" | "down" => Ok(Self::Down),
            "-" | "" => Ok(Self::Neutral),
            x => Err(NotationError::UnexpectedToken(x.to_string())),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Beaming {
    Auto,
    Off,
    /// Lengths of beat groups, in base moments.
    Structure(Vec<u32>),
}
impl RendersToLilypond for Beaming {
    fn render_lilypond(&self) -> String {
        match self {
            Self::Auto => r"\autoBeamOn".to_string(),
            Self::Off => r"\autoBeamOff".to_string(),
            Self::Structure(groups) => {
                let groups = groups
                    .iter()
                    .map(|g| g.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                format!(r"\set Timing.beatStructure = {groups}")
            }
        }
    }
}

/// Every kind of markup attached to the event.
///
/// Two attachments of the same kind never live in one event: the newer
/// one replaces the older.
#[derive(Debug, PartialEq, Clone)]
pub enum Attachment {
    /// bar number
    BarCheck(u32),
    Clef(Clef),
    StaffChange(u8),
    Ghost,
    Trill,
    /// Event is dropped at ingestion.
    Ignore,
    TupletBegin,
    TupletEnd,
    GraceBegin(GraceType),
    GraceEnd,
    /// Grace notes, played before the event.
    Grace(Grace),
    Dynamics(String),
    Articulation {
        articulation: String,
        direction: Direction,
    },
    /// `^\markup` text.
    Text(String),
    /// Rendered verbatim.
    PlainText(String),
    Beaming(Beaming),
    NoteHead(NoteHead),
    XNoteBegin,
    XNoteEnd,
    KeySignature(Key),
    TimeSignature(TimeSignature),
}
impl Attachment {
    pub fn same_kind(&self, other: &Self) -> bool {
        discriminant(self) == discriminant(other)
    }

    /// Replace contents by the new attachment of the same kind.
    ///
    /// # Returns
    /// false, if kinds differ and nothing happened.
    pub fn update(&mut self, new: &Self) -> bool {
        if !self.same_kind(new) {
            return false;
        }
        *self = new.clone();
        true
    }

    /// Merge into list, replacing the same kind.
    pub fn merge_into(&self, list: &mut Vec<Attachment>) {
        match list.iter_mut().find(|a| a.same_kind(self)) {
            Some(existing) => {
                existing.update(self);
            }
            None => list.push(self.clone()),
        }
    }

    /// Head kinds go to prefix, tail kinds to postfix.
    pub fn apply_to_event(&self, event: &mut EventInfo) {
        match self.is_head() {
            true => self.merge_into(&mut event.prefix),
            false => self.merge_into(&mut event.postfix),
        }
    }
}
impl NotationSplitPosition for Attachment {
    fn is_head(&self) -> bool {
        !matches!(
            self,
            Self::Trill
                | Self::TupletEnd
                | Self::GraceEnd
                | Self::Dynamics(_)
                | Self::Articulation { .. }
                | Self::Text(_)
                | Self::XNoteEnd
        )
    }
}
impl RendersToLilypond for Attachment {
    /// Grace groups need pitch context and are rendered by the voice
    /// renderer. Brackets of tuplets and graces are rendered by their
    /// containers.
    fn render_lilypond(&self) -> String {
        match self {
            Self::BarCheck(bar) => format!("| % bar {bar}\n"),
            Self::Clef(clef) => clef.render_lilypond(),
            Self::StaffChange(staff) => {
                format!(r#"\change Staff = "Staff{}""#, alphabet(*staff as u32))
            }
            Self::Ghost => r"\parenthesize".to_string(),
            Self::Trill => r"\trill".to_string(),
            Self::Dynamics(dynamics) => format!(r"\{dynamics}"),
            Self::Articulation {
                articulation,
                direction,
            } => format!("{direction}{articulation}"),
            Self::Text(text) => format!(r#"^\markup "{text}""#),
            Self::PlainText(text) => text.clone(),
            Self::Beaming(beaming) => beaming.render_lilypond(),
            Self::NoteHead(head) => {
                format!(r"\once \override NoteHead.style = #'{head}")
            }
            Self::XNoteBegin => r"\xNote {".to_string(),
            Self::XNoteEnd => "}".to_string(),
            Self::KeySignature(key) => key.render_lilypond(),
            Self::TimeSignature(ts) => ts.render_lilypond(),
            Self::Ignore
            | Self::TupletBegin
            | Self::TupletEnd
            | Self::GraceBegin(_)
            | Self::GraceEnd
            | Self::Grace(_) => String::new(),
        }
    }
}
