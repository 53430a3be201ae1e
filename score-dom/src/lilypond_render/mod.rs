//! Rendering of finalized staves to LilyPond source.
use serde::{Deserialize, Serialize};

use crate::{error::DomResult, primitives::Key};

mod blocks;
mod events;

pub use blocks::{
    render_part, render_score, render_staff, render_voice, LilypondBlock,
};
pub use events::{fraction_to_length, render_length, Renderer};

pub trait RendersToLilypond {
    fn render_lilypond(&self) -> String;
}

/// Kind of the track, which decides between pitched and drum modes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackType {
    #[default]
    Default,
    Drums,
    OneLinePerc,
    Bongos,
}
impl TrackType {
    pub fn is_drums(&self) -> bool {
        !matches!(self, Self::Default)
    }
}

/// Context, holding staves of one part.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StaffGroup {
    #[default]
    GrandStaff,
    PianoStaff,
    StaffGroup,
    ChoirStaff,
}
impl StaffGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrandStaff => "GrandStaff",
            Self::PianoStaff => "PianoStaff",
            Self::StaffGroup => "StaffGroup",
            Self::ChoirStaff => "ChoirStaff",
        }
    }
}

/// Everything, that renderer needs to know beyond the events.
///
/// # Example
/// ```
/// # use score_dom::lilypond_render::{RenderSettings, TrackType};
/// # use score_dom::primitives::{Key, NoteName, Accidental, Scale};
/// let settings = RenderSettings::from_json(
///     r#"{"octave_offset": -1, "track_type": "Drums"}"#
/// ).unwrap();
/// assert_eq!(settings.key, Key::default());
/// assert_eq!(settings.octave_offset, -1);
/// assert_eq!(settings.track_type, TrackType::Drums);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Key at the start, used for spelling pitches.
    pub key: Key,
    /// Whole octaves, added to every pitch.
    pub octave_offset: i8,
    pub track_type: TrackType,
    pub staff_group: StaffGroup,
}
impl Default for RenderSettings {
    fn default() -> Self {
        Self::new(Key::default())
    }
}
impl RenderSettings {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            octave_offset: 0,
            track_type: TrackType::default(),
            staff_group: StaffGroup::default(),
        }
    }
    pub fn from_json(json: &str) -> DomResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn to_json(&self) -> DomResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Letter index, as digits are not allowed in LilyPond identifiers.
///
/// 1 is `A`, 26 is `Z`, 27 is `AA`. Zero gives an empty string.
pub fn alphabet(index: u32) -> String {
    let mut index = index;
    let mut letters = Vec::new();
    while index > 0 {
        index -= 1;
        letters.push((b'A' + (index % 26) as u8) as char);
        index /= 26;
    }
    letters.iter().rev().collect()
}

/// Make valid LilyPond identifier of arbitrary name.
///
/// Words are joined in camel case, numbers are replaced by letters.
///
/// # Example
/// ```
/// # use score_dom::lilypond_render::normalize_name;
/// assert_eq!(normalize_name("Violin 2"), "ViolinB");
/// assert_eq!(normalize_name("lead vox"), "leadVox");
/// assert_eq!(normalize_name("track 0"), "trackZero");
/// ```
pub fn normalize_name(name: &str) -> String {
    let mut result = String::new();
    let mut digits = String::new();
    let mut upper = false;
    let flush = |digits: &mut String, result: &mut String| {
        if digits.is_empty() {
            return;
        }
        match digits.parse::<u32>() {
            Ok(0) => result.push_str("Zero"),
            Ok(number) => result.push_str(&alphabet(number)),
            Err(_) => result.push_str(digits),
        }
        digits.clear();
    };
    for ch in name.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        flush(&mut digits, &mut result);
        match ch.is_alphabetic() {
            true => {
                match upper && !result.is_empty() {
                    true => result.extend(ch.to_uppercase()),
                    false => result.push(ch),
                }
                upper = false;
            }
            false => upper = true,
        }
    }
    flush(&mut digits, &mut result);
    result
}
