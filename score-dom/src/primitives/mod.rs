//! Elements, from which DOM constructed.
//!
//! At first, one TimeMap is created from the bars of the exported area.
//! Then positions and lengths are measured against it.
//! Then events are placed to Voice at their positions.
//! Then voices are organized in staves,
//! then rendered to *.ly source file and compiled by LilyPond.

pub mod container;
pub mod event;
pub mod fraction_tools;
pub mod length;
pub mod pitch;
pub mod position;
pub mod time_map;

pub use container::{Grace, GraceType, Tuplet, TupletRate};
pub use event::{Chord, EventInfo, EventType};
pub use fraction_tools::{
    closest_power_of_two, is_binary, limit_denominator, normalize_fraction,
    power_of_two, truncate_to_binary, Fractured,
};
pub use length::Length;
pub use pitch::{
    midi_to_note, spell, Accidental, Key, NoteName, Octave, Pitch,
    ResolvedNote, ResolvedPitch, Scale,
};
pub use position::{Position, RelativeDistance};
pub use time_map::{MeasureInfo, TimeMap, TimeMapMeasures, TimeSignature};

/// Every position and length is limited by this denominator.
pub static LIMIT_DENOMINATOR: u64 = 128;
