//! Rhythm-to-notation engine.
//!
//! Timestamped events (rational beats) are packed into voices, split and
//! tied across bar lines, merged into chords, grouped into tuplets, padded
//! with rests and rendered to LilyPond source.
//!
//! The usual way through the crate:
//!
//! 1. build a [primitives::TimeMap] from the bars of the exported area;
//! 2. collect [dom::ParsedEvent]s into a [dom::Timeline];
//! 3. turn it into [dom::Staff]s with [dom::Timeline::into_staves];
//! 4. render them with [lilypond_render::render_part].

pub mod dom;
pub mod error;
pub mod lilypond_render;
pub mod notation;
pub mod primitives;

pub use error::{DomError, DomResult};
