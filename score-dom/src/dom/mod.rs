//! Building of voices and staves from the timeline.
//!
//! [Timeline] collects raw events and notations, then
//! [Timeline::into_staves] splits them by staff and voice, places them with
//! [EventPackager] and finalizes every [Voice].

mod packager;
mod parse;
mod staff;
mod voice;

pub use packager::EventPackager;
pub use parse::{ParsedEvent, Timeline};
pub use staff::{split_by_staff, split_by_voice, EventsByPosition, Staff};
pub use voice::{GlobalEvents, Voice};
