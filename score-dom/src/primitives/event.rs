//! A smallest piece of music, that is held by Voice.
use log::debug;

use super::{container::Tuplet, Length, Pitch};
use crate::{
    error::{DomError, DomResult},
    notation::{Attachment, NotationSplitPosition},
};

/// Can be considered as "Generic" Event.
///
/// EventInfo is more about length, routing and markup, while
/// EventType responds for Event-representation and rendering.
/// Position is not the part of event: it is the key in Voice.
#[derive(Debug, PartialEq, Clone)]
pub struct EventInfo {
    pub length: Length,
    pub voice: u8,
    pub staff: u8,
    /// Rendered before the event.
    pub prefix: Vec<Attachment>,
    /// Rendered after the event.
    pub postfix: Vec<Attachment>,
    pub event: EventType,
}
impl EventInfo {
    pub fn new(length: Length, event: EventType) -> Self {
        Self {
            length,
            voice: 1,
            staff: 1,
            prefix: Vec::new(),
            postfix: Vec::new(),
            event,
        }
    }
    pub fn note(length: Length, pitch: Pitch) -> Self {
        Self::new(length, EventType::Note(pitch))
    }
    pub fn rest(length: Length) -> Self {
        Self::new(length, EventType::Rest)
    }
    pub fn spacer(length: Length) -> Self {
        Self::new(length, EventType::Spacer)
    }
    pub fn with_voice(mut self, voice: u8) -> Self {
        self.voice = voice;
        self
    }
    pub fn with_staff(mut self, staff: u8) -> Self {
        self.staff = staff;
        self
    }

    /// Note or chord.
    pub fn is_sounding(&self) -> bool {
        matches!(self.event, EventType::Note(_) | EventType::Chord(_))
    }
    pub fn is_rest(&self) -> bool {
        matches!(self.event, EventType::Rest)
    }

    /// True if attachment of the same kind is in prefix or postfix.
    pub fn has_attachment(&self, kind: &Attachment) -> bool {
        self.prefix
            .iter()
            .chain(self.postfix.iter())
            .any(|a| a.same_kind(kind))
    }

    /// Tie all sounding pitches to the next event.
    pub fn set_tie(&mut self, tie: bool) {
        match &mut self.event {
            EventType::Note(pitch) => pitch.set_tie(tie),
            EventType::Chord(chord) => chord.set_tie(tie),
            _ => (),
        }
    }

    /// Split event at the given length from its start.
    ///
    /// Head attachments stay on the left part, tail ones go to the right.
    /// If tie is requested, sounding left part is tied to the right one.
    ///
    /// # Example
    /// ```
    /// # use score_dom::primitives::{EventInfo, Length, Pitch};
    /// # use fraction::Fraction;
    /// let event = EventInfo::note(Length::from(0.75), Pitch::from(60));
    /// let (left, right) = event.split(&Length::from(0.5), true).unwrap();
    /// assert_eq!(left.length, Length::from(0.5));
    /// assert_eq!(right.length, Length::from(Fraction::new(1u64, 4u64)));
    /// assert!(event.split(&Length::from(1.0), true).is_err());
    /// ```
    pub fn split(&self, at: &Length, tie: bool) -> DomResult<(Self, Self)> {
        if matches!(self.event, EventType::Tuplet(_) | EventType::Global) {
            return Err(DomError::Unsplittable {
                event: format!("{:?}", self.event),
            });
        }
        let rest = self.length.checked_sub(at).ok_or(DomError::SplitTooLong {
            length: self.length.get(),
            at: at.get(),
        })?;
        let mut left = self.clone();
        let mut right = self.clone();
        left.length = self.length.with_fraction(at.get());
        right.length = rest;
        left.prefix.retain(|a| a.is_head());
        left.postfix.retain(|a| a.is_head());
        right.prefix.retain(|a| a.is_tail());
        right.postfix.retain(|a| a.is_tail());
        if tie {
            left.set_tie(true);
        }
        Ok((left, right))
    }

    /// Turn note into chord with one pitch.
    pub fn make_chord(&mut self) {
        if let EventType::Note(pitch) = &self.event {
            self.event = EventType::Chord(Chord::new(vec![pitch.clone()]));
        }
    }

    /// Merge pitches and markup of event of the same length.
    ///
    /// Rests and spacers bring only their markup.
    pub fn merge_chord(&mut self, other: EventInfo) -> DomResult<()> {
        if self.length != other.length {
            return Err(DomError::ChordLengthMismatch {
                chord: self.length.get(),
                event: other.length.get(),
            });
        }
        self.make_chord();
        let chord = match &mut self.event {
            EventType::Chord(chord) => chord,
            event => {
                return Err(DomError::UnexpectedEvent {
                    context: "chord".to_string(),
                    event: format!("{:?}", event),
                })
            }
        };
        match other.event {
            EventType::Note(pitch) => chord.push(pitch),
            EventType::Chord(other_chord) => {
                for pitch in other_chord.pitches {
                    chord.push(pitch)
                }
            }
            EventType::Rest | EventType::Spacer => {
                debug!("merging rest into chord brings only its markup")
            }
            event => {
                return Err(DomError::UnexpectedEvent {
                    context: "chord".to_string(),
                    event: format!("{:?}", event),
                })
            }
        }
        for attachment in other.prefix.iter().chain(other.postfix.iter()) {
            attachment.apply_to_event(self);
        }
        Ok(())
    }

    /// Append event to the tuplet, growing its length.
    ///
    /// Zero-length events are ignored.
    pub fn append(&mut self, other: EventInfo) -> DomResult<()> {
        if other.length.is_zero() {
            return Ok(());
        }
        match &mut self.event {
            EventType::Tuplet(tuplet) => {
                self.length += &other.length;
                tuplet.push(other);
                Ok(())
            }
            event => Err(DomError::UnexpectedEvent {
                context: "tuplet".to_string(),
                event: format!("{:?}", event),
            }),
        }
    }
}

/// Various types of events with concrete realizations
/// as variant args.
#[derive(Debug, PartialEq, Clone, Default)]
pub enum EventType {
    #[default]
    Rest,
    /// Invisible rest.
    Spacer,
    Note(Pitch),
    Chord(Chord),
    Tuplet(Tuplet),
    /// Carrier of timeline-wide markup, that has no event at position.
    /// Zero-length.
    Global,
}

/// Pitches, sorted by midi number.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Chord {
    pitches: Vec<Pitch>,
}
impl Chord {
    pub fn new(pitches: Vec<Pitch>) -> Self {
        let mut chord = Self::default();
        for pitch in pitches {
            chord.push(pitch);
        }
        chord
    }
    pub fn pitches(&self) -> &[Pitch] {
        &self.pitches
    }
    pub fn pitches_mut(&mut self) -> &mut [Pitch] {
        &mut self.pitches
    }
    pub fn contains(&self, midi: u8) -> bool {
        self.pitches.iter().any(|p| p.midi() == midi)
    }
    /// Unison is merged to one pitch, which is tied if any of them is.
    pub fn push(&mut self, pitch: Pitch) {
        match self.pitches.iter_mut().find(|p| p.midi() == pitch.midi()) {
            Some(existing) => {
                let tie = existing.is_tied() || pitch.is_tied();
                existing.set_tie(tie);
            }
            None => {
                let idx = self
                    .pitches
                    .partition_point(|p| p.midi() < pitch.midi());
                self.pitches.insert(idx, pitch);
            }
        }
    }
    pub fn set_tie(&mut self, tie: bool) {
        for pitch in self.pitches.iter_mut() {
            pitch.set_tie(tie);
        }
    }
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use crate::{
        error::DomError,
        notation::{Attachment, Clef},
        primitives::{Chord, EventInfo, EventType, Length, Pitch, Tuplet},
    };

    fn pitches(event: &EventInfo) -> Vec<(u8, bool)> {
        match &event.event {
            EventType::Chord(chord) => chord
                .pitches()
                .iter()
                .map(|p| (p.midi(), p.is_tied()))
                .collect(),
            EventType::Note(p) => vec![(p.midi(), p.is_tied())],
            _ => Vec::new(),
        }
    }

    #[test]
    fn split_keeps_length_and_ties() {
        let mut event = EventInfo::note(
            Length::from(Fraction::new(5u64, 8u64)),
            Pitch::from(60),
        );
        event.prefix.push(Attachment::Clef(Clef::Bass));
        event.postfix.push(Attachment::Dynamics("f".into()));
        for at in [0.0, 0.125, 0.5, 0.625] {
            for tie in [true, false] {
                let (left, right) =
                    event.split(&Length::from(at), tie).unwrap();
                assert_eq!(&left.length + &right.length, event.length);
                assert_eq!(pitches(&left), vec![(60, tie)]);
                assert_eq!(pitches(&right), vec![(60, false)]);
                assert_eq!(left.prefix, event.prefix);
                assert!(left.postfix.is_empty());
                assert!(right.prefix.is_empty());
                assert_eq!(right.postfix, event.postfix);
            }
        }
        let rest = EventInfo::rest(Length::from(0.5));
        let (left, _) = rest.split(&Length::from(0.25), true).unwrap();
        assert_eq!(left.event, EventType::Rest);
    }

    #[test]
    fn split_routes_attachments_by_kind() {
        let mut event = EventInfo::note(Length::from(0.5), Pitch::from(62));
        event.prefix.push(Attachment::Clef(Clef::Bass));
        event.prefix.push(Attachment::Dynamics("p".into()));
        event.postfix.push(Attachment::Ghost);
        event.postfix.push(Attachment::Trill);
        let (left, right) = event.split(&Length::from(0.25), true).unwrap();
        assert_eq!(left.prefix, vec![Attachment::Clef(Clef::Bass)]);
        assert_eq!(left.postfix, vec![Attachment::Ghost]);
        assert_eq!(right.prefix, vec![Attachment::Dynamics("p".into())]);
        assert_eq!(right.postfix, vec![Attachment::Trill]);
    }

    #[test]
    fn split_errors() {
        let event = EventInfo::note(Length::from(0.5), Pitch::from(60));
        assert!(matches!(
            event.split(&Length::from(0.75), false),
            Err(DomError::SplitTooLong { .. })
        ));
        let tuplet = EventInfo::new(
            Length::zero(),
            EventType::Tuplet(Tuplet::default()),
        );
        assert!(matches!(
            tuplet.split(&Length::zero(), false),
            Err(DomError::Unsplittable { .. })
        ));
    }

    #[test]
    fn chord_split_ties_every_pitch() {
        let chord = EventInfo::new(
            Length::from(0.5),
            EventType::Chord(Chord::new(vec![
                Pitch::from(64),
                Pitch::from(60),
            ])),
        );
        let (left, right) = chord.split(&Length::from(0.25), true).unwrap();
        assert_eq!(pitches(&left), vec![(60, true), (64, true)]);
        assert_eq!(pitches(&right), vec![(60, false), (64, false)]);
    }

    #[test]
    fn merge_chord() {
        let mut event = EventInfo::note(Length::from(0.5), Pitch::from(67));
        let mut other = EventInfo::note(Length::from(0.5), Pitch::from(60));
        other.postfix.push(Attachment::Trill);
        event.merge_chord(other).unwrap();
        event
            .merge_chord(EventInfo::note(Length::from(0.5), Pitch::from(64)))
            .unwrap();
        event
            .merge_chord(EventInfo::note(Length::from(0.5), Pitch::from(60)))
            .unwrap();
        assert_eq!(
            pitches(&event),
            vec![(60, false), (64, false), (67, false)]
        );
        assert_eq!(event.postfix, vec![Attachment::Trill]);
        let short = EventInfo::note(Length::from(0.25), Pitch::from(62));
        assert!(matches!(
            event.merge_chord(short),
            Err(DomError::ChordLengthMismatch { .. })
        ));
    }

    #[test]
    fn append_to_tuplet() {
        let mut tuplet = EventInfo::new(
            Length::zero(),
            EventType::Tuplet(Tuplet::default()),
        );
        let third = Length::from(Fraction::new(1u64, 12u64));
        for midi in [60, 62, 64] {
            tuplet
                .append(EventInfo::note(third.clone(), Pitch::from(midi)))
                .unwrap();
        }
        tuplet.append(EventInfo::rest(Length::zero())).unwrap();
        assert_eq!(tuplet.length, Length::from(0.25));
        match &tuplet.event {
            EventType::Tuplet(t) => assert_eq!(t.events().len(), 3),
            _ => panic!("should be tuplet"),
        }
        let mut note = EventInfo::note(Length::from(0.5), Pitch::from(60));
        assert!(note.append(EventInfo::rest(third)).is_err());
    }
}
