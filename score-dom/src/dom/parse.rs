//! Entry point of the DOM: raw events and notations on the timeline.
use std::{collections::BTreeMap, sync::Arc};

use fraction::Fraction;
use log::debug;

use super::{split_by_staff, EventsByPosition, GlobalEvents, Staff};
use crate::{
    error::{DomError, DomResult},
    notation::{Attachment, NotationType, PitchNotation},
    primitives::{EventInfo, Length, Pitch, Position, TimeMap},
};

/// Event as it comes from the source: position and length are in quarter
/// notes, rest has no pitch.
#[derive(Debug, PartialEq, Clone)]
pub struct ParsedEvent {
    pub position: Fraction,
    pub length: Fraction,
    pub pitch: Option<Pitch>,
    pub voice: u8,
    pub staff: u8,
    pub notations: Vec<NotationType>,
}
impl ParsedEvent {
    pub fn new(
        position: Fraction,
        length: Fraction,
        pitch: Option<u8>,
    ) -> Self {
        Self {
            position,
            length,
            pitch: pitch.map(Pitch::from),
            voice: 1,
            staff: 1,
            notations: Vec::new(),
        }
    }
    pub fn with_voice(mut self, voice: u8) -> Self {
        self.voice = voice;
        self
    }
    pub fn with_staff(mut self, staff: u8) -> Self {
        self.staff = staff;
        self
    }
    pub fn with_notation(mut self, notation: impl Into<NotationType>) -> Self {
        self.notations.push(notation.into());
        self
    }

    /// Push to event every notation. Voice and staff notations override
    /// the fields of ParsedEvent.
    pub fn apply_single_notations(self) -> DomResult<EventInfo> {
        let length = Length::from_beats(self.length);
        let mut event = match self.pitch {
            Some(pitch) => EventInfo::note(length, pitch),
            None => EventInfo::rest(length),
        }
        .with_voice(self.voice)
        .with_staff(self.staff);
        for notation in self.notations.iter() {
            notation.apply_to_event(&mut event)?;
        }
        Ok(event)
    }
}

/// Everything, that is placed on the timeline before building voices.
///
/// Notations are kept in three groups:
/// - pitch notations are applied to the note of the same pitch;
/// - staff notations are applied to the first event of the staff, or to
/// the invisible carrier if there is no event;
/// - global notations are applied to every voice of every staff.
#[derive(Debug)]
pub struct Timeline {
    time_map: Arc<TimeMap>,
    events: EventsByPosition,
    pitch_notations: BTreeMap<Position, Vec<PitchNotation>>,
    staff_notations: BTreeMap<Position, Vec<(u8, NotationType)>>,
    global_notations: GlobalEvents,
}
impl Timeline {
    pub fn new(time_map: Arc<TimeMap>) -> Self {
        Self {
            time_map,
            events: EventsByPosition::new(),
            pitch_notations: BTreeMap::new(),
            staff_notations: BTreeMap::new(),
            global_notations: GlobalEvents::new(),
        }
    }
    pub fn time_map(&self) -> &Arc<TimeMap> {
        &self.time_map
    }

    fn position(&self, beats: Fraction) -> Position {
        Position::from_beats(beats, &self.time_map)
    }

    pub fn push_event(&mut self, event: ParsedEvent) -> DomResult<()> {
        let position = self.position(event.position);
        if position < Position::origin(&self.time_map) {
            return Err(DomError::BeforeStart {
                position: position.to_string(),
            });
        }
        let event = event.apply_single_notations()?;
        self.events.entry(position).or_default().push(event);
        Ok(())
    }
    pub fn push_pitch_notation(
        &mut self,
        beats: Fraction,
        notation: PitchNotation,
    ) {
        let position = self.position(beats);
        self.pitch_notations.entry(position).or_default().push(notation);
    }
    pub fn push_staff_notation(
        &mut self,
        beats: Fraction,
        staff: u8,
        notation: impl Into<NotationType>,
    ) {
        let position = self.position(beats);
        self.staff_notations
            .entry(position)
            .or_default()
            .push((staff, notation.into()));
    }
    pub fn push_global_notation(
        &mut self,
        beats: Fraction,
        notation: impl Into<NotationType>,
    ) {
        let position = self.position(beats);
        self.global_notations
            .entry(position)
            .or_default()
            .push(notation.into());
    }

    /// Global notations with time signature changes and the notations,
    /// placed at the TimeMap start.
    pub fn global_events(&self, at_start: Vec<NotationType>) -> GlobalEvents {
        let mut globals = GlobalEvents::new();
        for (start, time_signature) in self.time_map.time_signature_changes() {
            globals
                .entry(Position::new(start, &self.time_map))
                .or_default()
                .push(Attachment::TimeSignature(time_signature).into());
        }
        if !at_start.is_empty() {
            globals
                .entry(Position::origin(&self.time_map))
                .or_default()
                .extend(at_start);
        }
        for (position, notations) in self.global_notations.iter() {
            globals
                .entry(position.clone())
                .or_default()
                .extend(notations.iter().cloned());
        }
        globals
    }

    fn apply_pitch_notations(
        events: &mut EventsByPosition,
        notations: BTreeMap<Position, Vec<PitchNotation>>,
    ) -> DomResult<()> {
        for (position, notations) in notations {
            for notation in notations {
                let target = events
                    .get_mut(&position)
                    .and_then(|events| {
                        events.iter_mut().find(|e| notation.matches(e))
                    })
                    .ok_or_else(|| DomError::PitchMismatch {
                        pitch: notation.midi,
                        target: position.to_string(),
                    })?;
                notation.apply_to_event(target)?;
            }
        }
        Ok(())
    }

    fn apply_staff_notations(
        events: &mut EventsByPosition,
        notations: BTreeMap<Position, Vec<(u8, NotationType)>>,
    ) -> DomResult<()> {
        for (position, notations) in notations {
            let at = events.entry(position.clone()).or_default();
            for (staff, notation) in notations {
                let idx = match at.iter().position(|e| e.staff == staff) {
                    Some(idx) => idx,
                    None => {
                        debug!("staff notation carrier at {}", position);
                        let length = Length::from(Fraction::new(1u64, 16u64));
                        at.push(EventInfo::spacer(length).with_staff(staff));
                        at.len() - 1
                    }
                };
                notation.apply_to_event(&mut at[idx])?;
            }
        }
        Ok(())
    }

    /// Build finalized staves.
    ///
    /// `at_start` notations (like key signature) are placed at the very
    /// start of the TimeMap.
    pub fn into_staves(
        self,
        at_start: Vec<NotationType>,
    ) -> DomResult<Vec<Staff>> {
        let globals = self.global_events(at_start);
        let Self {
            time_map,
            mut events,
            pitch_notations,
            staff_notations,
            ..
        } = self;
        Self::apply_pitch_notations(&mut events, pitch_notations)?;
        Self::apply_staff_notations(&mut events, staff_notations)?;
        for events in events.values_mut() {
            events.retain(|e| !e.has_attachment(&Attachment::Ignore));
        }
        events.retain(|_, events| !events.is_empty());

        let mut staves = Vec::new();
        for mut staff in split_by_staff(events, &time_map)? {
            staff.apply_global_events(&globals);
            staves.push(staff.finalized()?);
        }
        Ok(staves)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fraction::Fraction;

    use super::{ParsedEvent, Timeline};
    use crate::{
        error::DomError,
        notation::{
            Attachment, Clef, NotationType, NoteNotations, PitchNotation,
        },
        primitives::{
            Accidental, EventType, Key, Position, TimeMap, TimeSignature,
        },
    };

    fn time_map() -> Arc<TimeMap> {
        Arc::new(
            TimeMap::from_time_signatures(
                1,
                [
                    TimeSignature::new(4, 4),
                    TimeSignature::new(4, 4),
                    TimeSignature::new(3, 4),
                ],
                Fraction::from(0.0),
            )
            .unwrap(),
        )
    }

    fn beats(b: u64) -> Fraction {
        Fraction::from(b)
    }

    #[test]
    fn apply_single_notations() {
        let event = ParsedEvent::new(beats(0), beats(2), Some(61))
            .with_notation(NoteNotations::Accidental(Accidental::Flat))
            .with_notation(NoteNotations::Voice(2))
            .with_notation(Attachment::Dynamics("f".into()))
            .apply_single_notations()
            .unwrap();
        assert_eq!(event.voice, 2);
        assert_eq!(event.postfix, vec![Attachment::Dynamics("f".into())]);
        match event.event {
            EventType::Note(pitch) => {
                assert_eq!(pitch.accidental(), Some(Accidental::Flat))
            }
            e => panic!("expected note, got {:?}", e),
        }
        let rest = ParsedEvent::new(beats(0), beats(2), None)
            .with_notation(NoteNotations::Accidental(Accidental::Flat))
            .apply_single_notations();
        assert!(matches!(rest, Err(DomError::Notation(_))));
    }

    #[test]
    fn notations_of_the_timeline() {
        let tm = time_map();
        let mut timeline = Timeline::new(tm.clone());
        timeline
            .push_event(ParsedEvent::new(beats(0), beats(1), Some(60)))
            .unwrap();
        timeline
            .push_event(ParsedEvent::new(beats(0), beats(1), Some(64)))
            .unwrap();
        timeline
            .push_event(
                ParsedEvent::new(beats(1), beats(1), Some(65))
                    .with_notation(Attachment::Ignore),
            )
            .unwrap();
        timeline
            .push_event(ParsedEvent::new(beats(9), beats(1), Some(67)))
            .unwrap();
        timeline.push_pitch_notation(
            beats(0),
            PitchNotation::new(64, Attachment::Trill),
        );
        timeline.push_staff_notation(beats(4), 1, Attachment::Clef(Clef::Bass));
        let staves = timeline
            .into_staves(vec![NotationType::from(Attachment::KeySignature(
                Key::default(),
            ))])
            .unwrap();
        assert_eq!(staves.len(), 1);
        let events = staves[0].voices()[0].events();
        let at = |b: u64| Position::from_beats(beats(b), &tm);

        let first = &events[&at(0)];
        assert!(matches!(first.event, EventType::Chord(_)));
        assert_eq!(first.postfix, vec![Attachment::Trill]);
        assert_eq!(
            first.prefix,
            vec![
                Attachment::TimeSignature(TimeSignature::new(4, 4)),
                Attachment::KeySignature(Key::default()),
            ]
        );
        // ignored note is replaced by rest
        assert!(events[&at(1)].is_rest());
        let carrier = &events[&at(4)];
        assert_eq!(carrier.event, EventType::Spacer);
        assert_eq!(
            carrier.prefix,
            vec![Attachment::BarCheck(2), Attachment::Clef(Clef::Bass)]
        );
        let third_bar = &events[&at(8)];
        assert!(third_bar.prefix.contains(&Attachment::TimeSignature(
            TimeSignature::new(3, 4)
        )));
    }

    #[test]
    fn pitch_notation_without_target() {
        let mut timeline = Timeline::new(time_map());
        timeline
            .push_event(ParsedEvent::new(beats(0), beats(1), Some(60)))
            .unwrap();
        timeline.push_pitch_notation(
            beats(0),
            PitchNotation::new(62, Attachment::Trill),
        );
        assert!(matches!(
            timeline.into_staves(Vec::new()),
            Err(DomError::PitchMismatch { pitch: 62, .. })
        ));
    }
}
