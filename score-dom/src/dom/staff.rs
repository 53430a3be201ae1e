use std::{collections::BTreeMap, sync::Arc};

use log::{debug, warn};

use super::{GlobalEvents, Voice};
use crate::{
    error::DomResult,
    notation::{Attachment, Clef},
    primitives::{EventInfo, Grace, GraceType, Position, TimeMap},
};

/// Events of one staff or voice, grouped by position in order of arrival.
pub type EventsByPosition = BTreeMap<Position, Vec<EventInfo>>;

#[derive(Debug, Clone)]
pub struct Staff {
    staff_nr: u8,
    clef: Clef,
    voices: Vec<Voice>,
    globals: GlobalEvents,
}
impl Staff {
    /// First staff is treble by default, others are bass.
    pub fn new(staff_nr: u8) -> Self {
        let clef = match staff_nr {
            1 => Clef::Treble,
            _ => Clef::Bass,
        };
        Self {
            staff_nr,
            clef,
            voices: Vec::new(),
            globals: GlobalEvents::new(),
        }
    }
    pub fn staff_nr(&self) -> u8 {
        self.staff_nr
    }
    pub fn clef(&self) -> Clef {
        self.clef
    }
    pub fn set_clef(&mut self, clef: Clef) -> &mut Self {
        self.clef = clef;
        self
    }
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }
    pub fn push(&mut self, voice: Voice) {
        self.voices.push(voice)
    }

    /// Markup, which is applied to every voice on finalization.
    pub fn apply_global_events(&mut self, globals: &GlobalEvents) {
        for (position, notations) in globals {
            self.globals
                .entry(position.clone())
                .or_default()
                .extend(notations.iter().cloned());
        }
    }

    /// Finalize every voice.
    ///
    /// Global markup is applied to existing events first, and the rest of
    /// it is forced when voices are filled with rests.
    pub fn finalized(self) -> DomResult<Self> {
        let mut voices = Vec::with_capacity(self.voices.len());
        for mut voice in self.voices {
            let deferred = voice.apply_global_events(&self.globals, false)?;
            voices.push(voice.finalized(&deferred)?);
        }
        Ok(Self {
            voices,
            globals: GlobalEvents::new(),
            ..self
        })
    }
}

fn grace_begin(event: &EventInfo) -> Option<Grace> {
    event.prefix.iter().find_map(|a| match a {
        Attachment::GraceBegin(grace_type) => Some(Grace::new(*grace_type)),
        _ => None,
    })
}

/// Group events by voice number. Voices are sorted by number.
///
/// Events between [Attachment::GraceBegin] and [Attachment::GraceEnd] are
/// not placed in time: they are collected to [Grace], which is attached to
/// the next event of the voice.
pub fn split_by_voice(
    events: EventsByPosition,
    time_map: &Arc<TimeMap>,
) -> DomResult<Vec<Voice>> {
    let mut voices: BTreeMap<u8, Voice> = BTreeMap::new();
    let mut open: BTreeMap<u8, Grace> = BTreeMap::new();
    let mut pending: BTreeMap<u8, Grace> = BTreeMap::new();
    for (position, events) in events {
        for mut event in events {
            let voice_nr = event.voice;
            if !open.contains_key(&voice_nr) {
                if let Some(grace) = grace_begin(&event) {
                    open.insert(voice_nr, grace);
                }
            }
            if let Some(grace) = open.get_mut(&voice_nr) {
                let closes = event.postfix.contains(&Attachment::GraceEnd);
                event
                    .prefix
                    .retain(|a| !matches!(a, Attachment::GraceBegin(_)));
                event.postfix.retain(|a| *a != Attachment::GraceEnd);
                grace.append(event);
                if closes {
                    if let Some(grace) = open.remove(&voice_nr) {
                        // after-grace follows the previous event of the voice
                        let previous = match grace.grace_type {
                            GraceType::AfterGrace => {
                                voices.get_mut(&voice_nr).and_then(|v| {
                                    v.events.values_mut().next_back()
                                })
                            }
                            _ => None,
                        };
                        match previous {
                            Some(event) => {
                                event.prefix.push(Attachment::Grace(grace))
                            }
                            None => {
                                pending.insert(voice_nr, grace);
                            }
                        }
                    }
                }
                continue;
            }
            if let Some(grace) = pending.remove(&voice_nr) {
                debug!("attaching grace to event at {}", position);
                event.prefix.push(Attachment::Grace(grace));
            }
            voices
                .entry(voice_nr)
                .or_insert_with(|| Voice::new(voice_nr, time_map))
                .insert(position.clone(), event)?;
        }
    }
    for (voice_nr, _) in open.into_iter().chain(pending) {
        warn!("grace in voice {} has no event to attach to", voice_nr);
    }
    let mut voices: Vec<Voice> = voices.into_values().collect();
    for voice in voices.iter_mut() {
        voice.sort()?;
    }
    Ok(voices)
}

/// Group events by staff and voice. Staves are sorted by number.
pub fn split_by_staff(
    events: EventsByPosition,
    time_map: &Arc<TimeMap>,
) -> DomResult<Vec<Staff>> {
    let mut by_staff: BTreeMap<u8, EventsByPosition> = BTreeMap::new();
    for (position, events) in events {
        for event in events {
            by_staff
                .entry(event.staff)
                .or_default()
                .entry(position.clone())
                .or_default()
                .push(event);
        }
    }
    let mut staves = Vec::with_capacity(by_staff.len());
    for (staff_nr, events) in by_staff {
        let mut staff = Staff::new(staff_nr);
        for voice in split_by_voice(events, time_map)? {
            staff.push(voice);
        }
        staves.push(staff);
    }
    Ok(staves)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fraction::Fraction;

    use super::{split_by_staff, EventsByPosition, Staff};
    use crate::{
        dom::GlobalEvents,
        notation::{Attachment, Clef, NotationType},
        primitives::{
            EventInfo, GraceType, Key, Length, Pitch, Position, TimeMap,
            TimeSignature,
        },
    };

    fn time_map() -> Arc<TimeMap> {
        Arc::new(
            TimeMap::from_time_signatures(
                1,
                [TimeSignature::new(4, 4), TimeSignature::new(4, 4)],
                Fraction::from(0.0),
            )
            .unwrap(),
        )
    }

    fn note(midi: u8, voice: u8, staff: u8) -> EventInfo {
        EventInfo::note(Length::from(0.25), Pitch::from(midi))
            .with_voice(voice)
            .with_staff(staff)
    }

    #[test]
    fn events_are_split_by_staff_and_voice() {
        let tm = time_map();
        let at = |beats: u64| Position::from_beats(Fraction::from(beats), &tm);
        let events = EventsByPosition::from([
            (at(0), vec![note(60, 2, 1), note(48, 1, 2), note(72, 1, 1)]),
            (at(1), vec![note(62, 1, 1)]),
        ]);
        let staves = split_by_staff(events, &tm).unwrap();
        assert_eq!(staves.len(), 2);
        assert_eq!(staves[0].clef(), Clef::Treble);
        assert_eq!(staves[1].clef(), Clef::Bass);
        let voices: Vec<_> = staves[0]
            .voices()
            .iter()
            .map(|v| (v.voice_nr(), v.events().len()))
            .collect();
        assert_eq!(voices, vec![(1, 2), (2, 1)]);
    }

    #[test]
    fn grace_is_attached_to_the_next_event() {
        let tm = time_map();
        let at = |beats: u64| Position::from_beats(Fraction::from(beats), &tm);
        let mut first = note(74, 1, 1);
        first.prefix.push(Attachment::GraceBegin(GraceType::Acciaccatura));
        let mut second = note(76, 1, 1);
        second.postfix.push(Attachment::GraceEnd);
        let events = EventsByPosition::from([
            (at(0), vec![first]),
            (at(1), vec![second]),
            (at(2), vec![note(72, 1, 1)]),
        ]);
        let staves = split_by_staff(events, &tm).unwrap();
        let voice = &staves[0].voices()[0];
        assert_eq!(voice.events().len(), 1);
        let event = &voice.events()[&at(2)];
        match &event.prefix[..] {
            [Attachment::Grace(grace)] => {
                assert_eq!(grace.grace_type, GraceType::Acciaccatura);
                assert_eq!(grace.events().len(), 2);
                assert!(grace.events()[1].postfix.is_empty());
            }
            prefix => panic!("expected grace, got {:?}", prefix),
        }
    }

    #[test]
    fn globals_reach_every_voice() {
        let tm = time_map();
        let at = |beats: u64| Position::from_beats(Fraction::from(beats), &tm);
        let events = EventsByPosition::from([
            (at(0), vec![note(72, 1, 1), note(60, 2, 1)]),
            (at(6), vec![note(72, 1, 1)]),
        ]);
        let mut staves = split_by_staff(events, &tm).unwrap();
        let mut staff: Staff = staves.remove(0);
        let key = Attachment::KeySignature(Key::default());
        staff.apply_global_events(&GlobalEvents::from([(
            at(4),
            vec![NotationType::from(key.clone())],
        )]));
        let staff = staff.finalized().unwrap();
        let first = &staff.voices()[0].events()[&at(4)];
        assert!(first.prefix.contains(&key));
        // second voice ends before, so the key is dropped there
        assert!(!staff.voices()[1].events().contains_key(&at(4)));
    }
}
