use std::{collections::BTreeMap, sync::Arc};

use itertools::Itertools;
use log::{debug, warn};

use super::EventPackager;
use crate::{
    error::{DomError, DomResult},
    notation::{Attachment, NotationType},
    primitives::{
        EventInfo, EventType, Fractured, Length, Position, TimeMap, Tuplet,
    },
};

/// Markup, that is not bound to any event, but to the timeline.
pub type GlobalEvents = BTreeMap<Position, Vec<NotationType>>;

/// Monophonic stream of events (notes and chords), keyed by position.
///
/// Events are inserted through [EventPackager], so bar lines are always
/// respected. Then the voice is finalized: overlaps are resolved, gaps are
/// filled with rests, tuplets are grouped and full-bar rests are folded.
#[derive(Debug, Clone)]
pub struct Voice {
    voice_nr: u8,
    time_map: Arc<TimeMap>,
    pub(super) events: BTreeMap<Position, EventInfo>,
}
impl Voice {
    pub fn new(voice_nr: u8, time_map: &Arc<TimeMap>) -> Self {
        Self {
            voice_nr,
            time_map: time_map.clone(),
            events: BTreeMap::new(),
        }
    }

    pub fn voice_nr(&self) -> u8 {
        self.voice_nr
    }
    pub fn time_map(&self) -> &Arc<TimeMap> {
        &self.time_map
    }
    pub fn events(&self) -> &BTreeMap<Position, EventInfo> {
        &self.events
    }
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Lilypond voice command suffix, like `Two` for `\voiceTwo`.
    ///
    /// First voice does not need any.
    pub fn voice_str(&self) -> Option<&'static str> {
        match self.voice_nr {
            2 => Some("Two"),
            3 => Some("Three"),
            4 => Some("Four"),
            _ => None,
        }
    }

    /// Packager, bound to the position.
    ///
    /// # Example
    /// ```
    /// # use std::sync::Arc;
    /// # use fraction::Fraction;
    /// # use score_dom::dom::Voice;
    /// # use score_dom::primitives::{
    /// #     EventInfo, Length, Pitch, Position, TimeMap, TimeSignature,
    /// # };
    /// let signatures = [TimeSignature::new(4, 4)];
    /// let tm = Arc::new(
    ///     TimeMap::from_time_signatures(1, signatures, Fraction::from(0.0))
    ///         .unwrap(),
    /// );
    /// let mut voice = Voice::new(1, &tm);
    /// voice
    ///     .at(Position::new(Fraction::new(3u64, 4u64), &tm))
    ///     .append(EventInfo::note(Length::from(0.5), Pitch::from(60)))
    ///     .unwrap();
    /// assert_eq!(voice.events().len(), 2);
    /// ```
    pub fn at(&mut self, position: Position) -> EventPackager<'_> {
        EventPackager::new(self, position)
    }

    pub fn insert(
        &mut self,
        position: Position,
        event: EventInfo,
    ) -> DomResult<()> {
        self.at(position).append(event)
    }

    fn first_overlap(
        &self,
        from: Option<&Position>,
    ) -> Option<(Position, Position)> {
        self.events
            .iter()
            .skip_while(|(position, _)| {
                from.map_or(false, |from| *position < from)
            })
            .tuple_windows()
            .find(|((position, event), (next, _))| {
                &(*position + &event.length) > *next
            })
            .map(|((position, _), (next, _))| (position.clone(), next.clone()))
    }

    /// Resolve overlaps, cutting long events and merging their tails into
    /// the following events.
    ///
    /// Every fixed overlap should be later than the previous one, otherwise
    /// [DomError::UnresolvedOverlap] is returned.
    pub fn sort(&mut self) -> DomResult<()> {
        let mut fixed: Option<Position> = None;
        while let Some((position, next)) = self.first_overlap(fixed.as_ref()) {
            if let Some(fixed) = &fixed {
                if position <= *fixed {
                    return Err(DomError::UnresolvedOverlap {
                        position: position.to_string(),
                    });
                }
            }
            debug!("resolving overlap at {} with {}", position, next);
            let event = self.events.remove(&position).ok_or_else(|| {
                DomError::UnresolvedOverlap {
                    position: position.to_string(),
                }
            })?;
            let (head, tail) = event.split(&(&next - &position), true)?;
            self.events.insert(position.clone(), head);
            self.at(next).append(tail)?;
            fixed = Some(position);
        }
        Ok(())
    }

    /// Fill every gap with rests, respecting bar lines.
    ///
    /// Gap before the first event starts from the TimeMap start. The last
    /// bar is filled up to its end.
    pub fn with_rests(self) -> DomResult<Self> {
        let mut voice = Self::new(self.voice_nr, &self.time_map);
        let mut last = Position::origin(&self.time_map);
        let mut last_start = last.clone();
        for (position, event) in self.events {
            if position < last {
                return Err(DomError::Overlap {
                    position: last_start.to_string(),
                    end: last.to_string(),
                    next: position.to_string(),
                });
            }
            voice.fill_gap(&last, &position)?;
            last = &position + &event.length;
            last_start = position.clone();
            voice.at(position).append(event)?;
        }
        if !last.is_bar_start() {
            let end = &last + &Length::from(last.bar_end_distance());
            voice.fill_gap(&last, &end)?;
        }
        Ok(voice)
    }

    fn fill_gap(&mut self, from: &Position, to: &Position) -> DomResult<()> {
        let distance = match from.percize_distance(to) {
            Some(distance) => distance,
            None => return Ok(()),
        };
        if let Some(before) = &distance.before_first_barline {
            let rest = self.rest(before.clone());
            self.at(from.clone()).append(rest)?;
        }
        for measure in distance.full_measures() {
            let info = self.time_map.get_measure_info(measure);
            let rest = self.rest(Length::full_bar(&info.time_signature));
            self.at(Position::from_measure(measure, &self.time_map))
                .append(rest)?;
        }
        if let Some(after) = &distance.after_last_barline {
            let start = to - after;
            let rest = self.rest(after.clone());
            self.at(start).append(rest)?;
        }
        Ok(())
    }

    fn rest(&self, length: Length) -> EventInfo {
        EventInfo::rest(length).with_voice(self.voice_nr)
    }

    /// Group events of non-binary position or length into tuplets.
    ///
    /// Grouping can also be forced by [Attachment::TupletBegin] and
    /// [Attachment::TupletEnd].
    pub fn with_tuplets(self) -> DomResult<Self> {
        let mut events = BTreeMap::new();
        let mut tuplet: Option<(Position, EventInfo)> = None;
        let mut forced = false;
        for (position, mut event) in self.events {
            if event.prefix.contains(&Attachment::TupletBegin) {
                forced = true;
            }
            let in_tuplet =
                forced || !position.is_binary() || !event.length.is_binary();
            if !in_tuplet {
                if let Some((start, container)) = tuplet.take() {
                    events.insert(start, container);
                }
                events.insert(position, event);
                continue;
            }
            let closes = event.postfix.contains(&Attachment::TupletEnd);
            let (_, container) = tuplet.get_or_insert_with(|| {
                let mut container = EventInfo::new(
                    Length::zero(),
                    EventType::Tuplet(Tuplet::default()),
                )
                .with_voice(self.voice_nr)
                .with_staff(event.staff);
                container.prefix.extend(
                    event
                        .prefix
                        .iter()
                        .filter(|a| matches!(a, Attachment::BarCheck(_)))
                        .cloned(),
                );
                event.prefix.retain(|a| !matches!(a, Attachment::BarCheck(_)));
                (position.clone(), container)
            });
            container.append(event)?;
            if closes {
                forced = false;
                if let Some((start, container)) = tuplet.take() {
                    events.insert(start, container);
                }
            }
        }
        if let Some((start, container)) = tuplet.take() {
            events.insert(start, container);
        }
        Ok(Self {
            events,
            ..self
        })
    }

    /// Apply markup at positions, where voice has events.
    ///
    /// Positions after the last event are dropped. If forced, for every
    /// other position the carrier of [EventType::Global] is inserted.
    ///
    /// # Returns
    /// Markup, that was not applied.
    pub fn apply_global_events(
        &mut self,
        globals: &GlobalEvents,
        forced: bool,
    ) -> DomResult<GlobalEvents> {
        let mut deferred = GlobalEvents::new();
        let last = match self.events.keys().next_back() {
            Some(last) => last.clone(),
            None => {
                debug!("voice {} is empty, globals are ignored", self.voice_nr);
                return Ok(deferred);
            }
        };
        for (position, notations) in globals {
            if let Some(event) = self.events.get_mut(position) {
                for notation in notations {
                    notation.apply_to_event(event)?;
                }
                continue;
            }
            if *position > last {
                warn!("global notations after the last event: {}", position);
                continue;
            }
            if *position < Position::origin(&self.time_map) {
                warn!("global notations before the start: {}", position);
                continue;
            }
            if !forced {
                deferred.insert(position.clone(), notations.clone());
                continue;
            }
            let mut carrier = EventInfo::new(Length::zero(), EventType::Global)
                .with_voice(self.voice_nr);
            for notation in notations {
                notation.apply_to_event(&mut carrier)?;
            }
            self.events.insert(position.clone(), carrier);
        }
        Ok(deferred)
    }

    fn is_plain_bar_rest(event: &EventInfo) -> bool {
        event.is_rest()
            && event.length.is_full_bar()
            && event.postfix.is_empty()
            && event
                .prefix
                .iter()
                .all(|a| matches!(a, Attachment::BarCheck(_)))
    }

    /// Fold runs of identical full-bar rests into one multi-bar rest.
    pub fn with_compressed_rests(self) -> Self {
        let mut events: BTreeMap<Position, EventInfo> = BTreeMap::new();
        let mut head: Option<Position> = None;
        for (position, event) in self.events {
            if !Self::is_plain_bar_rest(&event) {
                head = None;
                events.insert(position, event);
                continue;
            }
            let stored = head.as_ref().and_then(|h| events.get_mut(h));
            if let Some(stored) = stored {
                if stored.length == event.length {
                    stored.length.add_bar();
                    continue;
                }
            }
            head = Some(position.clone());
            events.insert(position, event);
        }
        Self {
            events,
            ..self
        }
    }

    /// Make voice ready for rendering.
    ///
    /// Deferred global markup is forced to the voice, when it is already
    /// filled with rests.
    pub fn finalized(mut self, deferred: &GlobalEvents) -> DomResult<Self> {
        self.sort()?;
        let mut voice = self.with_rests()?.with_tuplets()?;
        voice.apply_global_events(deferred, true)?;
        Ok(voice.with_compressed_rests())
    }
}
