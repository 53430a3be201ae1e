//! Placing events to Voice with respect to bar lines.
use std::collections::VecDeque;

use log::debug;

use super::Voice;
use crate::{
    error::{DomError, DomResult},
    notation::Attachment,
    primitives::{normalize_fraction, EventInfo, EventType, Length, Position},
};

/// Inserts event to the voice at position.
///
/// Events are split at bar lines and by simple lengths, all the parts are
/// tied. If position is already occupied, events are merged into chord.
pub struct EventPackager<'a> {
    voice: &'a mut Voice,
    position: Position,
}
impl<'a> EventPackager<'a> {
    pub fn new(voice: &'a mut Voice, position: Position) -> Self {
        Self { voice, position }
    }

    /// Place event and every part, split from it.
    ///
    /// Positions before the TimeMap start have no bars to respect, so they
    /// are rejected with [DomError::BeforeStart].
    pub fn append(self, event: EventInfo) -> DomResult<()> {
        if self.position < Position::origin(self.voice.time_map()) {
            return Err(DomError::BeforeStart {
                position: self.position.to_string(),
            });
        }
        let mut queue = VecDeque::from([(self.position, event)]);
        while let Some((position, event)) = queue.pop_front() {
            if event.length.is_zero() {
                debug!("dropping zero-length event at {}", position);
                continue;
            }
            let parts = match self.voice.events.contains_key(&position) {
                true => Self::merge(self.voice, position, event)?,
                false => Self::place(self.voice, position, event)?,
            };
            queue.extend(parts);
        }
        Ok(())
    }

    /// Put event to the free position.
    ///
    /// # Returns
    /// Parts, which should be placed next.
    fn place(
        voice: &mut Voice,
        position: Position,
        mut event: EventInfo,
    ) -> DomResult<Vec<(Position, EventInfo)>> {
        if position.is_bar_start()
            && !position.is_origin()
            && !event.has_attachment(&Attachment::BarCheck(0))
        {
            event.prefix.insert(0, Attachment::BarCheck(position.bar()));
        }
        let bar_end = Length::from(position.bar_end_distance());
        let mut next = Vec::new();
        let mut left = match event.length > bar_end {
            true => {
                let (left, right) = event.split(&bar_end, true)?;
                debug!("event at {} crosses bar line, splitting", position);
                next.push((&position + &bar_end, right));
                left
            }
            false => event,
        };
        if left.length.is_full_bar() {
            voice.events.insert(position, left);
            return Ok(next);
        }

        let mut current = position;
        let mut fragments = Vec::new();
        for part in normalize_fraction(bar_end.get()) {
            if left.length.get() <= part {
                break;
            }
            let (head, tail) = left.split(&Length::from(part), true)?;
            let head_end = &current + &head.length;
            fragments.push((current, head));
            current = head_end;
            left = tail;
        }
        fragments.push((current, left));

        // The first fragment occupies the free position, others may collide
        // with already placed events, so they go through the queue.
        let mut fragments = fragments.into_iter();
        if let Some((position, fragment)) = fragments.next() {
            voice.events.insert(position, fragment);
        }
        let mut parts: Vec<_> = fragments.collect();
        parts.extend(next);
        Ok(parts)
    }

    /// Merge event with the one, stored at position.
    ///
    /// # Returns
    /// Tails, which should be placed next.
    fn merge(
        voice: &mut Voice,
        position: Position,
        event: EventInfo,
    ) -> DomResult<Vec<(Position, EventInfo)>> {
        let stored = match voice.events.get_mut(&position) {
            Some(stored) => stored,
            None => return Self::place(voice, position, event),
        };
        if matches!(stored.event, EventType::Tuplet(_) | EventType::Global)
            || matches!(event.event, EventType::Tuplet(_) | EventType::Global)
        {
            return Err(DomError::UnexpectedEvent {
                context: position.to_string(),
                event: format!("{:?}", event.event),
            });
        }
        if !event.is_sounding() {
            debug!("rest at occupied position {} is ignored", position);
            return Ok(Vec::new());
        }
        if !stored.is_sounding() {
            debug!("note replaces rest at {}", position);
            let mut event = event;
            let mut next = Vec::new();
            if let Some(rest) = voice.events.remove(&position) {
                for attachment in rest.prefix.iter() {
                    attachment.apply_to_event(&mut event);
                }
                match rest.length > event.length {
                    true => {
                        let (_, tail) = rest.split(&event.length, false)?;
                        next.push((&position + &event.length, tail));
                    }
                    false => {
                        for attachment in rest.postfix.iter() {
                            attachment.apply_to_event(&mut event);
                        }
                    }
                }
            }
            next.insert(0, (position, event));
            return Ok(next);
        }
        if stored.length == event.length {
            stored.merge_chord(event)?;
            return Ok(Vec::new());
        }
        let (head_length, tail) = match stored.length < event.length {
            true => {
                let (head, tail) = event.split(&stored.length, true)?;
                stored.merge_chord(head)?;
                (stored.length.clone(), tail)
            }
            false => {
                let (mut head, tail) = stored.split(&event.length, true)?;
                head.merge_chord(event)?;
                let head_length = head.length.clone();
                *stored = head;
                (head_length, tail)
            }
        };
        Ok(vec![(&position + &head_length, tail)])
    }
}
