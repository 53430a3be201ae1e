//! Events, holding other events.
use std::{fmt::Display, str::FromStr};

use fraction::Fraction;

use super::{
    fraction_tools::{denom, numer},
    limit_denominator, truncate_to_binary, EventInfo, Length,
    LIMIT_DENOMINATOR,
};
use crate::notation::NotationError;

/// Tuplet ratio as printed: `3/2` is three notes in the time of two.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct TupletRate {
    pub numerator: u64,
    pub denominator: u64,
}
impl TupletRate {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}
impl Display for TupletRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
impl FromStr for TupletRate {
    type Err = NotationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || NotationError::UnexpectedToken(s.to_string());
        let (num, den) = s.split_once('/').ok_or_else(err)?;
        Ok(Self::new(
            num.trim().parse().map_err(|_| err())?,
            den.trim().parse().map_err(|_| err())?,
        ))
    }
}

/// Events of tuplet with their real lengths.
///
/// Ratio is not stored: it is derived from contents on every access.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Tuplet {
    events: Vec<EventInfo>,
}
impl Tuplet {
    pub fn events(&self) -> &[EventInfo] {
        &self.events
    }
    pub(crate) fn push(&mut self, event: EventInfo) {
        self.events.push(event);
    }

    /// Real length of contents against their written (binary) length.
    ///
    /// # Example
    /// ```
    /// # use fraction::Fraction;
    /// # use score_dom::primitives::{
    /// #     EventInfo, EventType, Length, Pitch, Tuplet, TupletRate,
    /// # };
    /// let mut tuplet = EventInfo::new(
    ///     Length::zero(),
    ///     EventType::Tuplet(Tuplet::default()),
    /// );
    /// for midi in [60, 62, 64] {
    ///     let third = Length::from(Fraction::new(1u64, 12u64));
    ///     tuplet.append(EventInfo::note(third, Pitch::from(midi))).unwrap();
    /// }
    /// if let EventType::Tuplet(tuplet) = &tuplet.event {
    ///     assert_eq!(tuplet.rate(), TupletRate::new(3, 2));
    /// }
    /// ```
    pub fn rate(&self) -> TupletRate {
        let zero = Fraction::new(0u64, 1u64);
        let (real, truncated) =
            self.events.iter().fold((zero, zero), |(real, trunc), event| {
                let length = event.length.get();
                (
                    limit_denominator(real + length, LIMIT_DENOMINATOR),
                    trunc + truncate_to_binary(length),
                )
            });
        if truncated == zero {
            return TupletRate::new(1, 1);
        }
        let rate = limit_denominator(real / truncated, LIMIT_DENOMINATOR);
        TupletRate::new(denom(&rate), numer(&rate))
    }

    /// Events with written lengths, as they appear inside the bracket.
    pub fn truncated_events(&self) -> Vec<EventInfo> {
        self.events
            .iter()
            .map(|event| {
                let mut event = event.clone();
                let written = truncate_to_binary(event.length.get());
                event.length = event.length.with_fraction(written);
                event
            })
            .collect()
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum GraceType {
    #[default]
    Grace,
    Acciaccatura,
    Appoggiatura,
    SlashedGrace,
    AfterGrace,
}
impl GraceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grace => "grace",
            Self::Acciaccatura => "acciaccatura",
            Self::Appoggiatura => "appoggiatura",
            Self::SlashedGrace => "slashedGrace",
            Self::AfterGrace => "afterGrace",
        }
    }
}
impl FromStr for GraceType {
    type Err = NotationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grace" => Ok(Self::Grace),
            "acciaccatura" => Ok(Self::Acciaccatura),
            "appoggiatura" => Ok(Self::Appoggiatura),
            "slashedGrace" => Ok(Self::SlashedGrace),
            "afterGrace" => Ok(Self::AfterGrace),
            x => Err(NotationError::UnexpectedToken(x.to_string())),
        }
    }
}

/// Non-metrical group of events, attached to the next event.
#[derive(Debug, PartialEq, Clone)]
pub struct Grace {
    pub grace_type: GraceType,
    events: Vec<EventInfo>,
    length: Length,
}
impl Grace {
    pub fn new(grace_type: GraceType) -> Self {
        Self {
            grace_type,
            events: Vec::new(),
            length: Length::zero(),
        }
    }
    pub fn events(&self) -> &[EventInfo] {
        &self.events
    }
    /// Written length of contents. Is not counted in the bar.
    pub fn length(&self) -> &Length {
        &self.length
    }
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
    /// Zero-length events are ignored.
    pub fn append(&mut self, event: EventInfo) {
        if event.length.is_zero() {
            return;
        }
        self.length += &event.length;
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use fraction::Fraction;

    use crate::primitives::{
        EventInfo, EventType, Grace, GraceType, Length, Pitch, Tuplet,
        TupletRate,
    };

    fn tuplet_of(lengths: &[Fraction]) -> Tuplet {
        let mut event = EventInfo::new(
            Length::zero(),
            EventType::Tuplet(Tuplet::default()),
        );
        for (idx, length) in lengths.iter().enumerate() {
            event
                .append(EventInfo::note(
                    Length::from(*length),
                    Pitch::from(60 + idx as u8),
                ))
                .unwrap();
        }
        match event.event {
            EventType::Tuplet(tuplet) => tuplet,
            _ => panic!("should be tuplet"),
        }
    }

    #[test]
    fn rate_is_derived_from_contents() {
        let third = Fraction::new(1u64, 12u64);
        let tuplet = tuplet_of(&[third, third, third]);
        assert_eq!(tuplet.rate(), TupletRate::new(3, 2));
        assert_eq!(tuplet.rate().to_string(), "3/2");

        let fifth = Fraction::new(1u64, 20u64);
        let tuplet = tuplet_of(&[fifth, fifth, fifth, fifth, fifth]);
        assert_eq!(tuplet.rate(), TupletRate::new(5, 4));

        let tuplet = tuplet_of(&[Fraction::new(1u64, 6u64), third]);
        assert_eq!(tuplet.rate(), TupletRate::new(3, 2));
    }

    #[test]
    fn truncated_events() {
        let third = Fraction::new(1u64, 12u64);
        let tuplet = tuplet_of(&[Fraction::new(1u64, 6u64), third]);
        let lengths: Vec<Length> = tuplet
            .truncated_events()
            .into_iter()
            .map(|e| e.length)
            .collect();
        assert_eq!(lengths, vec![Length::from(0.25), Length::from(0.125)]);
    }

    #[test]
    fn rate_tokens() {
        assert_eq!("5/4".parse::<TupletRate>().unwrap(), TupletRate::new(5, 4));
        assert!("5:4".parse::<TupletRate>().is_err());
    }

    #[test]
    fn grace() {
        let mut grace = Grace::new(GraceType::Acciaccatura);
        grace.append(EventInfo::note(Length::from(0.125), Pitch::from(62)));
        grace.append(EventInfo::rest(Length::zero()));
        assert_eq!(grace.events().len(), 1);
        assert_eq!(grace.length(), &Length::from(0.125));
        assert_eq!(
            "afterGrace".parse::<GraceType>().unwrap(),
            GraceType::AfterGrace
        );
    }
}
