//! Everything needed to manipulate positions of events.
//!
//! Position is the distance from the start of the timeline in whole notes.
//! On construction it looks up the measure it belongs to (by the
//! [TimeMap]) and keeps the relative information: bar index, distance from
//! the bar start and to the bar end.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use fraction::Fraction;
//! use score_dom::primitives::{Length, Position, TimeMap, TimeSignature};
//!
//! let time_map = Arc::new(
//!     TimeMap::from_time_signatures(
//!         1,
//!         [TimeSignature::new(7, 8), TimeSignature::new(5, 8)],
//!         Fraction::from(0.0),
//!     )
//!     .unwrap(),
//! );
//! let a = Position::new(Fraction::new(3u64, 8u64), &time_map);
//! let b = Position::new(Fraction::new(10u64, 8u64), &time_map);
//! assert_eq!(a.bar(), 1);
//! assert_eq!(b.bar(), 2);
//! assert_eq!(b.bar_position(), Fraction::new(3u64, 8u64));
//! assert_eq!(b.bar_end_distance(), Fraction::new(2u64, 8u64));
//!
//! let distance = a.percize_distance(&b).unwrap();
//! assert_eq!(
//!     distance.before_first_barline,
//!     Some(Length::from(Fraction::new(4u64, 8u64)))
//! );
//! assert_eq!(distance.measures, 0);
//! assert_eq!(
//!     distance.after_last_barline,
//!     Some(Length::from(Fraction::new(3u64, 8u64)))
//! );
//! ```

use std::{
    cmp::Ordering,
    fmt::Display,
    ops::{Add, Range, Sub},
    sync::Arc,
};

use derivative::Derivative;
use fraction::Fraction;

use super::{
    fraction_tools::{is_zero, Fractured},
    limit_denominator,
    time_map::TimeMap,
    Length, LIMIT_DENOMINATOR,
};

/// Distance between two positions, split by barlines.
#[derive(Debug, PartialEq, Clone)]
pub struct RelativeDistance {
    /// from the left position to the first barline.
    ///
    /// None if the left position is at the bar start.
    pub before_first_barline: Option<Length>,
    /// index of the first measure, fully covered by distance
    pub first_full_measure: u32,
    /// amount of fully covered measures
    pub measures: u32,
    /// from the last barline to the right position.
    ///
    /// None if the right position is at the bar start.
    pub after_last_barline: Option<Length>,
}
impl RelativeDistance {
    /// Indexes of fully covered measures.
    pub fn full_measures(&self) -> Range<u32> {
        self.first_full_measure..self.first_full_measure + self.measures
    }
}

/// Absolute position in whole notes with cached bar information.
///
/// Equality and ordering use only the absolute fraction.
#[derive(Clone, Derivative)]
#[derivative(Debug, PartialEq)]
pub struct Position {
    fraction: Fraction,
    #[derivative(PartialEq = "ignore")]
    bar: u32,
    #[derivative(PartialEq = "ignore")]
    bar_position: Fraction,
    #[derivative(PartialEq = "ignore")]
    bar_end_distance: Fraction,
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    time_map: Arc<TimeMap>,
}
impl Eq for Position {}
impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fraction.cmp(&other.fraction)
    }
}
impl Position {
    /// By default, limits denominator to 1/128
    pub fn new(fraction: Fraction, time_map: &Arc<TimeMap>) -> Self {
        let fraction = limit_denominator(fraction, LIMIT_DENOMINATOR);
        let (measure, start) =
            time_map.get_measure_from_absolute_position(fraction);
        let bar_position = match fraction > start {
            true => limit_denominator(fraction - start, LIMIT_DENOMINATOR),
            false => Fraction::new(0u64, 1u64),
        };
        let bar_end_distance = limit_denominator(
            measure.length.get() - bar_position,
            LIMIT_DENOMINATOR,
        );
        Self {
            fraction,
            bar: measure.index,
            bar_position,
            bar_end_distance,
            time_map: time_map.clone(),
        }
    }

    /// Position from quarter notes.
    pub fn from_beats(beats: Fraction, time_map: &Arc<TimeMap>) -> Self {
        Self::new(beats / Fraction::new(4u64, 1u64), time_map)
    }

    /// Start of the given measure.
    pub fn from_measure(measure_index: u32, time_map: &Arc<TimeMap>) -> Self {
        Self::new(
            time_map.get_absolute_position_of_measure(measure_index),
            time_map,
        )
    }

    /// The very start of the TimeMap.
    pub fn origin(time_map: &Arc<TimeMap>) -> Self {
        Self::new(time_map.start_position(), time_map)
    }

    pub fn get(&self) -> Fraction {
        self.fraction
    }
    /// 1-based index of the measure.
    pub fn bar(&self) -> u32 {
        self.bar
    }
    /// Distance from the bar start.
    pub fn bar_position(&self) -> Fraction {
        self.bar_position
    }
    /// Distance to the bar end.
    pub fn bar_end_distance(&self) -> Fraction {
        self.bar_end_distance
    }
    pub fn time_map(&self) -> &Arc<TimeMap> {
        &self.time_map
    }
    pub fn is_bar_start(&self) -> bool {
        is_zero(&self.bar_position)
    }
    pub fn is_origin(&self) -> bool {
        self.fraction == self.time_map.start_position()
    }

    /// Split distance between positions by barlines.
    ///
    /// Order of positions does not matter.
    ///
    /// # Returns
    /// - None if positions are equal.
    /// - If positions are in the same bar, the whole distance is placed
    /// before the first barline.
    pub fn percize_distance(&self, other: &Self) -> Option<RelativeDistance> {
        let (first, last) = match self.cmp(other) {
            Ordering::Equal => return None,
            Ordering::Less => (self, other),
            Ordering::Greater => (other, self),
        };
        if first.bar == last.bar {
            return Some(RelativeDistance {
                before_first_barline: Some(Length::from(
                    last.fraction - first.fraction,
                )),
                first_full_measure: first.bar,
                measures: 0,
                after_last_barline: None,
            });
        }
        let before = match first.is_bar_start() {
            true => None,
            false => Some(Length::from(first.bar_end_distance)),
        };
        let after = match last.is_bar_start() {
            true => None,
            false => Some(Length::from(last.bar_position)),
        };
        let first_full_measure = match before {
            Some(_) => first.bar + 1,
            None => first.bar,
        };
        Some(RelativeDistance {
            before_first_barline: before,
            first_full_measure,
            measures: last.bar.saturating_sub(first_full_measure),
            after_last_barline: after,
        })
    }
}
impl Fractured for Position {
    fn fraction(&self) -> Fraction {
        self.fraction
    }
}
impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Position bar:{}, bar_position:{}, from start:{}>",
            self.bar, self.bar_position, self.fraction
        )
    }
}
impl Add<&Length> for &Position {
    type Output = Position;
    fn add(self, rhs: &Length) -> Self::Output {
        Position::new(self.fraction + rhs.get(), &self.time_map)
    }
}
impl Sub<&Length> for &Position {
    type Output = Position;
    /// Saturates at zero.
    fn sub(self, rhs: &Length) -> Self::Output {
        let fraction = match self.fraction > rhs.get() {
            true => self.fraction - rhs.get(),
            false => Fraction::new(0u64, 1u64),
        };
        Position::new(fraction, &self.time_map)
    }
}
impl Sub for &Position {
    type Output = Length;
    /// Absolute distance between positions.
    fn sub(self, rhs: &Position) -> Self::Output {
        match self > rhs {
            true => Length::from(self.fraction - rhs.fraction),
            false => Length::from(rhs.fraction - self.fraction),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fraction::Fraction;

    use crate::primitives::{
        Fractured, Length, Position, TimeMap, TimeSignature,
    };

    fn time_map() -> Arc<TimeMap> {
        Arc::new(
            TimeMap::from_time_signatures(
                1,
                [
                    TimeSignature::new(4, 4),
                    TimeSignature::new(4, 4),
                    TimeSignature::new(7, 8),
                    TimeSignature::new(4, 4),
                ],
                Fraction::from(0.0),
            )
            .unwrap(),
        )
    }

    fn beats(time_map: &Arc<TimeMap>, beats: f64) -> Position {
        Position::from_beats(Fraction::from(beats), time_map)
    }

    #[test]
    fn bar_info() {
        let tm = time_map();
        let pos = beats(&tm, 1.5);
        assert_eq!(pos.bar(), 1);
        assert_eq!(pos.get(), Fraction::new(3u64, 8u64));
        assert_eq!(pos.bar_position(), Fraction::new(3u64, 8u64));
        assert_eq!(pos.bar_end_distance(), Fraction::new(5u64, 8u64));
        assert_eq!(pos.beats(), Fraction::new(3u64, 2u64));

        let pos = beats(&tm, 9.0);
        assert_eq!(pos.bar(), 3);
        assert_eq!(pos.bar_position(), Fraction::new(1u64, 4u64));
        assert_eq!(pos.bar_end_distance(), Fraction::new(5u64, 8u64));
        assert!(beats(&tm, 8.0).is_bar_start());
        assert!(beats(&tm, 0.0).is_origin());
    }

    #[test]
    fn arithmetics() {
        let tm = time_map();
        let pos = beats(&tm, 3.0);
        let moved = &pos + &Length::from(0.5);
        assert_eq!(moved, beats(&tm, 5.0));
        assert_eq!(moved.bar(), 2);
        assert_eq!(&moved - &Length::from(0.5), pos);
        assert_eq!(&moved - &pos, Length::from(0.5));
        assert_eq!(&pos - &moved, Length::from(0.5));
        assert!(pos < moved);
    }

    #[test]
    fn distance_in_the_same_bar() {
        let tm = time_map();
        for (a, b) in [(0.0, 3.0), (1.5, 2.25), (4.0, 7.5), (9.0, 8.5)] {
            let (a, b) = (beats(&tm, a), beats(&tm, b));
            let distance = a.percize_distance(&b).unwrap();
            assert_eq!(distance.before_first_barline, Some(&a - &b));
            assert_eq!(distance.measures, 0);
            assert_eq!(distance.after_last_barline, None);
        }
        assert_eq!(beats(&tm, 1.0).percize_distance(&beats(&tm, 1.0)), None);
    }

    #[test]
    fn distance_across_bars() {
        let tm = time_map();
        let distance = beats(&tm, 3.0)
            .percize_distance(&beats(&tm, 6.5))
            .unwrap();
        assert_eq!(distance.before_first_barline, Some(Length::from(0.25)));
        assert_eq!(distance.measures, 0);
        assert_eq!(
            distance.after_last_barline,
            Some(Length::from(Fraction::new(5u64, 8u64)))
        );

        let distance = beats(&tm, 0.0)
            .percize_distance(&beats(&tm, 6.5))
            .unwrap();
        assert_eq!(distance.before_first_barline, None);
        assert_eq!(distance.measures, 1);
        assert_eq!(distance.full_measures(), 1..2);
    }

    #[test]
    fn distance_reconstructs_whole_length() {
        let tm = time_map();
        for (a, b) in
            [(3.0, 21.5), (0.0, 16.0), (1.0, 11.5), (4.0, 8.0), (2.5, 30.0)]
        {
            let (a, b) = (beats(&tm, a), beats(&tm, b));
            let distance = a.percize_distance(&b).unwrap();
            let mut sum = Length::zero();
            if let Some(before) = &distance.before_first_barline {
                sum += before;
            }
            for measure in distance.full_measures() {
                sum += &tm.get_measure_info(measure).length;
            }
            if let Some(after) = &distance.after_last_barline {
                sum += after;
            }
            assert_eq!(sum, &b - &a);
        }
    }
}
