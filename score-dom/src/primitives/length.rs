use std::{
    cmp::Ordering,
    fmt::Display,
    ops::{Add, AddAssign},
};

use derivative::Derivative;
use fraction::Fraction;

use super::{
    fraction_tools::{is_zero, Fractured},
    limit_denominator, TimeSignature, LIMIT_DENOMINATOR,
};

/// Duration of event in whole notes.
///
/// Flags are not the part of identity: two lengths are equal if their
/// fractions are equal.
#[derive(Debug, Clone, Derivative)]
#[derivative(PartialEq)]
pub struct Length {
    fraction: Fraction,
    /// Length of the whole measure, used by full-bar rests.
    #[derivative(PartialEq = "ignore")]
    full_bar: bool,
    /// Tremolo subdivision, like `32` for `c'4:32`.
    #[derivative(PartialEq = "ignore")]
    trem_denom: Option<u32>,
    /// How many identical full bars are folded into this one.
    #[derivative(PartialEq = "ignore")]
    bar_multiplier: u32,
}
impl Eq for Length {}
impl PartialOrd for Length {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Length {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fraction.cmp(&other.fraction)
    }
}
impl Length {
    pub fn zero() -> Self {
        Self::from(Fraction::new(0u64, 1u64))
    }
    /// Length from quarter notes.
    pub fn from_beats(beats: Fraction) -> Self {
        Self::from(beats / Fraction::new(4u64, 1u64))
    }
    /// Length of the whole measure of the given time signature.
    pub fn full_bar(time_signature: &TimeSignature) -> Self {
        let mut length = Self::from(time_signature);
        length.full_bar = true;
        length
    }

    pub fn get(&self) -> Fraction {
        self.fraction
    }
    pub fn is_zero(&self) -> bool {
        is_zero(&self.fraction)
    }
    pub fn is_full_bar(&self) -> bool {
        self.full_bar
    }
    pub fn set_full_bar(&mut self, full_bar: bool) -> &mut Self {
        self.full_bar = full_bar;
        self
    }
    pub fn trem_denom(&self) -> Option<u32> {
        self.trem_denom
    }
    pub fn set_trem_denom(&mut self, trem_denom: Option<u32>) -> &mut Self {
        self.trem_denom = trem_denom;
        self
    }
    pub fn bar_multiplier(&self) -> u32 {
        self.bar_multiplier
    }
    /// Fold one more bar into this length.
    pub fn add_bar(&mut self) -> &mut Self {
        self.bar_multiplier += 1;
        self
    }
    /// Amount of bars this length spans: folded bars plus itself.
    pub fn bars(&self) -> u32 {
        self.bar_multiplier + 1
    }

    /// New length of the same kind.
    ///
    /// Tremolo is kept, as both halves of split note are tremolo.
    /// Bar flags are dropped, as the new length is no longer a whole bar.
    pub fn with_fraction(&self, fraction: Fraction) -> Self {
        let mut length = Self::from(fraction);
        length.trem_denom = self.trem_denom;
        length
    }

    /// None if the result would be negative.
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        match self.fraction >= other.fraction {
            true => Some(self.with_fraction(self.fraction - other.fraction)),
            false => None,
        }
    }
}
impl Fractured for Length {
    fn fraction(&self) -> Fraction {
        self.fraction
    }
}
impl Display for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fraction)
    }
}
impl From<Fraction> for Length {
    fn from(value: Fraction) -> Self {
        Self {
            fraction: limit_denominator(value, LIMIT_DENOMINATOR),
            full_bar: false,
            trem_denom: None,
            bar_multiplier: 0,
        }
    }
}
impl From<f64> for Length {
    fn from(value: f64) -> Self {
        Self::from(Fraction::from(value))
    }
}
impl From<&TimeSignature> for Length {
    fn from(ts: &TimeSignature) -> Self {
        Self::from(ts.length())
    }
}
impl Add for Length {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        &self + &rhs
    }
}
impl Add<&Length> for &Length {
    type Output = Length;
    fn add(self, rhs: &Length) -> Self::Output {
        self.with_fraction(self.fraction + rhs.fraction)
    }
}
impl AddAssign<&Length> for Length {
    fn add_assign(&mut self, rhs: &Length) {
        self.fraction =
            limit_denominator(self.fraction + rhs.fraction, LIMIT_DENOMINATOR);
    }
}
