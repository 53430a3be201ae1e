//! Tools for optimizing fractions as musical lengths.

use std::collections::VecDeque;

use fraction::Fraction;

/// Numerator of the fraction (0 for NaN).
pub fn numer(frac: &Fraction) -> u64 {
    frac.numer().copied().unwrap_or(0)
}

/// Denominator of the fraction (1 for NaN).
pub fn denom(frac: &Fraction) -> u64 {
    frac.denom().copied().unwrap_or(1)
}

pub fn is_zero(frac: &Fraction) -> bool {
    numer(frac) == 0
}

fn distance(a: Fraction, b: Fraction) -> Fraction {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Find the closest fraction with denominator not bigger than `limit`.
///
/// Fractions are not quantized to the grid of `1/limit`: triplets with
/// denominators less than the limit stay intact.
///
/// By default library uses 1/128.
///
/// # Example
///
/// ```
/// # use fraction::Fraction;
/// # use score_dom::primitives::limit_denominator;
/// assert_eq!(
///     limit_denominator(Fraction::new(1u64, 129u64), 128),
///     Fraction::new(1u64, 128u64)
/// );
/// assert_eq!(
///     limit_denominator(Fraction::new(1u64, 3u64), 128),
///     Fraction::new(1u64, 3u64)
/// );
/// ```
pub fn limit_denominator(frac: Fraction, limit: u64) -> Fraction {
    if frac.is_sign_negative() {
        return -limit_denominator(-frac, limit);
    }
    let limit = limit.max(1);
    let (num, den) = (numer(&frac), denom(&frac));
    if den <= limit {
        return frac;
    }
    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let (mut n, mut d) = (num, den);
    while d != 0 {
        let a = n / d;
        let q2 = q0 + a * q1;
        if q2 > limit {
            break;
        }
        (p0, q0, p1, q1) = (p1, q1, p0 + a * p1, q2);
        (n, d) = (d, n - a * d);
    }
    let k = (limit - q0) / q1;
    let bound1 = Fraction::new(p0 + k * p1, q0 + k * q1);
    let bound2 = Fraction::new(p1, q1);
    if distance(bound2, frac) <= distance(bound1, frac) {
        bound2
    } else {
        bound1
    }
}

/// The largest power of two, strictly less than `num`.
///
/// 0 and 1 are returned as is.
pub fn power_of_two(num: u64) -> u64 {
    if num <= 1 {
        return num;
    }
    1 << (63 - (num - 1).leading_zeros())
}

/// The largest power of two, not bigger than `num`.
///
/// 0 and 1 are returned as is.
pub fn closest_power_of_two(num: u64) -> u64 {
    if num <= 1 {
        return num;
    }
    1 << (63 - num.leading_zeros())
}

/// True if denominator is a power of two, e.g. fraction is not a part of
/// tuplet.
pub fn is_binary(frac: &Fraction) -> bool {
    denom(frac).is_power_of_two()
}

/// Truncate non-binary denominator to the closest power of two.
///
/// `1/12` becomes `1/8`, `1/6` becomes `1/4`.
pub fn truncate_to_binary(frac: Fraction) -> Fraction {
    Fraction::new(numer(&frac), closest_power_of_two(denom(&frac)))
}

/// Shared behaviour of [Position](super::Position) and
/// [Length](super::Length): both are fractions of the whole note.
pub trait Fractured {
    /// Fraction of the whole note, limited by denominator.
    fn fraction(&self) -> Fraction;

    /// Same as fraction, but in quarter notes.
    fn beats(&self) -> Fraction {
        self.fraction() * Fraction::new(4u64, 1u64)
    }

    /// See [normalize_fraction].
    fn normalized(&self) -> VecDeque<Fraction> {
        normalize_fraction(self.fraction())
    }

    /// False if fraction belongs to tuplet.
    fn is_binary(&self) -> bool {
        is_binary(&self.fraction())
    }
}

/// Split complex fraction by simple fractions, that could be interpreted as
/// musical lengths.
///
/// Every fraction in result has numerator 1 or 3 (dotted), unless the
/// denominator is not a power of two.
///
/// # Returns
///
/// Vector of fractions, started with the smallest, up to the largest.
/// Zero gives an empty vector.
///
/// # Example
///
/// ```
/// # use fraction::Fraction;
/// # use score_dom::primitives::normalize_fraction;
/// assert_eq!(
///     normalize_fraction(Fraction::new(13u64, 16u64)),
///         vec![
///             Fraction::new(1u64, 16u64),
///             Fraction::new(1u64, 4u64),
///             Fraction::new(1u64, 2u64)
///         ]
/// );
/// ```
pub fn normalize_fraction(frac: Fraction) -> VecDeque<Fraction> {
    let mut parts = VecDeque::new();
    let mut frac = frac;
    loop {
        let (num, den) = (numer(&frac), denom(&frac));
        if num == 0 {
            return parts;
        }
        if den == 1 || num < 5 || num.is_power_of_two() {
            parts.push_front(frac);
            return parts;
        }
        let whole = power_of_two(num);
        parts.push_front(Fraction::new(whole, den));
        let remainder = Fraction::new(num - whole, den);
        if numer(&remainder) <= 3 {
            parts.push_front(remainder);
            return parts;
        }
        frac = remainder;
    }
}
