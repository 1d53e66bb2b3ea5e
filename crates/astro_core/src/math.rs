//! Fixed-point math utilities for damage formulas.
//!
//! Formula arithmetic runs in fixed-point so that a seeded battle replays
//! bit-for-bit on any platform. Rounding follows the game's historical
//! round-half-up rule (`floor(x + 0.5)`), which differs from
//! round-half-away-from-zero for negative halves.

use fixed::types::I32F32;

/// Fixed-point number type for all formula math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// One half, exactly.
pub const HALF: Fixed = Fixed::from_bits(1 << 31);

/// Build a fixed-point number from an integer.
#[must_use]
pub fn fx(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Round half up (`floor(x + 0.5)`), returning an integer. Saturates at
/// the top of the range.
#[must_use]
pub fn round_half_up(value: Fixed) -> i32 {
    value.saturating_add(HALF).floor().to_num::<i32>()
}

/// Integer division `numerator / denominator` rounded half up.
///
/// `denominator` must be positive.
#[must_use]
pub fn div_round(numerator: i32, denominator: i32) -> i32 {
    debug_assert!(denominator > 0, "div_round denominator must be positive");
    let n = i64::from(numerator);
    let d = i64::from(denominator);
    (2 * n + d).div_euclid(2 * d) as i32
}

/// `round(value * percent / 100)`, the scaling used by every percentage in
/// the engine.
#[must_use]
pub fn percent_of(value: i32, percent: i32) -> i32 {
    div_round(value.saturating_mul(percent), 100)
}
