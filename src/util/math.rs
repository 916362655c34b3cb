//! Integer geometry helpers for the neighborhood tables.

/// Rounds `num / den` to the nearest integer, ties away from zero.
///
/// `den` must be positive.
pub(crate) fn div_round_half_away(num: i32, den: i32) -> i32 {
    debug_assert!(den > 0);
    let magnitude = (2 * num.abs() + den) / (2 * den);
    if num < 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Chebyshev length of an offset.
pub(crate) fn chebyshev_len(dpad: i32, dtime: i32) -> i32 {
    dpad.abs().max(dtime.abs())
}
