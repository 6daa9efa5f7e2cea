//! Static compression curve.
//!
//! Pure mapping from detector level to target gain reduction; all smoothing
//! lives in the envelope follower. Feedforward, hard knee.

use crate::dsp::utils::LEVEL_FLOOR_DB;

/// Target gain reduction in dB for a given input level.
///
/// Levels at or below the threshold ask for no reduction. Above it, the
/// output level is pulled toward the threshold by `ratio`:
/// `out = threshold + (level - threshold) / ratio`, and the reduction is
/// `out - level`, which is zero or negative. `ratio == 1` is a no-op.
///
/// The level is floored at -96 dB first so digital silence compares as a
/// finite level rather than -inf.
#[inline]
pub fn target_gain_reduction_db(level_db: f32, threshold_db: f32, ratio: f32) -> f32 {
    let level = level_db.max(LEVEL_FLOOR_DB);
    if level <= threshold_db {
        return 0.0;
    }
    let over = level - threshold_db;
    let target_level = threshold_db + over / ratio;
    target_level - level
}
