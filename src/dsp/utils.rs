//! Shared conversion helpers for the signal path.
//!
//! Everything here is branch-light and allocation-free; these functions run
//! inside the per-sample loop.

/// Smallest magnitude treated as signal when converting to decibels.
/// Keeps `log10` away from zero.
pub const DB_EPS: f32 = 1e-10;

/// Detector floor in dB. Digital silence reads as this level instead of -inf.
pub const LEVEL_FLOOR_DB: f32 = -96.0;

/// Settling ratio that defines the release time constant: after one release
/// interval the remaining step is 1/9 of its initial size.
const RELEASE_SETTLE_RATIO: f32 = 9.0;

#[inline]
pub fn lin_to_db(lin: f32) -> f32 {
    20.0 * lin.max(DB_EPS).log10()
}

#[inline]
pub fn db_to_lin(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Instantaneous sample magnitude in dB, floored at [`LEVEL_FLOOR_DB`].
#[inline]
pub fn level_db(sample: f32) -> f32 {
    lin_to_db(sample.abs()).max(LEVEL_FLOOR_DB)
}

/// One-pole release coefficient for a time constant given in milliseconds.
///
/// `alpha = exp(ln(1/9) / (sr * ms / 1000))`, so a step decays to ~11% of its
/// initial size after `ms` elapsed. `ms` is floored at one sample to keep the
/// exponent finite.
#[inline]
pub fn release_coeff(ms: f32, sample_rate: f32) -> f32 {
    let samples = (sample_rate * ms * 1e-3).max(1.0);
    (-(RELEASE_SETTLE_RATIO.ln()) / samples).exp()
}
