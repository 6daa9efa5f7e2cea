//! Gain-reduction envelope follower.
//!
//! Smooths the static curve's target reduction over time, in the decibel
//! domain. Ballistics are deliberately asymmetric:
//!
//! - **Attack**: instantaneous. When the target asks for more reduction than
//!   the current state, the state jumps to the target in one sample. The
//!   attack time is carried in [`Ballistics`] for API symmetry but does not
//!   parameterize a time constant.
//! - **Release**: exponential one-pole toward the target, with the
//!   coefficient chosen so a step settles to 1/9 of its initial size after
//!   one release interval.
//!
//! One follower per channel; state persists across blocks and is cleared
//! only on prepare.

use crate::dsp::utils::release_coeff;

/// Attack/release coefficients derived once per block.
#[derive(Clone, Copy, Debug)]
pub struct Ballistics {
    /// Kept for symmetry with the release leg; attack is a one-sample jump.
    #[allow(dead_code)]
    attack_ms: f32,
    release_alpha: f32,
}

impl Ballistics {
    pub fn new(attack_ms: f32, release_ms: f32, sample_rate: f32) -> Self {
        Self {
            attack_ms,
            release_alpha: release_coeff(release_ms, sample_rate),
        }
    }

    #[inline]
    pub fn release_alpha(&self) -> f32 {
        self.release_alpha
    }
}

/// Per-channel smoothed gain reduction state (dB, <= 0).
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvelopeFollower {
    smoothed_db: f32,
}

impl EnvelopeFollower {
    pub fn new() -> Self {
        Self { smoothed_db: 0.0 }
    }

    /// Advance the envelope one sample toward `target_db` and return the new
    /// smoothed reduction.
    #[inline]
    pub fn smooth(&mut self, target_db: f32, ballistics: &Ballistics) -> f32 {
        if target_db < self.smoothed_db {
            // Louder relative to threshold: clamp down immediately.
            self.smoothed_db = target_db;
        } else {
            let alpha = ballistics.release_alpha;
            self.smoothed_db = (1.0 - alpha) * target_db + alpha * self.smoothed_db;
        }
        self.smoothed_db
    }

    #[inline]
    pub fn current_db(&self) -> f32 {
        self.smoothed_db
    }

    pub fn reset(&mut self) {
        self.smoothed_db = 0.0;
    }
}
