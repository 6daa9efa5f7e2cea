//! Feedforward single-band compressor.
//!
//! # Signal Contract
//! - **Detector**: instantaneous per-sample magnitude, converted to dB with a
//!   -96 dB floor. No RMS window, no lookahead.
//! - **Curve**: hard-knee static curve in [`gain_computer`](crate::dsp::gain_computer).
//! - **Ballistics**: one-sample attack, exponential release (see
//!   [`envelope`](crate::dsp::envelope)).
//! - **Bypass**: passes samples through untouched and freezes the envelope;
//!   reduction resumes from the frozen state when re-engaged.
//!
//! Settings refresh once per block, never per sample, so a mid-block
//! parameter write from the host cannot tear the curve. The release
//! coefficient involves `exp` and is only recomputed when release time or
//! sample rate actually change.

use crate::dsp::envelope::{Ballistics, EnvelopeFollower};
use crate::dsp::gain_computer::target_gain_reduction_db;
use crate::dsp::utils::{db_to_lin, level_db};

pub struct Compressor {
    sample_rate: f32,

    threshold_db: f32,
    ratio: f32,
    bypassed: bool,

    release_ms: f32,
    ballistics: Ballistics,

    // One follower per channel, allocated at prepare time.
    followers: Vec<EnvelopeFollower>,
}

impl Compressor {
    pub fn new() -> Self {
        Self {
            sample_rate: 0.0,
            threshold_db: 0.0,
            ratio: 1.0,
            bypassed: false,
            release_ms: 250.0,
            ballistics: Ballistics::new(50.0, 250.0, 48_000.0),
            followers: Vec::new(),
        }
    }

    /// Allocate per-channel state and clear envelope memory. Idempotent.
    pub fn prepare(&mut self, sample_rate: f32, num_channels: usize) {
        self.sample_rate = sample_rate;
        self.followers.clear();
        self.followers
            .resize_with(num_channels, EnvelopeFollower::new);
        self.ballistics = Ballistics::new(50.0, self.release_ms, sample_rate);
    }

    /// Refresh settings from the block's parameter snapshot. Call once per
    /// block before processing; values are expected to be pre-clamped.
    pub fn update_settings(
        &mut self,
        threshold_db: f32,
        attack_ms: f32,
        release_ms: f32,
        ratio: f32,
        bypassed: bool,
    ) {
        self.threshold_db = threshold_db;
        self.ratio = ratio.max(1.0);
        self.bypassed = bypassed;
        if release_ms != self.release_ms {
            self.release_ms = release_ms;
            self.ballistics = Ballistics::new(attack_ms, release_ms, self.sample_rate);
        }
    }

    /// Compress one sample on one channel.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: f32) -> f32 {
        if self.bypassed {
            return input;
        }

        let target = target_gain_reduction_db(level_db(input), self.threshold_db, self.ratio);
        let smoothed = self.followers[channel].smooth(target, &self.ballistics);
        input * db_to_lin(smoothed)
    }

    /// Current smoothed gain reduction on a channel, in dB (<= 0). Metering.
    pub fn gain_reduction_db(&self, channel: usize) -> f32 {
        self.followers
            .get(channel)
            .map(|f| f.current_db())
            .unwrap_or(0.0)
    }

    pub fn reset(&mut self) {
        for f in &mut self.followers {
            f.reset();
        }
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}
