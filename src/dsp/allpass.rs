//! First-order all-pass phase stage.
//!
//! The all-pass passes every frequency at unity gain but rotates phase from
//! 0 at DC to 180 degrees at Nyquist, with 90 degrees at the cutoff. Summing
//! the rotated signal against the input with inverted polarity,
//! `0.5 * (x - allpass(x))`, therefore cancels progressively around the
//! cutoff: a frequency-dependent cancellation built from a single state
//! variable per channel.
//!
//! The coefficient involves a tangent and is recomputed only when cutoff or
//! sample rate change; steady-state processing is multiply-add only.

use std::f32::consts::PI;

/// Cutoff ceiling as a fraction of the sample rate. Keeps the tangent away
/// from its pole at Nyquist.
const MAX_CUTOFF_RATIO: f32 = 0.49;

pub struct AllpassBlend {
    sample_rate: f32,
    cutoff_hz: f32,
    a1: f32,
    // One feedback sample per channel.
    state: Vec<f32>,
}

impl AllpassBlend {
    pub fn new() -> Self {
        Self {
            sample_rate: 0.0,
            cutoff_hz: -1.0,
            a1: 0.0,
            state: Vec::new(),
        }
    }

    /// Allocate per-channel state and clear filter memory. Idempotent.
    pub fn prepare(&mut self, sample_rate: f32, num_channels: usize) {
        self.sample_rate = sample_rate;
        self.state.clear();
        self.state.resize(num_channels, 0.0);
        let cutoff = self.cutoff_hz.max(0.0);
        self.cutoff_hz = -1.0; // force recompute against the new rate
        self.set_cutoff(cutoff);
    }

    /// Update the all-pass coefficient. Cheap no-op when the cutoff is
    /// unchanged, so this is safe to call every block.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        let cutoff = cutoff_hz.clamp(0.0, MAX_CUTOFF_RATIO * self.sample_rate);
        if cutoff == self.cutoff_hz {
            return;
        }
        self.cutoff_hz = cutoff;
        let t = (PI * cutoff / self.sample_rate).tan();
        self.a1 = (t - 1.0) / (t + 1.0);
    }

    /// Run one sample through the all-pass and return the cancellation blend
    /// `0.5 * (x - allpass(x))`.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, x: f32) -> f32 {
        let z = self.state[channel];
        let ap = self.a1 * x + z;
        self.state[channel] = x - self.a1 * ap + 1e-25;
        0.5 * (x - ap)
    }

    pub fn reset(&mut self) {
        for z in &mut self.state {
            *z = 0.0;
        }
    }
}

impl Default for AllpassBlend {
    fn default() -> Self {
        Self::new()
    }
}
