//! Steep highpass phase stage.
//!
//! Fourth-order Linkwitz-Riley highpass: two cascaded Butterworth sections
//! (Q = 1/sqrt(2) each), 24 dB/oct, -6 dB at cutoff, phase-coherent at the
//! crossover. Coefficients are shared across channels and recomputed only
//! when cutoff or sample rate change; delay-line state is per channel and
//! persists across blocks.

use std::f32::consts::FRAC_1_SQRT_2;

use crate::dsp::biquad::Biquad;

/// Lowest usable cutoff. Below this the filter is indistinguishable from a
/// passthrough at audio rates and the design drifts toward numerical noise.
const MIN_CUTOFF_HZ: f32 = 20.0;
const MAX_CUTOFF_HZ: f32 = 20_000.0;

/// Cutoff ceiling as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f32 = 0.45;

const SECTIONS: usize = 2;

pub struct SteepHighpass {
    sample_rate: f32,
    cutoff_hz: f32,
    // channels x cascaded sections
    sections: Vec<[Biquad; SECTIONS]>,
}

impl SteepHighpass {
    pub fn new() -> Self {
        Self {
            sample_rate: 0.0,
            cutoff_hz: -1.0,
            sections: Vec::new(),
        }
    }

    /// Allocate per-channel sections and clear filter memory. Idempotent.
    pub fn prepare(&mut self, sample_rate: f32, num_channels: usize) {
        self.sample_rate = sample_rate;
        self.sections.clear();
        self.sections
            .resize(num_channels, [Biquad::new(), Biquad::new()]);
        let cutoff = self.cutoff_hz.max(MIN_CUTOFF_HZ);
        self.cutoff_hz = -1.0; // force redesign against the new rate
        self.set_cutoff(cutoff);
    }

    /// Redesign the cascade for a new cutoff. No-op when unchanged; never
    /// touches delay-line state, so sweeps stay click-free.
    pub fn set_cutoff(&mut self, cutoff_hz: f32) {
        let ceiling = MAX_CUTOFF_HZ.min(MAX_CUTOFF_RATIO * self.sample_rate);
        let cutoff = cutoff_hz.clamp(MIN_CUTOFF_HZ, ceiling);
        if cutoff == self.cutoff_hz {
            return;
        }
        self.cutoff_hz = cutoff;
        for channel in &mut self.sections {
            for section in channel.iter_mut() {
                section.set_highpass(cutoff, FRAC_1_SQRT_2, self.sample_rate);
            }
        }
    }

    #[inline]
    pub fn process_sample(&mut self, channel: usize, x: f32) -> f32 {
        let [first, second] = &mut self.sections[channel];
        second.process(first.process(x))
    }

    pub fn reset(&mut self) {
        for channel in &mut self.sections {
            for section in channel.iter_mut() {
                section.reset_state();
            }
        }
    }
}

impl Default for SteepHighpass {
    fn default() -> Self {
        Self::new()
    }
}
