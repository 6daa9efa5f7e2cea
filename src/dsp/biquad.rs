//! Second-order IIR section (transposed direct form II).
//!
//! Only the highpass design is carried; it is the single shape the phase
//! stage needs, cascaded in pairs for the Linkwitz-Riley slope.

use std::f32::consts::PI;

/// Anti-denormal bias added into the delay line each step.
const DENORMAL_BIAS: f32 = 1e-25;

#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    // Numerator / denominator, normalized by a0.
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    // Delay line
    s1: f32,
    s2: f32,
}

impl Biquad {
    /// Identity filter.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            s1: 0.0,
            s2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.s1;
        self.s1 = self.b1 * x - self.a1 * y + self.s2 + DENORMAL_BIAS;
        self.s2 = self.b2 * x - self.a2 * y + DENORMAL_BIAS;
        y
    }

    /// Clear the delay line. Not called by coefficient updates, so cutoff
    /// sweeps stay click-free.
    #[inline]
    pub fn reset_state(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }

    /// RBJ highpass design. `q` below a small floor is clamped to keep the
    /// peak denominator away from zero; callers must keep `cutoff` under
    /// Nyquist.
    pub fn set_highpass(&mut self, cutoff: f32, q: f32, sample_rate: f32) {
        let w0 = 2.0 * PI * cutoff / sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q.max(1e-6));

        let a0 = 1.0 + alpha;
        let inv_a0 = 1.0 / a0;

        let hp = (1.0 + cos_w0) * 0.5;
        self.b0 = hp * inv_a0;
        self.b1 = -(1.0 + cos_w0) * inv_a0;
        self.b2 = hp * inv_a0;
        self.a1 = (-2.0 * cos_w0) * inv_a0;
        self.a2 = (1.0 - alpha) * inv_a0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}
