//! Block-rate parameter snapshot.
//!
//! The engine never talks to a host parameter store directly; the host reads
//! its own (lock-free) storage once per block and hands the engine a plain
//! value struct. Sanitization happens here, at the snapshot boundary, so
//! out-of-range or non-finite values can never reach the filter math.

use serde::{Deserialize, Serialize};

pub const THRESHOLD_RANGE_DB: (f32, f32) = (-60.0, 12.0);
pub const ATTACK_RANGE_MS: (f32, f32) = (0.0, 500.0);
pub const RELEASE_RANGE_MS: (f32, f32) = (5.0, 500.0);
pub const RATIO_RANGE: (f32, f32) = (1.0, 100.0);
pub const CUTOFF_RANGE_HZ: (f32, f32) = (0.0, 20_000.0);
pub const MIX_RANGE_PERCENT: (f32, f32) = (0.0, 100.0);
pub const MAKEUP_RANGE_DB: (f32, f32) = (-60.0, 12.0);

/// Discrete ratio choices, for hosts that expose ratio as a stepped control.
/// Free ratios anywhere in [`RATIO_RANGE`] are equally valid.
pub const RATIO_CHOICES: [f32; 14] = [
    1.0, 1.5, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0, 15.0, 20.0, 50.0, 100.0,
];

/// Clamp to a range, substituting the fallback for NaN/inf input.
#[inline]
fn clamp_finite(value: f32, range: (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(range.0, range.1)
    } else {
        fallback
    }
}

/// One block's worth of parameter values.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSnapshot {
    /// Compression threshold, dBFS.
    pub threshold_db: f32,
    /// Attack time, ms. Carried for host symmetry; the envelope attack is a
    /// one-sample jump by design.
    pub attack_ms: f32,
    /// Release time, ms.
    pub release_ms: f32,
    /// Compression ratio, 1 = no compression.
    pub ratio: f32,
    /// Phase-stage cutoff, Hz.
    pub cutoff_hz: f32,
    /// Dry/wet mix, percent. 0 = fully dry.
    pub mix_percent: f32,
    /// Makeup gain applied after the mix, dB.
    pub makeup_gain_db: f32,
    /// Compressor bypass. Freezes the envelope while engaged.
    pub bypass: bool,
    /// Carried for host compatibility; not consulted by processing.
    pub pause: bool,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            threshold_db: 0.0,
            attack_ms: 50.0,
            release_ms: 250.0,
            ratio: 3.0,
            cutoff_hz: 50.0,
            mix_percent: 50.0,
            makeup_gain_db: 1.0,
            bypass: false,
            pause: false,
        }
    }
}

impl ParameterSnapshot {
    /// Copy of the snapshot with every field clamped to its valid range and
    /// non-finite values replaced by the defaults.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            threshold_db: clamp_finite(self.threshold_db, THRESHOLD_RANGE_DB, d.threshold_db),
            attack_ms: clamp_finite(self.attack_ms, ATTACK_RANGE_MS, d.attack_ms),
            release_ms: clamp_finite(self.release_ms, RELEASE_RANGE_MS, d.release_ms),
            ratio: clamp_finite(self.ratio, RATIO_RANGE, d.ratio),
            cutoff_hz: clamp_finite(self.cutoff_hz, CUTOFF_RANGE_HZ, d.cutoff_hz),
            mix_percent: clamp_finite(self.mix_percent, MIX_RANGE_PERCENT, d.mix_percent),
            makeup_gain_db: clamp_finite(self.makeup_gain_db, MAKEUP_RANGE_DB, d.makeup_gain_db),
            bypass: self.bypass,
            pause: self.pause,
        }
    }

    /// Wet fraction derived from the mix percentage, in [0, 1].
    #[inline]
    pub fn wet(&self) -> f32 {
        self.mix_percent / 100.0
    }
}
