//! Host-independent compressor / phase-cancellation effect engine.
//!
//! A feedforward single-band compressor (dB-domain envelope follower,
//! one-sample attack, exponential release) feeding a selectable phase stage
//! (all-pass cancellation blend or steep Linkwitz-Riley highpass), a dry/wet
//! mixer, and makeup gain. Everything on the per-sample path is
//! allocation-free and lock-free; hosts drive it through [`Engine::prepare`]
//! and [`Engine::process_block`] with a block-rate [`ParameterSnapshot`].

pub mod dsp;
pub mod engine;
pub mod params;

pub use engine::{Engine, PhaseMode, PrepareError, ProcessSpec};
pub use params::{ParameterSnapshot, RATIO_CHOICES};
