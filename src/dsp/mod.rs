pub mod allpass;
pub mod biquad;
pub mod compressor;
pub mod envelope;
pub mod gain_computer;
pub mod highpass;
pub mod utils;

pub use allpass::AllpassBlend;
pub use biquad::Biquad;
pub use compressor::Compressor;
pub use envelope::{Ballistics, EnvelopeFollower};
pub use highpass::SteepHighpass;
