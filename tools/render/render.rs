//! Offline render harness.
//!
//! Runs the effect engine over a WAV file in fixed-size blocks, the same way
//! a plugin host would, so settings can be auditioned without loading a DAW:
//!
//! ```text
//! render input.wav output.wav [settings.json] [--highpass]
//! ```
//!
//! The optional JSON file is a [`ParameterSnapshot`]; missing fields fall
//! back to the defaults.

use std::env;
use std::fs;

use anyhow::{bail, Context, Result};
use phasecomp::{Engine, ParameterSnapshot, PhaseMode, ProcessSpec};

const BLOCK_SIZE: usize = 512;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut paths = Vec::new();
    let mut mode = PhaseMode::AllpassBlend;
    for arg in &args {
        match arg.as_str() {
            "--highpass" => mode = PhaseMode::Highpass,
            "--allpass" => mode = PhaseMode::AllpassBlend,
            other => paths.push(other.to_string()),
        }
    }
    if paths.len() < 2 {
        bail!("usage: render <input.wav> <output.wav> [settings.json] [--highpass|--allpass]");
    }

    let snapshot = match paths.get(2) {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str::<ParameterSnapshot>(&text)
                .with_context(|| format!("parsing {path}"))?
        }
        None => ParameterSnapshot::default(),
    };

    let mut reader = hound::WavReader::open(&paths[0]).with_context(|| format!("opening {}", paths[0]))?;
    let in_spec = reader.spec();
    let num_channels = in_spec.channels as usize;

    // Deinterleave into per-channel buffers.
    let mut channels: Vec<Vec<f32>> = vec![Vec::new(); num_channels];
    match in_spec.sample_format {
        hound::SampleFormat::Float => {
            for (i, s) in reader.samples::<f32>().enumerate() {
                channels[i % num_channels].push(s?);
            }
        }
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (in_spec.bits_per_sample - 1)) as f32;
            for (i, s) in reader.samples::<i32>().enumerate() {
                channels[i % num_channels].push(s? as f32 * scale);
            }
        }
    }
    let num_frames = channels.first().map(|c| c.len()).unwrap_or(0);

    let mut engine = Engine::new(mode);
    engine.prepare(ProcessSpec {
        sample_rate: in_spec.sample_rate as f64,
        max_block_size: BLOCK_SIZE,
        num_channels,
    })?;

    let mut offset = 0;
    while offset < num_frames {
        let end = (offset + BLOCK_SIZE).min(num_frames);
        let mut block: Vec<&mut [f32]> = channels
            .iter_mut()
            .map(|c| &mut c[offset..end])
            .collect();
        engine.process_block(&mut block, &snapshot);
        offset = end;
    }
    println!(
        "rendered {} frames, final gain reduction {:.2} dB",
        num_frames,
        engine.gain_reduction_db(0)
    );

    let out_spec = hound::WavSpec {
        channels: in_spec.channels,
        sample_rate: in_spec.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer =
        hound::WavWriter::create(&paths[1], out_spec).with_context(|| format!("creating {}", paths[1]))?;
    for frame in 0..num_frames {
        for channel in &channels {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize()?;
    Ok(())
}
