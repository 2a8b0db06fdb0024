//! Offline driver: pulls audio from the engine the way a device callback would, and writes it to disk.
use anyhow::{Context, Result};

use binaural_sweep::{Engine, EngineOptions, JumpLevel, SweepBounds, WrapMode};

use crate::cli_args::{PathsArgs, RenderArgs};

pub fn render(args: &RenderArgs) -> Result<()> {
    anyhow::ensure!(args.period > 0, "--period must be at least 1 frame");
    anyhow::ensure!(args.seconds >= 0.0, "--seconds cannot be negative");

    let options = EngineOptions {
        sample_rate: args.sample_rate,
        block_size: args.block_size,
        data_root: args.dataset.data_root.clone(),
        dataset: args.dataset.selector(),
        source: args.source_selector(),
        sweep: SweepBounds::new(args.start, args.finish)?,
        jump: JumpLevel::new(args.jump)?,
        mode: if args.one_pass {
            WrapMode::OnePass
        } else {
            WrapMode::PingPong
        },
        announce_azimuth: !args.quiet,
    };

    let (mut engine, _controls) =
        Engine::initialize(options).context("Unable to start the renderer")?;

    let spec = hound::WavSpec {
        channels: 2,
        sample_format: hound::SampleFormat::Float,
        bits_per_sample: 32,
        sample_rate: args.sample_rate,
    };
    let mut writer = hound::WavWriter::create(&args.output, spec)
        .with_context(|| format!("Unable to create {}", args.output.display()))?;

    let total_frames = (args.seconds * args.sample_rate as f64).round() as usize;
    let mut period = vec![0.0f32; args.period * 2];
    let mut remaining = total_frames;

    while remaining > 0 {
        let frames = remaining.min(args.period);
        let chunk = &mut period[..frames * 2];
        engine.fill(chunk);
        for s in chunk.iter() {
            writer.write_sample(*s)?;
        }
        remaining -= frames;
    }

    writer.finalize()?;
    log::info!(
        "Wrote {} frames to {}, ending at azimuth {}",
        total_frames,
        args.output.display(),
        engine.current_azimuth()
    );

    Ok(())
}

pub fn list_paths(args: &PathsArgs) -> Result<()> {
    for p in args.dataset.selector().paths(&args.dataset.data_root) {
        println!("{}", p.display());
    }
    Ok(())
}
