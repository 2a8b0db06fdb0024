//! Definition of the Clap command line.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use binaural_sweep::config::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE};
use binaural_sweep::{DatasetSelector, SourceSelector};

#[derive(Debug, Parser)]
#[command(about = "Render a mono clip swept around the listener's head")]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a session to a 32-bit float stereo wave file.
    Render(RenderArgs),

    /// Print every measurement file a session would load.
    Paths(PathsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Clip {
    Beep,
    StarWars,
    Train,
    Buzzer,
}

#[derive(Debug, Parser)]
pub struct DatasetArgs {
    /// Directory holding `mit/`, `cipic/`, and the built-in clips.
    #[arg(long, default_value = ".")]
    pub data_root: PathBuf,

    /// Use this subject of the full-circle library instead of the hemispheric one.
    #[arg(long)]
    pub subject: Option<u32>,
}

#[derive(Debug, Parser)]
pub struct RenderArgs {
    /// Where to write the output.
    pub output: PathBuf,

    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Which built-in clip to play.
    #[arg(long, value_enum, default_value = "beep", conflicts_with = "source_file")]
    pub source: Clip,

    /// Play this file instead of a built-in clip.
    #[arg(long)]
    pub source_file: Option<PathBuf>,

    /// First azimuth of the sweep, in degrees.
    #[arg(long, default_value_t = 0)]
    pub start: i32,

    /// Last azimuth of the sweep, in degrees.
    #[arg(long, default_value_t = 360)]
    pub finish: i32,

    /// Extra movement at each pass, 0 to 4.
    #[arg(long, default_value_t = 0)]
    pub jump: u8,

    /// Keep rotating forward, wrapping at 360, instead of bouncing between the bounds.
    #[arg(long)]
    pub one_pass: bool,

    /// Length of the output.
    #[arg(long, default_value_t = 10.0)]
    pub seconds: f64,

    /// Frames requested from the engine per callback.
    #[arg(long, default_value_t = 1024)]
    pub period: usize,

    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// Don't announce each new azimuth.
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Debug, Parser)]
pub struct PathsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
}

impl DatasetArgs {
    pub fn selector(&self) -> DatasetSelector {
        match self.subject {
            Some(subject) => DatasetSelector::FullCircle { subject },
            None => DatasetSelector::Hemispheric,
        }
    }
}

impl RenderArgs {
    pub fn source_selector(&self) -> SourceSelector {
        if let Some(p) = &self.source_file {
            return SourceSelector::File(p.clone());
        }

        match self.source {
            Clip::Beep => SourceSelector::Beep,
            Clip::StarWars => SourceSelector::StarWars,
            Clip::Train => SourceSelector::SteamTrain,
            Clip::Buzzer => SourceSelector::Buzzer,
        }
    }
}
