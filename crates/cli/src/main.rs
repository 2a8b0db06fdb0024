//! Command line front end for the binaural sweep renderer.
//!
//! `binaural_sweep render out.wav --data-root path/to/data` renders ten seconds of the default clip sweeping the full
//! circle.  Azimuth announcements are logged at info level, so they show unless `--quiet` is given or `RUST_LOG` says
//! otherwise.
mod cli_args;
mod render;

use anyhow::Result;
use clap::Parser;

use cli_args::{CliArgs, Command};

fn main() -> Result<()> {
    let args = CliArgs::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match &args.command {
        Command::Render(r) => render::render(r),
        Command::Paths(p) => render::list_paths(p),
    }
}
