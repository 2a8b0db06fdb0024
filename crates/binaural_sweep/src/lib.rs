//! Real-time binaural rendering of a mono source swept around the listener.
//!
//! A session loads a library of head-related impulse responses and a source clip, then renders the clip over and over
//! through the measurement for the current azimuth.  Each time the clip starts again the azimuth moves on, bouncing
//! between or cycling through the bounds of the sweep.  See [Engine] to get started.
#[macro_use]
mod logging;

mod azimuth;
pub mod config;
mod control;
mod engine;
mod error;
mod selection;

pub use azimuth::{AzimuthController, ControlError, Direction, JumpLevel, SweepBounds, WrapMode};
pub use control::{ControlHandle, ControlPatch};
pub use engine::{Engine, EngineOptions};
pub use error::{Error, InvalidOptions, Result, RuntimeInvariantViolation};
pub use selection::{select, select_checked, Selection};

pub use binaural_sweep_datasets::{
    Coverage, DatasetSelector, HrtfDataset, HrtfRecord, SourceBuffer, SourceSelector,
};
