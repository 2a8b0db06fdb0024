//! Loading of everything the renderer plays: HRTF measurement libraries and source clips.
//!
//! All of this runs at startup.  Files are decoded with Symphonia, converted to the channel layout the renderer
//! wants, resampled to the engine rate, and handed back as immutable, block-sized structures.
mod error;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
mod hrtf;
pub mod media;
mod resampling;
mod source;

pub use error::*;
pub use hrtf::*;
pub use resampling::{ConditionalResampler, ResamplingError};
pub use source::*;
