//! Signal processing for the binaural renderer: planned transforms, per-block frequency-domain convolution, and the
//! channel layout conversions needed to get media into the shapes the renderer wants.
mod block_convolver;
pub mod channel_conversion;
mod channel_format;
#[cfg(test)]
mod close_floats;
pub mod spectrum;

pub use block_convolver::{BlockConvolver, TransferPair};
pub use channel_conversion::{ChannelConversionError, ChannelConverter};
pub use channel_format::*;
pub use rustfft::num_complex::Complex;
pub use spectrum::TransformPlan;
