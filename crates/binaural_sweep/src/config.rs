//! Fixed parameters of the renderer.

/// The sample rate used when the caller doesn't pick one.
///
/// Everything loaded is resampled to the engine's rate, so this is only a default, not a limitation.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Frames per transform block when the caller doesn't pick one.
///
/// Also the length every impulse response is padded or truncated to.
pub const DEFAULT_BLOCK_SIZE: usize = 512;

/// Degrees between adjacent measurements, and the size of one sweep step.
pub const ANGLE_STEP: i32 = binaural_sweep_datasets::ANGLE_STEP as i32;

/// Capacity of the queue carrying control patches to the audio thread.
///
/// Patches coalesce, so this only has to absorb bursts between two blocks.
pub const CONTROL_QUEUE_LEN: usize = 16;

/// Extra sweep steps added at each wraparound, indexed by jump level.
pub const JUMP_STEPS: [i32; 5] = [0, 1, 3, 5, 7];
