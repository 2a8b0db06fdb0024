//! Conditional resampling that uses Rubato when rates differ and passes data through when they don't.
//!
//! Everything here runs at load time, so whole files are converted in one go and allocation is fine.

use rubato::{Resampler as RubatoResampler, SincFixedIn, SincInterpolationParameters};
use smallvec::SmallVec;

/// Rubato is fed fixed-size chunks of this many frames.
const CHUNK_FRAMES: usize = 1024;

/// Stereo is the most we ever resample.
const MAX_CHANNELS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum ResamplingError {
    #[error("Failed to create Rubato resampler: {0}")]
    RubatoError(#[from] rubato::ResamplerConstructionError),
    #[error("Failed to process samples: {0}")]
    ProcessError(#[from] rubato::ResampleError),
    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(usize),
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),
}

/// A resampler which only creates a Rubato instance when resampling is actually needed.
pub struct ConditionalResampler {
    channels: usize,
    source_rate: u32,
    target_rate: u32,
    /// The actual resampler, only created when needed.
    resampler: Option<ResamplerState>,
}

struct ResamplerState {
    resampler: SincFixedIn<f32>,
    /// Uninterleaved input, as Rubato requires.
    uninterleaved_buffer: Vec<Vec<f32>>,
    /// Uninterleaved output.
    output_buffer: Vec<Vec<f32>>,
}

impl ConditionalResampler {
    pub fn new(source_rate: u32, target_rate: u32, channels: usize) -> Result<Self, ResamplingError> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(ResamplingError::InvalidChannelCount(channels));
        }

        for rate in [source_rate, target_rate] {
            if rate == 0 {
                return Err(ResamplingError::InvalidSampleRate(rate));
            }
        }

        let resampler = if source_rate != target_rate {
            Some(ResamplerState::new(source_rate, target_rate, channels)?)
        } else {
            None
        };

        Ok(Self {
            channels,
            source_rate,
            target_rate,
            resampler,
        })
    }

    /// Check if resampling is active.
    pub fn is_resampling(&self) -> bool {
        self.resampler.is_some()
    }

    /// How many frames a whole input of `input_frames` becomes at the target rate, rounding up.
    pub fn expected_output_frames(&self, input_frames: usize) -> usize {
        let num = input_frames as u64 * self.target_rate as u64;
        num.div_ceil(self.source_rate as u64) as usize
    }

    /// Convert a whole interleaved signal.
    ///
    /// Rubato has no notion of the end of the input and its output lags the input by the filter's delay.  So the
    /// leading [RubatoResampler::output_delay] frames are dropped, zero chunks are fed until the tail has come out, and
    /// the result is exactly [ConditionalResampler::expected_output_frames] long.
    pub fn process_all(&mut self, input: &[f32]) -> Result<Vec<f32>, ResamplingError> {
        let channels = self.channels;
        let input_frames = input.len() / channels;
        let expected_frames = self.expected_output_frames(input_frames);

        let Some(state) = self.resampler.as_mut() else {
            return Ok(input[..input_frames * channels].to_vec());
        };

        let delay = state.resampler.output_delay();
        let needed_frames = expected_frames + delay;

        let mut output = Vec::with_capacity((needed_frames + CHUNK_FRAMES) * channels);
        let mut chunk = vec![0.0f32; CHUNK_FRAMES * channels];
        let mut consumed = 0;

        // Every chunk produces output, but bound the loop anyway in case Rubato decides not to.
        let needed_input = (needed_frames as u64 * self.source_rate as u64)
            .div_ceil(self.target_rate as u64) as usize;
        let max_chunks = needed_input / CHUNK_FRAMES + 4;
        for _ in 0..max_chunks {
            if output.len() >= needed_frames * channels {
                break;
            }

            let take = input_frames.saturating_sub(consumed).min(CHUNK_FRAMES);
            chunk[..take * channels]
                .copy_from_slice(&input[consumed * channels..(consumed + take) * channels]);
            chunk[take * channels..].fill(0.0);
            consumed += take;

            state.process_chunk(&chunk, channels, &mut output)?;
        }

        output.drain(..(delay * channels).min(output.len()));
        output.truncate(expected_frames * channels);
        Ok(output)
    }
}

impl ResamplerState {
    fn new(source_rate: u32, target_rate: u32, channels: usize) -> Result<Self, ResamplingError> {
        let ratio = (target_rate as f64) / (source_rate as f64);

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: rubato::SincInterpolationType::Linear,
            oversampling_factor: 128,
            window: rubato::WindowFunction::Blackman,
        };

        let resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, channels)?;

        let max_output_frames = resampler.output_frames_max();
        let uninterleaved_buffer = (0..channels).map(|_| vec![0.0f32; CHUNK_FRAMES]).collect();
        let output_buffer = (0..channels)
            .map(|_| vec![0.0f32; max_output_frames])
            .collect();

        Ok(Self {
            resampler,
            uninterleaved_buffer,
            output_buffer,
        })
    }

    /// Resample one full chunk of interleaved input, appending interleaved output.
    fn process_chunk(
        &mut self,
        input: &[f32],
        channels: usize,
        output: &mut Vec<f32>,
    ) -> Result<(), ResamplingError> {
        let input_frames = self.resampler.input_frames_next();
        let output_frames = self.resampler.output_frames_next();
        debug_assert_eq!(input_frames, CHUNK_FRAMES);

        for ch in 0..channels {
            for frame in 0..input_frames {
                self.uninterleaved_buffer[ch][frame] = input[frame * channels + ch];
            }
        }

        let input_refs: SmallVec<[&[f32]; MAX_CHANNELS]> = self
            .uninterleaved_buffer
            .iter()
            .map(|v| &v[..input_frames])
            .collect();
        let mut output_refs: SmallVec<[&mut [f32]; MAX_CHANNELS]> = self
            .output_buffer
            .iter_mut()
            .map(|v| &mut v[..output_frames])
            .collect();

        // Rubato sometimes does a different number of frames than it claimed it would, so trust what it returns.
        let did = self
            .resampler
            .process_into_buffer(&input_refs, &mut output_refs, None)?
            .1;
        drop(output_refs);

        for frame in 0..did {
            for ch in 0..channels {
                output.push(self.output_buffer[ch][frame]);
            }
        }

        Ok(())
    }
}
