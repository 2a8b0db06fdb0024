//! Transform plans and the complex arithmetic the renderer is built on.
//!
//! The conventions here are fixed and everything downstream depends on them:
//!
//! - Forward transforms are unnormalized.
//! - Inverse transforms are unnormalized as well, so a forward/inverse pair scales by the transform length.  Exactly one
//!   division by the block size happens, when the renderer converts back to output samples.
//! - Real signals enter the transform as complex values with a zero imaginary part.
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// A pair of planned transforms of one length, shared by everything which works at that block size.
///
/// Planning allocates, so this is built once at startup.  Cloning is cheap.
#[derive(Clone)]
pub struct TransformPlan {
    block_size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for TransformPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformPlan")
            .field("block_size", &self.block_size)
            .finish_non_exhaustive()
    }
}

impl TransformPlan {
    /// Plan transforms of length `block_size`.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is 0.
    pub fn new(block_size: usize) -> Self {
        assert_ne!(block_size, 0, "Transforms of length 0 are meaningless");

        let mut planner = FftPlanner::<f32>::new();
        Self {
            block_size,
            forward: planner.plan_fft_forward(block_size),
            inverse: planner.plan_fft_inverse(block_size),
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Length of the scratch buffer either transform needs to run in place without allocating.
    pub fn scratch_len(&self) -> usize {
        self.forward
            .get_inplace_scratch_len()
            .max(self.inverse.get_inplace_scratch_len())
    }

    /// Forward-transform `buffer` in place.
    ///
    /// Both slices must be sized for this plan; see [TransformPlan::scratch_len].
    #[inline]
    pub fn forward(&self, buffer: &mut [Complex<f32>], scratch: &mut [Complex<f32>]) {
        debug_assert_eq!(buffer.len(), self.block_size);
        self.forward.process_with_scratch(buffer, scratch);
    }

    /// Inverse-transform `buffer` in place, without normalizing.
    #[inline]
    pub fn inverse(&self, buffer: &mut [Complex<f32>], scratch: &mut [Complex<f32>]) {
        debug_assert_eq!(buffer.len(), self.block_size);
        self.inverse.process_with_scratch(buffer, scratch);
    }

    /// Compute the transfer function of a real impulse response.
    ///
    /// The impulse is zero-padded (or truncated) to the block size before transforming, so the result is always exactly
    /// one block long.  This allocates and is meant for startup.
    pub fn transfer_function(&self, impulse: &[f32]) -> Vec<Complex<f32>> {
        let mut spectrum = real_to_complex_padded(impulse, self.block_size);
        let mut scratch = vec![Complex::new(0.0, 0.0); self.scratch_len()];
        self.forward(&mut spectrum, &mut scratch);
        spectrum
    }
}

/// Lift real samples to complex ones with a zero imaginary part, padding with zeros (or truncating) to `len`.
pub fn real_to_complex_padded(samples: &[f32], len: usize) -> Vec<Complex<f32>> {
    let mut ret = vec![Complex::new(0.0f32, 0.0f32); len];
    for (dest, src) in ret.iter_mut().zip(samples.iter()) {
        dest.re = *src;
    }
    ret
}

/// Complex multiplication, written out.
///
/// `out.re = a.re*b.re - a.im*b.im`, `out.im = a.re*b.im + a.im*b.re`.
#[inline(always)]
pub fn complex_multiply(a: Complex<f32>, b: Complex<f32>) -> Complex<f32> {
    Complex {
        re: a.re * b.re - a.im * b.im,
        im: a.re * b.im + a.im * b.re,
    }
}

/// Multiply two spectra bin by bin into `out`.
///
/// # Panics
///
/// If the three slices are not the same length.
#[inline]
pub fn multiply_spectra(a: &[Complex<f32>], b: &[Complex<f32>], out: &mut [Complex<f32>]) {
    assert_eq!(a.len(), b.len());
    assert_eq!(a.len(), out.len());

    for ((o, x), y) in out.iter_mut().zip(a.iter()).zip(b.iter()) {
        *o = complex_multiply(*x, *y);
    }
}
