use rustfft::num_complex::Complex;

use crate::spectrum::{multiply_spectra, TransformPlan};

/// The left and right transfer functions to render one block against.
#[derive(Copy, Clone, Debug)]
pub struct TransferPair<'a> {
    pub left: &'a [Complex<f32>],
    pub right: &'a [Complex<f32>],
}

/// Renders mono blocks to stereo by frequency-domain multiplication against a pair of transfer functions.
///
/// Each block is handled independently: transform the window of the source starting at the cursor, multiply per ear,
/// transform back, scale, interleave.  All buffers are allocated by [BlockConvolver::new] and reused, so
/// [BlockConvolver::render] neither allocates nor blocks and may run on an audio thread.
///
/// A convolver is owned by exactly one renderer; it is `Send` but rendering needs `&mut self`.
pub struct BlockConvolver {
    plan: TransformPlan,

    /// Spectrum of the current source window.
    source_spectrum: Vec<Complex<f32>>,

    /// Product spectra, which become time-domain ear signals after the inverse transform.
    left: Vec<Complex<f32>>,
    right: Vec<Complex<f32>>,

    scratch: Vec<Complex<f32>>,
}

impl BlockConvolver {
    pub fn new(plan: &TransformPlan) -> Self {
        let zeros = || vec![Complex::new(0.0f32, 0.0f32); plan.block_size()];
        Self {
            plan: plan.clone(),
            source_spectrum: zeros(),
            left: zeros(),
            right: zeros(),
            scratch: vec![Complex::new(0.0, 0.0); plan.scratch_len()],
        }
    }

    pub fn block_size(&self) -> usize {
        self.plan.block_size()
    }

    /// How many samples a render at `cursor` asking for `requested` will actually produce for a source of
    /// `source_len` samples.
    #[inline]
    pub fn clamped_len(&self, source_len: usize, cursor: usize, requested: usize) -> usize {
        requested
            .min(self.block_size())
            .min(source_len.saturating_sub(cursor))
    }

    /// Render one block of `source` starting at `cursor` into `output` as interleaved stereo.
    ///
    /// `requested` is clamped to the block size and to what remains of the source after `cursor`; the clamped count is
    /// returned and exactly that many frames (`2 * count` samples) are written.  Where the block-sized window runs past
    /// the end of `source` it is read as zeros.
    ///
    /// If `swap` is set, the left ear's result goes to the right channel and vice versa.
    ///
    /// # Panics
    ///
    /// If either transfer function is not exactly one block long, or if `output` cannot hold the clamped frame count.
    /// These are programmer errors.
    pub fn render(
        &mut self,
        source: &[Complex<f32>],
        cursor: usize,
        requested: usize,
        transfers: TransferPair<'_>,
        swap: bool,
        output: &mut [f32],
    ) -> usize {
        let block_size = self.block_size();
        assert_eq!(transfers.left.len(), block_size);
        assert_eq!(transfers.right.len(), block_size);

        let count = self.clamped_len(source.len(), cursor, requested);
        assert!(
            output.len() >= count * 2,
            "Output of {} samples cannot hold {} stereo frames",
            output.len(),
            count
        );

        if count == 0 {
            return 0;
        }

        // Step A: window and transform.
        let available = (source.len() - cursor).min(block_size);
        self.source_spectrum[..available].copy_from_slice(&source[cursor..cursor + available]);
        self.source_spectrum[available..].fill(Complex::new(0.0, 0.0));
        self.plan
            .forward(&mut self.source_spectrum, &mut self.scratch);

        // Step B: apply each ear.
        multiply_spectra(&self.source_spectrum, transfers.left, &mut self.left);
        multiply_spectra(&self.source_spectrum, transfers.right, &mut self.right);

        // Step C: back to the time domain.
        self.plan.inverse(&mut self.left, &mut self.scratch);
        self.plan.inverse(&mut self.right, &mut self.scratch);

        // Step D: interleave, scaling exactly once.
        let (first, second) = if swap {
            (&self.right, &self.left)
        } else {
            (&self.left, &self.right)
        };
        let scale = block_size as f32;
        for (i, frame) in output[..count * 2].chunks_exact_mut(2).enumerate() {
            frame[0] = first[i].re / scale;
            frame[1] = second[i].re / scale;
        }

        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::close_floats::{close_floats32, close_slices32};
    use crate::spectrum::real_to_complex_padded;

    fn flat(block_size: usize) -> Vec<Complex<f32>> {
        vec![Complex::new(1.0, 0.0); block_size]
    }

    fn left_of(output: &[f32]) -> Vec<f32> {
        output.chunks_exact(2).map(|f| f[0]).collect()
    }

    fn right_of(output: &[f32]) -> Vec<f32> {
        output.chunks_exact(2).map(|f| f[1]).collect()
    }

    #[test]
    fn unit_impulse_through_flat_transfer() {
        let plan = TransformPlan::new(4);
        let mut convolver = BlockConvolver::new(&plan);
        let source = real_to_complex_padded(&[1.0, 0.0, 0.0, 0.0], 4);
        let tf = flat(4);
        let mut output = [0.0f32; 8];

        let did = convolver.render(
            &source,
            0,
            4,
            TransferPair {
                left: &tf,
                right: &tf,
            },
            false,
            &mut output,
        );

        assert_eq!(did, 4);
        close_slices32(&output, &[1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 1e-6);
    }

    #[test]
    fn identity_round_trip_reproduces_the_block() {
        let block_size = 64;
        let plan = TransformPlan::new(block_size);
        let mut convolver = BlockConvolver::new(&plan);
        let samples = (0..block_size * 3)
            .map(|i| ((i * 7919) % 101) as f32 / 50.0 - 1.0)
            .collect::<Vec<_>>();
        let source = real_to_complex_padded(&samples, samples.len());
        let tf = flat(block_size);
        let mut output = vec![0.0f32; block_size * 2];

        for block in 0..3 {
            let cursor = block * block_size;
            convolver.render(
                &source,
                cursor,
                block_size,
                TransferPair {
                    left: &tf,
                    right: &tf,
                },
                false,
                &mut output,
            );
            let expected = &samples[cursor..cursor + block_size];
            close_slices32(&left_of(&output), expected, 1e-5);
            close_slices32(&right_of(&output), expected, 1e-5);
        }
    }

    #[test]
    fn delayed_impulse_shifts_circularly() {
        let plan = TransformPlan::new(8);
        let mut convolver = BlockConvolver::new(&plan);
        let source = real_to_complex_padded(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 8);
        let identity = flat(8);
        // Delay the right ear by 2 samples.
        let delay = plan.transfer_function(&[0.0, 0.0, 1.0]);
        let mut output = [0.0f32; 16];

        convolver.render(
            &source,
            0,
            8,
            TransferPair {
                left: &identity,
                right: &delay,
            },
            false,
            &mut output,
        );

        close_slices32(
            &right_of(&output),
            &[7.0, 8.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            1e-4,
        );
    }

    #[test]
    fn swap_exchanges_ears() {
        let plan = TransformPlan::new(8);
        let mut convolver = BlockConvolver::new(&plan);
        let source = real_to_complex_padded(&[0.5, -0.25, 1.0, 0.0, 0.0, 0.3, 0.0, 0.1], 8);
        let left_tf = plan.transfer_function(&[1.0, 0.5]);
        let right_tf = plan.transfer_function(&[0.2, 0.0, 0.0, 0.7]);
        let transfers = TransferPair {
            left: &left_tf,
            right: &right_tf,
        };

        let mut straight = [0.0f32; 16];
        let mut swapped = [0.0f32; 16];
        convolver.render(&source, 0, 8, transfers, false, &mut straight);
        convolver.render(&source, 0, 8, transfers, true, &mut swapped);

        assert_eq!(left_of(&straight), right_of(&swapped));
        assert_eq!(right_of(&straight), left_of(&swapped));
    }

    #[test]
    fn clamps_at_the_end_of_the_source() {
        let block_size = 16;
        let plan = TransformPlan::new(block_size);
        let mut convolver = BlockConvolver::new(&plan);
        let source = real_to_complex_padded(&[0.25; 32], 32);
        let tf = flat(block_size);
        // Poison past what should be written to prove nothing beyond one frame is touched.
        let mut output = vec![f32::NAN; block_size * 2];

        let did = convolver.render(
            &source,
            source.len() - 1,
            block_size,
            TransferPair {
                left: &tf,
                right: &tf,
            },
            false,
            &mut output,
        );

        assert_eq!(did, 1);
        close_floats32(output[0], 0.25, 1e-6);
        close_floats32(output[1], 0.25, 1e-6);
        assert!(output[2..].iter().all(|x| x.is_nan()));
    }

    #[test]
    fn short_requests_write_only_what_was_asked() {
        let plan = TransformPlan::new(8);
        let mut convolver = BlockConvolver::new(&plan);
        let source = real_to_complex_padded(&[1.0; 8], 8);
        let tf = flat(8);
        let mut output = vec![f32::NAN; 16];

        let did = convolver.render(
            &source,
            0,
            3,
            TransferPair {
                left: &tf,
                right: &tf,
            },
            false,
            &mut output,
        );

        assert_eq!(did, 3);
        assert!(output[..6].iter().all(|x| (x - 1.0).abs() < 1e-5));
        assert!(output[6..].iter().all(|x| x.is_nan()));
    }

    #[test]
    #[should_panic]
    fn wrong_transfer_length_panics() {
        let plan = TransformPlan::new(8);
        let mut convolver = BlockConvolver::new(&plan);
        let source = real_to_complex_padded(&[1.0; 8], 8);
        let short = flat(4);
        let mut output = [0.0f32; 16];
        convolver.render(
            &source,
            0,
            8,
            TransferPair {
                left: &short,
                right: &short,
            },
            false,
            &mut output,
        );
    }
}
