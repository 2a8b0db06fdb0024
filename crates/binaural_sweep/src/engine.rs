use std::num::NonZeroU32;
use std::path::PathBuf;

use binaural_sweep_datasets::{DatasetSelector, HrtfDataset, SourceBuffer, SourceSelector};
use binaural_sweep_dsp::{BlockConvolver, TransformPlan};

use crate::azimuth::{AzimuthController, JumpLevel, SweepBounds, WrapMode};
use crate::config::*;
use crate::control::{control_channel, ControlHandle, ControlReceiver};
use crate::error::{InvalidOptions, Result};
use crate::logging::mark_audio_thread;
use crate::selection::{select_checked, Selection};

/// Everything needed to start a session.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineOptions {
    /// Rate of the output.  Everything loaded is resampled to this.
    pub sample_rate: u32,

    /// Transform length, and the most frames one block renders.
    pub block_size: usize,

    /// Directory the dataset and built-in clip paths are relative to.
    pub data_root: PathBuf,

    pub dataset: DatasetSelector,
    pub source: SourceSelector,

    pub sweep: SweepBounds,
    pub jump: JumpLevel,
    pub mode: WrapMode,

    /// Log every new azimuth at info level.  Otherwise it goes to debug.
    pub announce_azimuth: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            data_root: PathBuf::from("."),
            dataset: Default::default(),
            source: Default::default(),
            sweep: Default::default(),
            jump: Default::default(),
            mode: Default::default(),
            announce_azimuth: true,
        }
    }
}

/// The binaural renderer.
///
/// Owns all state of a session: the measurements, the source, the convolution buffers, and the sweep.  The driver calls
/// [Engine::fill] whenever it needs audio; control changes arrive through the [ControlHandle] returned alongside.
///
/// Nothing is loaded or allocated after construction.
pub struct Engine {
    dataset: HrtfDataset,
    source: SourceBuffer,
    convolver: BlockConvolver,
    controller: AzimuthController,
    control: ControlReceiver,

    /// Next sample of the source to render.  Reaching the end of the source triggers a wraparound.
    cursor: usize,

    announce_azimuth: bool,
}

impl Engine {
    /// Load everything `options` names and build an engine around it.
    pub fn initialize(options: EngineOptions) -> Result<(Engine, ControlHandle)> {
        crate::logging::ensure_log_ctx();

        let sample_rate =
            NonZeroU32::new(options.sample_rate).ok_or(InvalidOptions::ZeroSampleRate)?;
        if options.block_size == 0 {
            return Err(InvalidOptions::ZeroBlockSize.into());
        }

        let plan = TransformPlan::new(options.block_size);
        let dataset = HrtfDataset::load(&options.data_root, &options.dataset, sample_rate, &plan)?;
        let source = SourceBuffer::load(
            &options.data_root,
            &options.source,
            sample_rate,
            options.block_size,
        )?;

        let controller = AzimuthController::new(options.sweep, options.jump, options.mode);
        let (mut engine, handle) = Engine::assemble(&plan, dataset, source, controller)?;
        engine.announce_azimuth = options.announce_azimuth;

        log::info!(
            "Engine ready: {} records, {} source samples in {} blocks of {} at {} Hz",
            engine.dataset.len(),
            engine.source.logical_len(),
            engine.source.blocks(),
            options.block_size,
            sample_rate
        );

        Ok((engine, handle))
    }

    /// Build an engine from data which is already loaded.
    ///
    /// The dataset and source must agree on the block size.
    pub fn from_parts(
        dataset: HrtfDataset,
        source: SourceBuffer,
        controller: AzimuthController,
    ) -> Result<(Engine, ControlHandle)> {
        crate::logging::ensure_log_ctx();
        let plan = TransformPlan::new(dataset.block_size());
        Engine::assemble(&plan, dataset, source, controller)
    }

    fn assemble(
        plan: &TransformPlan,
        dataset: HrtfDataset,
        source: SourceBuffer,
        controller: AzimuthController,
    ) -> Result<(Engine, ControlHandle)> {
        if dataset.block_size() != source.block_size() {
            return Err(InvalidOptions::BlockSizeMismatch {
                dataset: dataset.block_size(),
                source_block: source.block_size(),
            }
            .into());
        }

        let (handle, control) = control_channel(controller.azimuth());
        let engine = Engine {
            convolver: BlockConvolver::new(plan),
            dataset,
            source,
            controller,
            control,
            cursor: 0,
            announce_azimuth: true,
        };
        Ok((engine, handle))
    }

    /// Fill `output` with interleaved stereo.
    ///
    /// Always fills the whole slice, running through as many blocks and wraparounds as that takes.  A trailing sample
    /// which is not a whole frame is zeroed.  Never blocks or allocates.
    ///
    /// The calling thread is marked as the audio thread permanently, not just for this call.  Every later `rt_*` log
    /// line from that thread, inside `fill` or not, goes through the relay queue and arrives a little late.  Offline
    /// drivers that render on their main thread get this too.
    ///
    /// # Panics
    ///
    /// If an azimuth ever selects a record outside the dataset.  That is a bug in this crate.
    pub fn fill(&mut self, output: &mut [f32]) {
        mark_audio_thread();

        let frames = output.len() / 2;
        let mut done = 0;

        while done < frames {
            self.apply_control();

            if self.cursor >= self.source.total_len() {
                self.wraparound();
            }

            let selection = self.selection();
            let record = &self.dataset.records()[selection.index];
            let did = self.convolver.render(
                self.source.samples(),
                self.cursor,
                frames - done,
                record.transfers(),
                selection.swap,
                &mut output[done * 2..],
            );

            self.cursor += did;
            done += did;
        }

        output[frames * 2..].fill(0.0);
    }

    fn apply_control(&mut self) {
        let patch = self.control.take_patch();
        if patch.is_empty() {
            return;
        }

        let moved = patch.sweep.is_some();
        patch.apply(&mut self.controller);
        if moved {
            self.control.publish_azimuth(self.controller.azimuth());
            rt_debug!("Sweep restarted at {}", self.controller.azimuth());
        }
    }

    fn wraparound(&mut self) {
        self.cursor = 0;
        let azimuth = self.controller.on_wraparound();
        self.control.publish_azimuth(azimuth);

        if self.announce_azimuth {
            rt_info!("Azimuth: {}", azimuth);
        } else {
            rt_debug!("Azimuth: {}", azimuth);
        }
    }

    fn selection(&self) -> Selection {
        let azimuth = self.controller.azimuth();
        match select_checked(azimuth, self.dataset.coverage(), self.dataset.len()) {
            Ok(s) => s,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn current_azimuth(&self) -> i32 {
        self.controller.azimuth()
    }

    pub fn controller(&self) -> &AzimuthController {
        &self.controller
    }

    pub fn dataset(&self) -> &HrtfDataset {
        &self.dataset
    }

    pub fn source(&self) -> &SourceBuffer {
        &self.source
    }

    /// Position within the source of the next frame to render.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use binaural_sweep_datasets::Coverage;
    use pretty_assertions::assert_eq;

    fn flat_dataset(coverage: Coverage, block_size: usize) -> HrtfDataset {
        let plan = TransformPlan::new(block_size);
        HrtfDataset::from_impulses(
            coverage,
            &plan,
            (0..coverage.record_count()).map(|_| (vec![1.0], vec![1.0])),
        )
        .unwrap()
    }

    /// Each record is distinguishable: its index scales the left ear and the right ear is delayed by one sample.
    fn marked_dataset(block_size: usize) -> HrtfDataset {
        let plan = TransformPlan::new(block_size);
        HrtfDataset::from_impulses(
            Coverage::Hemisphere,
            &plan,
            (0..37).map(|i| (vec![1.0 + i as f32], vec![0.0, 0.5])),
        )
        .unwrap()
    }

    fn fixed_at(azimuth: i32) -> AzimuthController {
        AzimuthController::new(
            SweepBounds::new(azimuth, azimuth).unwrap(),
            JumpLevel::default(),
            WrapMode::PingPong,
        )
    }

    #[test]
    fn test_unit_impulse_block() {
        let (mut engine, _handle) = Engine::from_parts(
            flat_dataset(Coverage::Hemisphere, 4),
            SourceBuffer::from_samples(&[1.0, 0.0, 0.0, 0.0], 4),
            fixed_at(0),
        )
        .unwrap();

        let mut out = [9.0f32; 8];
        engine.fill(&mut out);
        let rounded = out.map(|x| (x * 1e4).round() / 1e4);
        assert_eq!(rounded, [1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hemisphere_symmetry() {
        let source = SourceBuffer::from_samples(&[0.25, -0.5, 1.0, 0.0, 0.75, 0.1, -0.3, 0.2], 8);

        for azimuth in [185, 200, 270, 300, 355] {
            let (mut mirrored, _) =
                Engine::from_parts(marked_dataset(8), source.clone(), fixed_at(azimuth)).unwrap();
            let (mut direct, _) =
                Engine::from_parts(marked_dataset(8), source.clone(), fixed_at(360 - azimuth))
                    .unwrap();

            let mut a = [0.0f32; 16];
            let mut b = [0.0f32; 16];
            mirrored.fill(&mut a);
            direct.fill(&mut b);

            let swapped = b
                .chunks_exact(2)
                .flat_map(|f| [f[1], f[0]])
                .collect::<Vec<_>>();
            assert_eq!(a.to_vec(), swapped, "azimuth {}", azimuth);
        }
    }

    #[test]
    fn test_fill_spans_wraparounds() {
        let (mut engine, handle) = Engine::from_parts(
            flat_dataset(Coverage::FullCircle, 4),
            SourceBuffer::from_samples(&[1.0, 2.0, 3.0], 4),
            AzimuthController::default(),
        )
        .unwrap();

        // Ten blocks of one-block source: nine wraparounds.
        let mut out = vec![f32::NAN; 80];
        engine.fill(&mut out);
        assert!(out.iter().all(|x| x.is_finite()));
        assert_eq!(engine.current_azimuth(), 45);
        assert_eq!(handle.current_azimuth(), 45);
        assert_eq!(engine.cursor(), 4);

        let left = out.chunks_exact(2).map(|f| f[0].round()).collect::<Vec<_>>();
        assert_eq!(&left[..8], &[1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_odd_sizes() {
        let (mut engine, _) = Engine::from_parts(
            flat_dataset(Coverage::Hemisphere, 4),
            SourceBuffer::from_samples(&[1.0; 10], 4),
            fixed_at(0),
        )
        .unwrap();

        // 3 frames, then a dangling sample.
        let mut out = [7.0f32; 7];
        engine.fill(&mut out);
        assert_eq!(out[6], 0.0);
        assert_eq!(engine.cursor(), 3);

        // Requests larger than a block are split.
        let mut out = [7.0f32; 22];
        engine.fill(&mut out);
        assert_eq!(engine.cursor(), 14 % 12);
    }

    #[test]
    fn test_patch_applied_before_next_block() {
        let (mut engine, mut handle) = Engine::from_parts(
            flat_dataset(Coverage::Hemisphere, 4),
            SourceBuffer::from_samples(&[1.0; 4], 4),
            AzimuthController::default(),
        )
        .unwrap();

        let mut out = [0.0f32; 8];
        engine.fill(&mut out);
        assert_eq!(engine.current_azimuth(), 0);

        let handle = std::thread::spawn(move || {
            handle.set_sweep(180, 190).unwrap();
            handle.set_jump_level(1).unwrap();
            handle
        })
        .join()
        .unwrap();

        engine.fill(&mut out);
        // The sweep restarts at 180, then the wraparound steps and jumps.
        assert_eq!(engine.current_azimuth(), 190);
        assert_eq!(handle.current_azimuth(), 190);
    }

    #[test]
    fn test_block_size_mismatch() {
        let err = Engine::from_parts(
            flat_dataset(Coverage::Hemisphere, 4),
            SourceBuffer::from_samples(&[1.0; 4], 8),
            fixed_at(0),
        )
        .err()
        .unwrap();
        assert!(err.is_invalid_options());
    }

    #[test]
    fn test_zero_options_rejected() {
        let err = Engine::initialize(EngineOptions {
            block_size: 0,
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(err.is_invalid_options());

        let err = Engine::initialize(EngineOptions {
            sample_rate: 0,
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(err.is_invalid_options());
    }

    #[test]
    fn test_fill_marks_thread_for_good() {
        std::thread::spawn(|| {
            let (mut engine, _handle) = Engine::from_parts(
                flat_dataset(Coverage::Hemisphere, 4),
                SourceBuffer::from_samples(&[1.0], 4),
                fixed_at(0),
            )
            .unwrap();
            assert!(!crate::logging::is_audio_thread());

            engine.fill(&mut [0.0f32; 8]);
            drop(engine);
            assert!(crate::logging::is_audio_thread());
        })
        .join()
        .unwrap();

        let other = std::thread::spawn(crate::logging::is_audio_thread)
            .join()
            .unwrap();
        assert!(!other);
    }
}
