use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use binaural_sweep_dsp::{ChannelFormat, Complex, TransferPair, TransformPlan};

use crate::error::{DatasetError, FormatError, FormatProblem, ImpulseError};
use crate::media::load_canonical;

/// Measurements are taken every this many degrees of azimuth.
pub const ANGLE_STEP: u32 = 5;

/// Records in a hemispheric dataset: 0 through 180 inclusive.
pub const HEMISPHERIC_RECORDS: usize = 37;

/// Records in a full-circle dataset: 0 through 355.
pub const FULL_CIRCLE_RECORDS: usize = 72;

/// Every dataset we know how to load is measured on the horizontal plane only.
pub const ELEVATION: i32 = 0;

/// How much of the circle a dataset's measurements cover.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, derive_more::IsVariant, derive_more::Display)]
pub enum Coverage {
    /// 0 to 180 degrees.  The other side of the head is the mirror image with the ears exchanged.
    #[display(fmt = "hemispheric")]
    Hemisphere,

    /// 0 to 355 degrees, no mirroring.
    #[display(fmt = "full-circle")]
    FullCircle,
}

impl Coverage {
    pub fn record_count(&self) -> usize {
        match self {
            Coverage::Hemisphere => HEMISPHERIC_RECORDS,
            Coverage::FullCircle => FULL_CIRCLE_RECORDS,
        }
    }

    /// Azimuths of every record in order, so that `azimuths()[i] == i * ANGLE_STEP`.
    pub fn azimuths(&self) -> impl Iterator<Item = u32> {
        (0..self.record_count() as u32).map(|i| i * ANGLE_STEP)
    }
}

/// Which library of measurements to load.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, derive_more::IsVariant)]
pub enum DatasetSelector {
    /// The built-in hemispheric library under `mit/`.
    #[default]
    Hemispheric,

    /// One subject of the full-circle library under `cipic/`.
    FullCircle { subject: u32 },
}

impl DatasetSelector {
    pub fn coverage(&self) -> Coverage {
        match self {
            DatasetSelector::Hemispheric => Coverage::Hemisphere,
            DatasetSelector::FullCircle { .. } => Coverage::FullCircle,
        }
    }

    /// Path of the measurement for `azimuth`, relative to the data root.
    pub fn relative_path(&self, azimuth: u32) -> PathBuf {
        match self {
            DatasetSelector::Hemispheric => format!(
                "mit/elev{e}/H{e}e{azimuth:03}a.wav",
                e = ELEVATION
            )
            .into(),
            DatasetSelector::FullCircle { subject } => format!(
                "cipic/subject{subject:03}/e{e}a{azimuth:03}.wav",
                e = ELEVATION
            )
            .into(),
        }
    }

    /// Every path the loader will open, in record order.
    pub fn paths(&self, root: &Path) -> Vec<PathBuf> {
        self.coverage()
            .azimuths()
            .map(|az| root.join(self.relative_path(az)))
            .collect()
    }
}

/// One measured direction.
#[derive(Clone, Debug, PartialEq)]
pub struct HrtfRecord {
    pub azimuth: u32,
    pub elevation: i32,

    /// Impulse responses, zero-padded or truncated to exactly one block.
    pub hrir_left: Vec<f32>,
    pub hrir_right: Vec<f32>,

    /// Forward transforms of the impulse responses, one block long.
    pub transfer_left: Vec<Complex<f32>>,
    pub transfer_right: Vec<Complex<f32>>,
}

impl HrtfRecord {
    fn new(azimuth: u32, left: &[f32], right: &[f32], plan: &TransformPlan) -> Self {
        let block_size = plan.block_size();
        let pad = |x: &[f32]| {
            let mut ret = x[..x.len().min(block_size)].to_vec();
            ret.resize(block_size, 0.0);
            ret
        };

        HrtfRecord {
            azimuth,
            elevation: ELEVATION,
            hrir_left: pad(left),
            hrir_right: pad(right),
            transfer_left: plan.transfer_function(left),
            transfer_right: plan.transfer_function(right),
        }
    }

    pub fn transfers(&self) -> TransferPair<'_> {
        TransferPair {
            left: &self.transfer_left,
            right: &self.transfer_right,
        }
    }
}

/// An immutable, indexable set of measurements built once at startup.
///
/// Record `i` is for azimuth `i * ANGLE_STEP`.  Every transfer function is exactly `block_size` long.
#[derive(Clone, Debug, PartialEq)]
pub struct HrtfDataset {
    coverage: Coverage,
    block_size: usize,
    records: Vec<HrtfRecord>,
}

impl HrtfDataset {
    /// Load every measurement of `selector` from under `root`.
    ///
    /// The first file which cannot be read or converted aborts the load.
    pub fn load(
        root: &Path,
        selector: &DatasetSelector,
        sample_rate: NonZeroU32,
        plan: &TransformPlan,
    ) -> Result<HrtfDataset, DatasetError> {
        let coverage = selector.coverage();
        let block_size = plan.block_size();
        let mut records = Vec::with_capacity(coverage.record_count());

        for (azimuth, path) in coverage.azimuths().zip(selector.paths(root)) {
            log::info!("Loading: {}", path.display());

            let stereo = load_canonical(&path, ChannelFormat::Stereo, sample_rate)?;
            if stereo.is_empty() {
                return Err(FormatError::new(&path, FormatProblem::NoSamples).into());
            }

            let frames = stereo.len() / 2;
            if frames > block_size {
                log::warn!(
                    "{}: impulse response of {} samples truncated to the block size of {}",
                    path.display(),
                    frames,
                    block_size
                );
            }

            let (left, right): (Vec<f32>, Vec<f32>) =
                stereo.chunks_exact(2).map(|f| (f[0], f[1])).unzip();
            records.push(HrtfRecord::new(azimuth, &left, &right, plan));
        }

        log::debug!(
            "Loaded {} {} records at block size {}",
            records.len(),
            coverage,
            block_size
        );

        Ok(HrtfDataset {
            coverage,
            block_size,
            records,
        })
    }

    /// Build a dataset from impulse pairs already in memory, one `(left, right)` per azimuth in order.
    pub fn from_impulses<I>(
        coverage: Coverage,
        plan: &TransformPlan,
        impulses: I,
    ) -> Result<HrtfDataset, ImpulseError>
    where
        I: IntoIterator<Item = (Vec<f32>, Vec<f32>)>,
    {
        let impulses = impulses.into_iter().collect::<Vec<_>>();
        if impulses.len() != coverage.record_count() {
            return Err(ImpulseError::WrongRecordCount {
                coverage,
                expected: coverage.record_count(),
                found: impulses.len(),
            });
        }

        let records = coverage
            .azimuths()
            .zip(impulses.iter())
            .map(|(azimuth, (left, right))| {
                if left.is_empty() || right.is_empty() {
                    return Err(ImpulseError::Empty { azimuth });
                }
                Ok(HrtfRecord::new(azimuth, left, right, plan))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HrtfDataset {
            coverage,
            block_size: plan.block_size(),
            records,
        })
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, index: usize) -> Option<&HrtfRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[HrtfRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fixtures::FixtureDir;

    const RATE: NonZeroU32 = match NonZeroU32::new(44100) {
        Some(x) => x,
        None => unreachable!(),
    };

    fn delayed_impulse(delay: usize) -> Vec<f32> {
        let mut ret = vec![0.0; delay + 1];
        ret[delay] = 1.0;
        ret
    }

    #[test]
    fn test_templates() {
        assert_eq!(
            DatasetSelector::Hemispheric.relative_path(5),
            PathBuf::from("mit/elev0/H0e005a.wav")
        );
        assert_eq!(
            DatasetSelector::Hemispheric.relative_path(180),
            PathBuf::from("mit/elev0/H0e180a.wav")
        );
        assert_eq!(
            DatasetSelector::FullCircle { subject: 3 }.relative_path(355),
            PathBuf::from("cipic/subject003/e0a355.wav")
        );
    }

    #[test]
    fn test_path_counts() {
        let root = Path::new("data");
        let hemi = DatasetSelector::Hemispheric.paths(root);
        assert_eq!(hemi.len(), HEMISPHERIC_RECORDS);
        assert_eq!(hemi[0], PathBuf::from("data/mit/elev0/H0e000a.wav"));

        let full = DatasetSelector::FullCircle { subject: 21 }.paths(root);
        assert_eq!(full.len(), FULL_CIRCLE_RECORDS);
        assert_eq!(
            full[71],
            PathBuf::from("data/cipic/subject021/e0a355.wav")
        );
    }

    #[test]
    fn test_from_impulses_validates() {
        let plan = TransformPlan::new(8);

        let short = (0..10).map(|_| (vec![1.0], vec![1.0]));
        assert!(matches!(
            HrtfDataset::from_impulses(Coverage::Hemisphere, &plan, short),
            Err(ImpulseError::WrongRecordCount {
                expected: 37,
                found: 10,
                ..
            })
        ));

        let with_empty =
            (0..37).map(|i| if i == 4 { (vec![], vec![1.0]) } else { (vec![1.0], vec![1.0]) });
        assert!(matches!(
            HrtfDataset::from_impulses(Coverage::Hemisphere, &plan, with_empty),
            Err(ImpulseError::Empty { azimuth: 20 })
        ));
    }

    #[test]
    fn test_records_are_block_sized() {
        let plan = TransformPlan::new(8);
        // One impulse shorter than the block, one longer.
        let impulses = (0..72).map(|i| (delayed_impulse(i % 4), vec![0.5; 12]));
        let dataset = HrtfDataset::from_impulses(Coverage::FullCircle, &plan, impulses).unwrap();

        assert_eq!(dataset.len(), 72);
        for (i, r) in dataset.records().iter().enumerate() {
            assert_eq!(r.azimuth, i as u32 * ANGLE_STEP);
            assert_eq!(r.elevation, 0);
            assert_eq!(r.hrir_left.len(), 8);
            assert_eq!(r.hrir_right, vec![0.5; 8]);
            assert_eq!(r.transfer_left.len(), 8);
            assert_eq!(r.transfer_right.len(), 8);
        }

        // DC bin of 8 samples of 0.5.
        assert!((dataset.records()[0].transfer_right[0].re - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_load_from_disk() {
        let _ = env_logger::builder().is_test(true).try_init();

        let dir = FixtureDir::new("hrtf_load");
        dir.write_dataset(&DatasetSelector::Hemispheric, RATE.get(), |az| {
            let delay = (az / ANGLE_STEP) as usize % 3;
            (delayed_impulse(delay), delayed_impulse(delay + 1))
        });

        let plan = TransformPlan::new(16);
        let dataset =
            HrtfDataset::load(dir.path(), &DatasetSelector::Hemispheric, RATE, &plan).unwrap();
        assert_eq!(dataset.coverage(), Coverage::Hemisphere);
        assert_eq!(dataset.len(), HEMISPHERIC_RECORDS);

        let r = dataset.record(7).unwrap();
        assert_eq!(r.azimuth, 35);
        let mut expected_left = vec![0.0; 16];
        expected_left[1] = 1.0;
        let mut expected_right = vec![0.0; 16];
        expected_right[2] = 1.0;
        assert_eq!(r.hrir_left, expected_left);
        assert_eq!(r.hrir_right, expected_right);

        // Loading twice gives the same thing.
        let again =
            HrtfDataset::load(dir.path(), &DatasetSelector::Hemispheric, RATE, &plan).unwrap();
        assert_eq!(dataset, again);
    }

    #[test]
    fn test_mono_measurements_broadcast() {
        let dir = FixtureDir::new("hrtf_mono");
        let selector = DatasetSelector::Hemispheric;
        for path in selector.paths(Path::new("")) {
            dir.write_wav(&path, 1, RATE.get(), &[0.25, 0.5]);
        }

        let plan = TransformPlan::new(4);
        let dataset = HrtfDataset::load(dir.path(), &selector, RATE, &plan).unwrap();
        for r in dataset.records() {
            assert_eq!(r.hrir_left, vec![0.25, 0.5, 0.0, 0.0]);
            assert_eq!(r.hrir_left, r.hrir_right);
        }
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = FixtureDir::new("hrtf_missing");
        let selector = DatasetSelector::FullCircle { subject: 3 };
        dir.write_dataset(&selector, RATE.get(), |_| (vec![1.0], vec![1.0]));
        let victim = dir.path().join(selector.relative_path(120));
        std::fs::remove_file(&victim).unwrap();

        let plan = TransformPlan::new(4);
        let err = HrtfDataset::load(dir.path(), &selector, RATE, &plan).unwrap_err();
        assert!(err.is_load());
        assert_eq!(err.path(), victim.as_path());
    }

    #[test]
    fn test_garbage_file_is_load_error() {
        let dir = FixtureDir::new("hrtf_garbage");
        let selector = DatasetSelector::Hemispheric;
        dir.write_dataset(&selector, RATE.get(), |_| (vec![1.0], vec![1.0]));
        let victim = dir.path().join(selector.relative_path(0));
        std::fs::write(&victim, b"this is not a wave file").unwrap();

        let plan = TransformPlan::new(4);
        let err = HrtfDataset::load(dir.path(), &selector, RATE, &plan).unwrap_err();
        assert!(err.is_load());
        assert_eq!(err.path(), victim.as_path());
    }

    #[test]
    fn test_three_channels_is_format_error() {
        let dir = FixtureDir::new("hrtf_three");
        let selector = DatasetSelector::Hemispheric;
        dir.write_dataset(&selector, RATE.get(), |_| (vec![1.0], vec![1.0]));
        let victim = selector.relative_path(90);
        dir.write_wav(&victim, 3, RATE.get(), &[1.0, 0.0, 0.0]);

        let plan = TransformPlan::new(4);
        let err = HrtfDataset::load(dir.path(), &selector, RATE, &plan).unwrap_err();
        assert!(err.is_format());
        assert_eq!(err.path(), dir.path().join(victim).as_path());
    }
}
