use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use binaural_sweep_dsp::{spectrum::real_to_complex_padded, ChannelFormat, Complex};

use crate::error::DatasetError;
use crate::media::load_canonical;

/// What to play.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, derive_more::IsVariant)]
pub enum SourceSelector {
    #[default]
    Beep,
    StarWars,
    SteamTrain,
    Buzzer,

    /// Any file Symphonia can decode.  Relative paths are resolved against the data root like the built-in clips.
    File(PathBuf),
}

impl SourceSelector {
    /// The built-in clips, in the order they are traditionally numbered.
    pub const BUILT_IN: [SourceSelector; 4] = [
        SourceSelector::Beep,
        SourceSelector::StarWars,
        SourceSelector::SteamTrain,
        SourceSelector::Buzzer,
    ];

    pub fn relative_path(&self) -> &Path {
        match self {
            SourceSelector::Beep => Path::new("beep.wav"),
            SourceSelector::StarWars => Path::new("StarWars3.wav"),
            SourceSelector::SteamTrain => Path::new("steam-train.wav"),
            SourceSelector::Buzzer => Path::new("fail-buzzer-01.wav"),
            SourceSelector::File(p) => p,
        }
    }

    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }
}

/// The whole input signal, ready to be windowed one block at a time.
///
/// Samples are complex with zero imaginary parts and are zero-padded to a whole number of blocks, never fewer than one.
/// Nothing here changes once built.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceBuffer {
    samples: Vec<Complex<f32>>,
    logical_len: usize,
    block_size: usize,
}

fn padded_len(len: usize, block_size: usize) -> usize {
    len.div_ceil(block_size).max(1) * block_size
}

impl SourceBuffer {
    /// Wrap mono samples which are already at the engine's rate.
    ///
    /// # Panics
    ///
    /// If `block_size` is 0.
    pub fn from_samples(samples: &[f32], block_size: usize) -> SourceBuffer {
        assert_ne!(block_size, 0);
        SourceBuffer {
            samples: real_to_complex_padded(samples, padded_len(samples.len(), block_size)),
            logical_len: samples.len(),
            block_size,
        }
    }

    /// Load, downmix, and resample the selected source.
    pub fn load(
        root: &Path,
        selector: &SourceSelector,
        sample_rate: NonZeroU32,
        block_size: usize,
    ) -> Result<SourceBuffer, DatasetError> {
        let path = selector.resolve(root);
        log::info!("Loading: {}", path.display());

        let mono = load_canonical(&path, ChannelFormat::Mono, sample_rate)?;
        let ret = SourceBuffer::from_samples(&mono, block_size);
        log::debug!(
            "Source {}: {} samples padded to {} ({} blocks)",
            path.display(),
            ret.logical_len,
            ret.samples.len(),
            ret.blocks()
        );
        Ok(ret)
    }

    pub fn samples(&self) -> &[Complex<f32>] {
        &self.samples
    }

    /// Length including padding.  This is where the cursor wraps.
    pub fn total_len(&self) -> usize {
        self.samples.len()
    }

    /// Length of the signal before padding.
    pub fn logical_len(&self) -> usize {
        self.logical_len
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn blocks(&self) -> usize {
        self.samples.len() / self.block_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::fixtures::FixtureDir;

    fn re(buffer: &SourceBuffer) -> Vec<f32> {
        buffer.samples().iter().map(|c| c.re).collect()
    }

    #[test]
    fn test_padding() {
        let b = SourceBuffer::from_samples(&[1.0, 2.0, 3.0, 4.0, 5.0], 4);
        assert_eq!(b.total_len(), 8);
        assert_eq!(b.logical_len(), 5);
        assert_eq!(b.blocks(), 2);
        assert_eq!(re(&b), vec![1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 0.0, 0.0]);
        assert!(b.samples().iter().all(|c| c.im == 0.0));

        // Exact multiples are left alone.
        assert_eq!(SourceBuffer::from_samples(&[1.0; 8], 4).total_len(), 8);

        // Empty input still gets one block.
        let empty = SourceBuffer::from_samples(&[], 4);
        assert_eq!(empty.total_len(), 4);
        assert_eq!(re(&empty), vec![0.0; 4]);
    }

    #[test]
    fn test_built_in_paths() {
        let root = Path::new("media");
        assert_eq!(
            SourceSelector::BUILT_IN
                .iter()
                .map(|s| s.resolve(root))
                .collect::<Vec<_>>(),
            vec![
                PathBuf::from("media/beep.wav"),
                PathBuf::from("media/StarWars3.wav"),
                PathBuf::from("media/steam-train.wav"),
                PathBuf::from("media/fail-buzzer-01.wav"),
            ]
        );
        assert_eq!(SourceSelector::default(), SourceSelector::Beep);
    }

    #[test]
    fn test_stereo_downmixed() {
        let dir = FixtureDir::new("source_stereo");
        dir.write_wav(Path::new("beep.wav"), 2, 44100, &[1.0, 0.0, 0.5, 0.5, 0.0, -1.0]);

        let b = SourceBuffer::load(
            dir.path(),
            &SourceSelector::Beep,
            NonZeroU32::new(44100).unwrap(),
            4,
        )
        .unwrap();
        assert_eq!(re(&b), vec![0.5, 0.5, -0.5, 0.0]);
        assert_eq!(b.logical_len(), 3);
    }

    #[test]
    fn test_resampled_to_engine_rate() {
        let dir = FixtureDir::new("source_rate");
        dir.write_wav(Path::new("clip.wav"), 1, 22050, &vec![0.25; 2205]);

        let b = SourceBuffer::load(
            dir.path(),
            &SourceSelector::File("clip.wav".into()),
            NonZeroU32::new(44100).unwrap(),
            512,
        )
        .unwrap();
        assert_eq!(b.logical_len(), 4410);
        assert_eq!(b.total_len(), 9 * 512);
    }

    #[test]
    fn test_missing_source() {
        let dir = FixtureDir::new("source_missing");
        let err = SourceBuffer::load(
            dir.path(),
            &SourceSelector::SteamTrain,
            NonZeroU32::new(44100).unwrap(),
            512,
        )
        .unwrap_err();
        assert!(err.is_load());
        assert_eq!(err.path(), dir.path().join("steam-train.wav").as_path());
    }
}
