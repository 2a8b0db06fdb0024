//! Throwaway directories of WAV files for tests.
//!
//! Only built for this crate's tests or with the `test-fixtures` feature.  Failures here panic: they mean the test
//! environment is broken, not the code under test.
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::hrtf::DatasetSelector;

/// A fresh directory under the system temporary directory, removed on drop.
#[derive(Debug)]
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    pub fn new(tag: &str) -> FixtureDir {
        let dir = tempfile::Builder::new()
            .prefix(&format!("binaural_sweep_{tag}_"))
            .tempdir()
            .expect("Could not create fixture directory");
        FixtureDir { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write interleaved 32-bit float samples to `relative`, creating parent directories.
    pub fn write_wav(
        &self,
        relative: &Path,
        channels: u16,
        sample_rate: u32,
        samples: &[f32],
    ) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Could not create fixture subdirectory");
        }

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("Could not create WAV");
        for s in samples {
            writer.write_sample(*s).expect("Could not write sample");
        }
        writer.finalize().expect("Could not finalize WAV");

        path
    }

    /// Write a stereo measurement for every azimuth of `selector`, as `impulse(azimuth) -> (left, right)`.
    ///
    /// Shorter ears are zero-padded to the longer one.
    pub fn write_dataset(
        &self,
        selector: &DatasetSelector,
        sample_rate: u32,
        mut impulse: impl FnMut(u32) -> (Vec<f32>, Vec<f32>),
    ) {
        for az in selector.coverage().azimuths() {
            let (left, right) = impulse(az);
            let frames = left.len().max(right.len());
            let interleaved = (0..frames)
                .flat_map(|i| {
                    [
                        left.get(i).copied().unwrap_or(0.0),
                        right.get(i).copied().unwrap_or(0.0),
                    ]
                })
                .collect::<Vec<_>>();
            self.write_wav(&selector.relative_path(az), 2, sample_rate, &interleaved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_removed_on_drop() {
        let dir = FixtureDir::new("drop");
        let written = dir.write_wav(Path::new("nested/one.wav"), 1, 44100, &[0.5; 4]);
        assert!(written.is_file());
        assert!(written.starts_with(dir.path()));

        let root = dir.path().to_path_buf();
        let other = FixtureDir::new("drop");
        assert_ne!(other.path(), root.as_path());

        drop(dir);
        assert!(!root.exists());
        assert!(other.path().exists());
    }
}
