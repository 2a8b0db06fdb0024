use std::path::{Path, PathBuf};

use binaural_sweep_dsp::ChannelConversionError;

use crate::resampling::ResamplingError;

/// A file could not be opened or decoded.
///
/// Covers missing files, unreadable files, and files which are corrupt or in a container/codec we cannot decode.
#[derive(Debug, thiserror::Error)]
#[error("Could not load {}: {source}", path.display())]
pub struct LoadError {
    path: PathBuf,
    #[source]
    source: symphonia::core::errors::Error,
}

/// A file decoded, but its audio cannot be converted to what the renderer needs.
#[derive(Debug, thiserror::Error)]
#[error("Unsupported audio in {}: {problem}", path.display())]
pub struct FormatError {
    path: PathBuf,
    #[source]
    problem: FormatProblem,
}

/// What exactly was wrong with a file's format.
#[derive(Debug, thiserror::Error, derive_more::IsVariant)]
pub enum FormatProblem {
    #[error("the file has no decodable audio track")]
    NoAudioTrack,

    #[error("the channel layout could not be determined")]
    UnknownChannelLayout,

    #[error("the sample rate is missing or zero")]
    MissingSampleRate,

    #[error("the file contains no audio")]
    NoSamples,

    #[error(transparent)]
    Channels(#[from] ChannelConversionError),

    #[error(transparent)]
    Resampling(#[from] ResamplingError),
}

/// Either of the ways that loading media for a session can fail.
///
/// Both are fatal to session startup and both carry the failing path.
#[derive(Debug, thiserror::Error, derive_more::IsVariant)]
pub enum DatasetError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Impulse responses handed to [crate::HrtfDataset::from_impulses] do not make up a valid dataset.
#[derive(Debug, thiserror::Error, derive_more::IsVariant)]
pub enum ImpulseError {
    #[error("A {coverage} dataset needs {expected} records but {found} were given")]
    WrongRecordCount {
        coverage: crate::Coverage,
        expected: usize,
        found: usize,
    },

    #[error("The impulse response for {azimuth} degrees is empty")]
    Empty { azimuth: u32 },
}

impl LoadError {
    pub(crate) fn new(path: &Path, source: impl Into<symphonia::core::errors::Error>) -> Self {
        Self {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }

    /// The file which failed to load.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FormatError {
    pub(crate) fn new(path: &Path, problem: impl Into<FormatProblem>) -> Self {
        Self {
            path: path.to_path_buf(),
            problem: problem.into(),
        }
    }

    /// The file whose format could not be converted.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn problem(&self) -> &FormatProblem {
        &self.problem
    }
}

impl DatasetError {
    /// The file which caused the failure.
    pub fn path(&self) -> &Path {
        match self {
            DatasetError::Load(e) => e.path(),
            DatasetError::Format(e) => e.path(),
        }
    }
}
