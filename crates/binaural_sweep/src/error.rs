use binaural_sweep_datasets::{DatasetError, ImpulseError};

use crate::azimuth::ControlError;

#[derive(Debug, derive_more::Display, derive_more::IsVariant)]
enum ErrorPayload {
    #[display(fmt = "Dataset error: {}", _0)]
    Dataset(DatasetError),

    #[display(fmt = "Invalid impulse responses: {}", _0)]
    Impulses(ImpulseError),

    #[display(fmt = "Rejected control value: {}", _0)]
    Control(ControlError),

    #[display(fmt = "Invalid engine options: {}", _0)]
    InvalidOptions(InvalidOptions),
}

/// [crate::EngineOptions] which can never produce a working engine.
#[derive(Debug, thiserror::Error, derive_more::IsVariant)]
pub enum InvalidOptions {
    #[error("the block size must be at least 1")]
    ZeroBlockSize,

    #[error("the sample rate must be at least 1")]
    ZeroSampleRate,

    #[error("the dataset has block size {dataset} but the source has block size {source_block}")]
    BlockSizeMismatch { dataset: usize, source_block: usize },
}

#[derive(Debug, thiserror::Error)]
#[error("{payload}")]
pub struct Error {
    payload: ErrorPayload,
}

macro_rules! conv {
    ($variant: ident, $from_err: path) => {
        impl From<$from_err> for Error {
            fn from(value: $from_err) -> Error {
                Error {
                    payload: ErrorPayload::$variant(value),
                }
            }
        }
    };
}

conv!(Dataset, DatasetError);
conv!(Impulses, ImpulseError);
conv!(Control, ControlError);
conv!(InvalidOptions, InvalidOptions);

impl From<binaural_sweep_datasets::LoadError> for Error {
    fn from(value: binaural_sweep_datasets::LoadError) -> Error {
        DatasetError::from(value).into()
    }
}

impl From<binaural_sweep_datasets::FormatError> for Error {
    fn from(value: binaural_sweep_datasets::FormatError) -> Error {
        DatasetError::from(value).into()
    }
}

impl Error {
    /// A file was missing or could not be decoded.
    pub fn is_load(&self) -> bool {
        matches!(&self.payload, ErrorPayload::Dataset(e) if e.is_load())
    }

    /// A file decoded but its layout or rate could not be converted.
    pub fn is_format(&self) -> bool {
        matches!(&self.payload, ErrorPayload::Dataset(e) if e.is_format())
    }

    pub fn is_control(&self) -> bool {
        self.payload.is_control()
    }

    pub fn is_invalid_options(&self) -> bool {
        self.payload.is_invalid_options()
    }

    pub fn is_invalid_impulses(&self) -> bool {
        self.payload.is_impulses()
    }

    /// The file behind a load or format error.
    pub fn path(&self) -> Option<&std::path::Path> {
        match &self.payload {
            ErrorPayload::Dataset(e) => Some(e.path()),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A selection fell outside the dataset.
///
/// This can only happen through a bug in this crate, so it is never returned.  The engine panics with it instead of
/// clamping to a wrong direction.
#[derive(Debug, thiserror::Error)]
#[error("Azimuth {azimuth} selected record {index} of a dataset with {len} records")]
pub struct RuntimeInvariantViolation {
    pub azimuth: i32,
    pub index: usize,
    pub len: usize,
}
