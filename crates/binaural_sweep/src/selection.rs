//! Mapping an azimuth onto a dataset record.
use binaural_sweep_datasets::{Coverage, HEMISPHERIC_RECORDS};

use crate::config::ANGLE_STEP;
use crate::error::RuntimeInvariantViolation;

/// Which record to render with, and whether its ears must be exchanged.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Selection {
    pub index: usize,
    pub swap: bool,
}

/// Select the record for `azimuth`, which is first reduced to `0..360`.
///
/// A hemispheric dataset only measures the right side of the head.  Anything past 180 degrees uses the mirrored
/// measurement, `360 - angle`, with the left and right ears exchanged.
pub fn select(azimuth: i32, coverage: Coverage) -> Selection {
    let index = (azimuth.rem_euclid(360) / ANGLE_STEP) as usize;

    match coverage {
        Coverage::Hemisphere if index as i32 * ANGLE_STEP > 180 => Selection {
            index: (HEMISPHERIC_RECORDS - 2) - (index % HEMISPHERIC_RECORDS),
            swap: true,
        },
        _ => Selection { index, swap: false },
    }
}

/// [select], checked against a dataset of `len` records.
pub fn select_checked(
    azimuth: i32,
    coverage: Coverage,
    len: usize,
) -> Result<Selection, RuntimeInvariantViolation> {
    let selection = select(azimuth, coverage);
    if selection.index >= len {
        return Err(RuntimeInvariantViolation {
            azimuth,
            index: selection.index,
            len,
        });
    }
    Ok(selection)
}
