//! Tolerance asserts for tests.  Transform round trips are never exact.

#[track_caller]
pub(crate) fn close_floats32(a: f32, b: f32, threshold: f32) {
    assert!(
        (a - b).abs() < threshold,
        "{a} and {b} differ by more than {threshold}"
    );
}

/// Compare two signals sample by sample, naming the first index that is off.
#[track_caller]
pub(crate) fn close_slices32(got: &[f32], expected: &[f32], threshold: f32) {
    assert_eq!(got.len(), expected.len(), "Signals differ in length");
    if let Some((i, (g, e))) = got
        .iter()
        .zip(expected)
        .enumerate()
        .find(|(_, (g, e))| (*g - *e).abs() >= threshold)
    {
        panic!("Sample {i}: got {g}, expected {e} (threshold {threshold})");
    }
}
