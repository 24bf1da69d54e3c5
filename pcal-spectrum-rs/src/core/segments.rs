//! Splitting a loaded file into its fixed-length pcal segments.

use super::loaders::{LoaderError, Result};

/// One contiguous autocorrelation function inside a file.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    /// 1-based position in the file (`pcal1`, `pcal2`, ...).
    pub index: usize,
    /// Offset of the first sample in the file.
    pub start: usize,
    /// Samples, lag 0 first.
    pub samples: &'a [f64],
}

impl<'a> Segment<'a> {
    /// Returns the number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the segment holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Slot name, e.g. `pcal3`.
    pub fn label(&self) -> String {
        format!("pcal{}", self.index)
    }
}

/// Split samples into consecutive, non-overlapping segments.
///
/// With the default layout `[4097, 4097, 4097, 4096]` the boundaries are
/// `[0, 4097)`, `[4097, 8194)`, `[8194, 12291)` and `[12291, 16387)`. Samples
/// past the last segment are ignored.
///
/// # Errors
///
/// Returns `LayoutOverflow` if the lengths add up to more samples than exist.
pub fn split_segments<'a>(samples: &'a [f64], lengths: &[usize]) -> Result<Vec<Segment<'a>>> {
    let needed = lengths
        .iter()
        .try_fold(0usize, |acc, &len| acc.checked_add(len))
        .unwrap_or(usize::MAX);
    if needed > samples.len() {
        return Err(LoaderError::LayoutOverflow {
            needed,
            available: samples.len(),
        });
    }

    let mut segments = Vec::with_capacity(lengths.len());
    let mut start = 0;
    for (i, &len) in lengths.iter().enumerate() {
        segments.push(Segment {
            index: i + 1,
            start,
            samples: &samples[start..start + len],
        });
        start += len;
    }

    Ok(segments)
}
