//! Segment planning: how many clips a split produces and where each begins.

use serde::{Deserialize, Serialize};
use vs_core::{Container, Error, Result};

/// One planned segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentDescriptor {
    /// 0-based position in the plan.
    pub index: usize,
    /// Offset into the source, in seconds.
    pub start_second: u64,
    /// Nominal length handed to the engine. Equal to the slice length for
    /// every segment, including the last.
    pub length_second: u64,
}

impl SegmentDescriptor {
    /// 1-based segment number, as used in output names.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// How long the produced clip really is for a source of
    /// `total_duration_seconds`: `total - start`, capped at the nominal length.
    /// Only the last segment of a plan can come out shorter.
    pub fn actual_length(&self, total_duration_seconds: u64) -> u64 {
        total_duration_seconds
            .saturating_sub(self.start_second)
            .min(self.length_second)
    }

    /// Deterministic output file name: `output_<n>.<ext>`.
    pub fn output_name(&self, container: Container) -> String {
        output_name(self.index, container)
    }
}

/// Output file name for the segment at 0-based `index`.
pub fn output_name(index: usize, container: Container) -> String {
    format!("output_{}.{}", index + 1, container.extension())
}

/// Recover the 0-based segment index from an output file name.
///
/// This is the inverse of [`output_name`] and lets other tooling correlate
/// files on disk with their position in the split.
pub fn output_index(name: &str) -> Option<usize> {
    let (stem, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    let number: usize = stem.strip_prefix("output_")?.parse().ok()?;
    number.checked_sub(1)
}

/// The ordered segments covering `[0, total_duration_seconds)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPlan {
    total_duration_seconds: u64,
    slice_seconds: u64,
    segments: Vec<SegmentDescriptor>,
}

impl SegmentPlan {
    pub fn total_duration_seconds(&self) -> u64 {
        self.total_duration_seconds
    }

    pub fn slice_seconds(&self) -> u64 {
        self.slice_seconds
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[SegmentDescriptor] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SegmentDescriptor> {
        self.segments.iter()
    }
}

impl<'a> IntoIterator for &'a SegmentPlan {
    type Item = &'a SegmentDescriptor;
    type IntoIter = std::slice::Iter<'a, SegmentDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Plan a split of a `total_duration_seconds` source into slices of
/// `slice_seconds`.
///
/// Produces `ceil(total / slice)` contiguous segments starting at 0 with step
/// `slice_seconds`. Every segment carries the nominal `slice_seconds` as its
/// length; the last one's real output is `total - start` seconds long, see
/// [`SegmentDescriptor::actual_length`]. A zero-length source yields an empty
/// plan, which is not an error.
///
/// # Errors
///
/// [`Error::InvalidSliceLength`] when `slice_seconds <= 0`.
pub fn plan(total_duration_seconds: u64, slice_seconds: i64) -> Result<SegmentPlan> {
    let slice = u64::try_from(slice_seconds)
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| {
            Error::InvalidSliceLength(format!(
                "must be a positive number of seconds, got {slice_seconds}"
            ))
        })?;

    let count = total_duration_seconds.div_ceil(slice);
    let segments = (0..count)
        .map(|i| SegmentDescriptor {
            index: i as usize,
            start_second: i * slice,
            length_second: slice,
        })
        .collect();

    Ok(SegmentPlan {
        total_duration_seconds,
        slice_seconds: slice,
        segments,
    })
}
