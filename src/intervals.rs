//! Ignored-range merging, trimming and relativization
//!
//! Ranges leave the classifier in absolute milliseconds. They are merged,
//! trimmed to the span covered by fixations and then shifted to whole
//! seconds relative to the first fixation, the unit every later stage uses.

use crate::error::ComputeError;
use crate::types::{IgnoredRange, Interruption};

const COMMENT_SEPARATOR: &str = ", ";

/// Merge overlapping ranges.
///
/// Input is sorted by start (stable) before folding. A range overlaps the
/// accumulated one only if it starts strictly before its end, so touching
/// ranges stay separate. Comments of merged ranges are joined in input order.
pub fn merge_overlapping(
    mut ranges: Vec<IgnoredRange>,
) -> Result<Vec<IgnoredRange>, ComputeError> {
    if ranges.is_empty() {
        return Err(ComputeError::EmptyRanges);
    }
    ranges.sort_by_key(|range| range.start);

    let merged = ranges
        .into_iter()
        .fold(Vec::<IgnoredRange>::new(), |mut merged, range| {
            match merged.last_mut() {
                Some(current) if range.start < current.end => {
                    current.end = current.end.max(range.end);
                    current.comment.push_str(COMMENT_SEPARATOR);
                    current.comment.push_str(&range.comment);
                }
                _ => merged.push(range),
            }
            merged
        });
    Ok(merged)
}

/// Keep ranges that intersect `[fixations_start, fixations_end)` and clip them to it.
pub fn trim_ranges(
    ranges: &[IgnoredRange],
    fixations_start: i64,
    fixations_end: i64,
) -> Vec<IgnoredRange> {
    ranges
        .iter()
        .filter(|range| range.end > fixations_start && range.start < fixations_end)
        .map(|range| IgnoredRange {
            start: range.start.max(fixations_start),
            end: range.end.min(fixations_end),
            ..range.clone()
        })
        .collect()
}

/// Whole seconds between `offset` and `timestamp`, rounded down.
pub fn relative_second(timestamp: i64, offset: i64) -> i64 {
    (timestamp - offset).div_euclid(1000)
}

/// Shift ranges to whole seconds relative to `fixations_start`.
pub fn relativize_ranges(ranges: &[IgnoredRange], fixations_start: i64) -> Vec<IgnoredRange> {
    ranges
        .iter()
        .map(|range| IgnoredRange {
            start: relative_second(range.start, fixations_start),
            end: relative_second(range.end, fixations_start),
            ..range.clone()
        })
        .collect()
}

/// Shift interruption timestamps to whole seconds relative to `fixations_start`.
pub fn relativize_interruptions(
    interruptions: &[Interruption],
    fixations_start: i64,
) -> Vec<Interruption> {
    interruptions
        .iter()
        .map(|interruption| Interruption {
            timestamp: relative_second(interruption.timestamp, fixations_start),
            ..interruption.clone()
        })
        .collect()
}
