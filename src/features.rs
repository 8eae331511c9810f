//! Feature aggregation
//!
//! This module assigns fixations and saccades to time bins and reduces each
//! bin to summary statistics:
//! - Per-chunk binning by the event midpoint second
//! - Per-chunk fixation and saccade features
//! - Per-second fixation counts for previews

use crate::types::{
    Chunk, ChunkBounds, FeatureStats, Fixation, FixationFeatures, Saccade, SaccadeFeatures,
    TimedEvent,
};
use statrs::statistics::Statistics;

/// Second of the event midpoint relative to `offset`, rounded down.
pub fn relative_seconds<E: TimedEvent>(event: &E, offset: i64) -> i64 {
    // floor((start + (end - start) / 2 - offset) / 1000) without float rounding
    (event.start() + event.end() - 2 * offset).div_euclid(2000)
}

/// Number of whole seconds needed to cover `[start, end)`.
pub fn length_seconds(start: i64, end: i64) -> i64 {
    (end - start + 999).div_euclid(1000).max(0)
}

/// Assign events to the chunk whose `[start, end)` holds their midpoint second.
///
/// Returns one bin per chunk, in the order of `chunks`. Chunks and events are
/// sorted internally, so callers need not pre-sort either. Events outside
/// every chunk are dropped.
pub fn bin_events_to_chunks<'a, E: TimedEvent>(
    events: &'a [E],
    offset: i64,
    chunks: &[ChunkBounds],
) -> Vec<Vec<&'a E>> {
    let mut timed: Vec<(i64, &E)> = events
        .iter()
        .map(|event| (relative_seconds(event, offset), event))
        .collect();
    timed.sort_by_key(|(second, _)| *second);

    let mut order: Vec<usize> = (0..chunks.len()).collect();
    order.sort_by_key(|&index| chunks[index].start);

    let mut bins: Vec<Vec<&E>> = vec![Vec::new(); chunks.len()];
    let mut cursor = 0;
    let mut binned = 0;
    for index in order {
        let chunk = &chunks[index];
        while cursor < timed.len() && timed[cursor].0 < chunk.start {
            cursor += 1;
        }
        while cursor < timed.len() && chunk.contains(timed[cursor].0) {
            bins[index].push(timed[cursor].1);
            cursor += 1;
            binned += 1;
        }
    }

    tracing::debug!(
        events = timed.len(),
        binned,
        chunks = chunks.len(),
        "binned events to chunks"
    );
    bins
}

/// Count events per second of `[start, end)` by their midpoint.
pub fn bin_per_second<E: TimedEvent>(events: &[E], start: i64, end: i64) -> Vec<usize> {
    let mut counts = vec![0usize; length_seconds(start, end) as usize];
    let mut dropped = 0usize;
    for event in events {
        let second = relative_seconds(event, start);
        match usize::try_from(second).ok().and_then(|s| counts.get_mut(s)) {
            Some(count) => *count += 1,
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::warn!(dropped, "events outside the binned range");
    }
    counts
}

/// Summary statistics of `values`, all zero for an empty set.
///
/// `var` is the sample variance and stays zero with fewer than two values.
pub fn summarize(values: &[f64]) -> FeatureStats {
    if values.is_empty() {
        return FeatureStats::default();
    }

    let var = if values.len() > 1 {
        Statistics::variance(values.iter())
    } else {
        0.0
    };

    FeatureStats {
        avg: Statistics::mean(values.iter()),
        med: median(values),
        min: Statistics::min(values.iter()),
        max: Statistics::max(values.iter()),
        var,
    }
}

/// Middle value, or the mean of the two middle values for an even count
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn durations<E: TimedEvent>(events: &[&E]) -> Vec<f64> {
    events
        .iter()
        .map(|event| event.duration_ms() as f64)
        .collect()
}

/// Fixation duration statistics and count
pub fn fixation_features(fixations: &[&Fixation]) -> FixationFeatures {
    FixationFeatures {
        duration: summarize(&durations(fixations)),
        count: fixations.len(),
    }
}

/// Saccade duration, length and angle statistics and count
pub fn saccade_features(saccades: &[&Saccade]) -> SaccadeFeatures {
    let lengths: Vec<f64> = saccades.iter().map(|saccade| saccade.length).collect();
    let angles: Vec<f64> = saccades.iter().map(|saccade| saccade.angle).collect();

    SaccadeFeatures {
        duration: summarize(&durations(saccades)),
        length: summarize(&lengths),
        angle: summarize(&angles),
        count: saccades.len(),
    }
}

/// Bin fixations and saccades into `chunks` and attach their features.
///
/// `offset` is the absolute start of the first fixation. Output follows the
/// order of `chunks`.
pub fn aggregate(
    chunks: &[ChunkBounds],
    fixations: &[Fixation],
    saccades: &[Saccade],
    offset: i64,
) -> Vec<Chunk> {
    let fixation_bins = bin_events_to_chunks(fixations, offset, chunks);
    let saccade_bins = bin_events_to_chunks(saccades, offset, chunks);

    chunks
        .iter()
        .zip(fixation_bins.iter().zip(saccade_bins.iter()))
        .map(|(bounds, (fixations, saccades))| Chunk {
            start: bounds.start,
            end: bounds.end,
            interruption: bounds.interruption,
            fixations: fixation_features(fixations),
            saccades: saccade_features(saccades),
        })
        .collect()
}
