//! Timeline chunking
//!
//! Partitions the valid part of a session-relative timeline into fixed-length
//! chunks. Chunks are anchored on the right: the chunk next to a boundary
//! (an interruption or the start of an ignored range) always ends exactly on
//! it, and any remainder shorter than a chunk is dropped at the left edge.

use crate::types::{ChunkBounds, IgnoredRange, Interruption};

/// Split `[start, end)` into right-aligned chunks of `chunk_size` seconds.
///
/// Only the last chunk carries `interruption`. A span shorter than one chunk,
/// or a zero chunk size, yields nothing.
pub fn chunk2(start: i64, end: i64, chunk_size: u32, interruption: bool) -> Vec<ChunkBounds> {
    let size = i64::from(chunk_size);
    if size == 0 || end - start < size {
        return Vec::new();
    }

    let count = (end - start) / size;
    let first = end - count * size;
    (0..count)
        .map(|i| {
            let chunk_start = first + i * size;
            ChunkBounds::new(chunk_start, chunk_start + size, interruption && i == count - 1)
        })
        .collect()
}

/// Next boundary the cursor walks to
enum Boundary {
    Interruption(i64),
    Ignored { start: i64, end: i64 },
}

/// Chunk a session of `length` seconds around its ignored ranges and
/// interruptions.
///
/// All inputs are session-relative seconds, sorted ascending. When an
/// interruption and an ignored range start at the same second, the
/// interruption is taken first. The cursor never moves backwards, and no
/// chunk ends after `length`.
pub fn chunk_session(
    length: i64,
    chunk_size: u32,
    ignored: &[IgnoredRange],
    interruptions: &[Interruption],
) -> Vec<ChunkBounds> {
    let mut chunks = Vec::new();
    let mut current = 0;
    let mut ranges = ignored.iter().peekable();
    let mut breaks = interruptions.iter().peekable();

    while current < length {
        let next_range = ranges.peek().map(|range| (range.start, range.end));
        let next_break = breaks.peek().map(|interruption| interruption.timestamp);

        let boundary = match (next_range, next_break) {
            (Some((start, _)), Some(timestamp)) if timestamp <= start => {
                breaks.next();
                Boundary::Interruption(timestamp)
            }
            (Some((start, end)), _) => {
                ranges.next();
                Boundary::Ignored { start, end }
            }
            (None, Some(timestamp)) => {
                breaks.next();
                Boundary::Interruption(timestamp)
            }
            (None, None) => {
                chunks.extend(chunk2(current, length, chunk_size, false));
                break;
            }
        };

        // Boundaries past the end of the session close the walk at `length`
        match boundary {
            Boundary::Interruption(timestamp) => {
                let inside = timestamp <= length;
                let timestamp = timestamp.min(length);
                if current < timestamp {
                    chunks.extend(chunk2(current, timestamp, chunk_size, inside));
                }
                current = current.max(timestamp);
            }
            Boundary::Ignored { start, end } => {
                let start = start.min(length);
                if current < start {
                    chunks.extend(chunk2(current, start, chunk_size, false));
                }
                current = current.max(end);
            }
        }
    }

    tracing::debug!(length, chunk_size, chunks = chunks.len(), "chunked session");
    chunks
}
