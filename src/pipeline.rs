//! Pipeline orchestration
//!
//! This module provides the public API for GaRSI Flux.
//! It runs one reading session from its raw log to feature-bearing chunks.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chunker::chunk_session;
use crate::classifier::classify_times;
use crate::config::{EngineConfig, TimingConfig};
use crate::error::ComputeError;
use crate::features::{aggregate, bin_per_second, length_seconds};
use crate::fixation::{derive_saccades, merge_fixations};
use crate::intervals::{
    merge_overlapping, relativize_interruptions, relativize_ranges, trim_ranges,
};
use crate::schema::{read_session, Event};
use crate::types::{Annotation, Chunk, Fixation, IgnoredRange, Interruption, Saccade};

/// Fixations, saccades and the classified timeline of one session.
///
/// `ignored` and `interruptions` are in whole seconds relative to `start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTimeline {
    /// Absolute start of the first fixation in milliseconds
    pub start: i64,
    /// Absolute end of the last fixation in milliseconds
    pub end: i64,
    pub fixations: Vec<Fixation>,
    pub saccades: Vec<Saccade>,
    pub ignored: Vec<IgnoredRange>,
    pub interruptions: Vec<Interruption>,
}

impl SessionTimeline {
    /// Reading length in whole seconds, rounded up
    pub fn length_seconds(&self) -> i64 {
        length_seconds(self.start, self.end)
    }
}

/// Per-second fixation counts with the timeline for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPreview {
    pub counts: Vec<usize>,
    pub ignored: Vec<IgnoredRange>,
    pub interruptions: Vec<Interruption>,
}

/// Everything produced for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutput {
    pub timeline: SessionTimeline,
    pub preview: SessionPreview,
    pub chunks: Vec<Chunk>,
}

impl SessionOutput {
    pub fn to_json(&self) -> Result<String, ComputeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Build the session timeline from normalized events.
///
/// Pipeline stages:
/// 1. merge_fixations / derive_saccades - Fixation intervals and saccades
/// 2. classify_times - Ignored ranges and interruptions (absolute ms)
/// 3. merge_overlapping - Union with `annotations` and merge
/// 4. trim_ranges / relativize - Clip to the fixation span, shift to seconds
pub fn build_timeline(
    events: &[Event],
    timing: &TimingConfig,
    annotations: &[Annotation],
) -> Result<SessionTimeline, ComputeError> {
    for annotation in annotations {
        annotation.validate()?;
    }

    let fixations = merge_fixations(events)?;
    let (start, end) = match (fixations.first(), fixations.last()) {
        (Some(first), Some(last)) => (first.start, last.end),
        _ => {
            return Err(ComputeError::InsufficientFixations(
                "session contains no complete fixation".to_string(),
            ))
        }
    };
    let saccades = derive_saccades(&fixations);

    let classification = classify_times(events, timing)?;
    let mut ranges = classification.ignored;
    ranges.extend(annotations.iter().map(IgnoredRange::from));
    let merged = merge_overlapping(ranges)?;

    let trimmed = trim_ranges(&merged, start, end);
    let ignored = relativize_ranges(&trimmed, start);
    // Interruptions after the last fixation have no reading time to close
    let length = length_seconds(start, end);
    let mut interruptions = relativize_interruptions(&classification.interruptions, start);
    interruptions.retain(|interruption| interruption.timestamp <= length);

    tracing::debug!(
        fixations = fixations.len(),
        saccades = saccades.len(),
        ignored = ignored.len(),
        interruptions = interruptions.len(),
        annotations = annotations.len(),
        "built session timeline"
    );

    Ok(SessionTimeline {
        start,
        end,
        fixations,
        saccades,
        ignored,
        interruptions,
    })
}

/// Per-second fixation counts for display.
pub fn preview(timeline: &SessionTimeline) -> SessionPreview {
    SessionPreview {
        counts: bin_per_second(&timeline.fixations, timeline.start, timeline.end),
        ignored: timeline.ignored.clone(),
        interruptions: timeline.interruptions.clone(),
    }
}

/// Chunk the valid reading time and attach per-chunk features.
pub fn featurize(timeline: &SessionTimeline, chunk_size: u32) -> Vec<Chunk> {
    let bounds = chunk_session(
        timeline.length_seconds(),
        chunk_size,
        &timeline.ignored,
        &timeline.interruptions,
    );
    aggregate(&bounds, &timeline.fixations, &timeline.saccades, timeline.start)
}

/// Process a raw session log with the given configuration.
///
/// # Example
/// ```ignore
/// let output = process_session(&log, &EngineConfig::default())?;
/// println!("{}", output.to_json()?);
/// ```
pub fn process_session(log: &str, config: &EngineConfig) -> Result<SessionOutput, ComputeError> {
    SessionProcessor::new(*config).process(log)
}

/// Session processor bound to one engine configuration.
///
/// Processing is idempotent: the same log and annotations always yield the
/// same output, so callers may cache results and recompute after edits.
#[derive(Debug, Clone, Default)]
pub struct SessionProcessor {
    config: EngineConfig,
}

impl SessionProcessor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Process a raw session log
    pub fn process(&self, log: &str) -> Result<SessionOutput, ComputeError> {
        self.process_with_annotations(log, &[])
    }

    /// Process a raw session log with user annotations unioned into the
    /// ignored ranges
    pub fn process_with_annotations(
        &self,
        log: &str,
        annotations: &[Annotation],
    ) -> Result<SessionOutput, ComputeError> {
        let events = read_session(log)?;
        self.process_events(&events, annotations)
    }

    /// Process already parsed and normalized events
    pub fn process_events(
        &self,
        events: &[Event],
        annotations: &[Annotation],
    ) -> Result<SessionOutput, ComputeError> {
        self.config.validate()?;
        let timeline = build_timeline(events, &self.config.timing, annotations)?;
        let preview = preview(&timeline);
        let chunks = featurize(&timeline, self.config.chunk_size);
        Ok(SessionOutput {
            timeline,
            preview,
            chunks,
        })
    }
}

/// A session log on disk, identified by user folder and file stem
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionSource {
    pub user: String,
    pub file: String,
    pub path: PathBuf,
}

/// List session logs laid out as `<root>/<user>/<file>`, sorted by user and file.
pub fn discover_sessions(root: &Path) -> Result<Vec<SessionSource>, ComputeError> {
    let mut sessions = Vec::new();
    for user_entry in fs::read_dir(root)? {
        let user_dir = user_entry?.path();
        if !user_dir.is_dir() {
            continue;
        }
        let Some(user) = file_name(&user_dir) else {
            continue;
        };
        for file_entry in fs::read_dir(&user_dir)? {
            let path = file_entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(file) = path.file_stem().and_then(|stem| stem.to_str()) {
                sessions.push(SessionSource {
                    user: user.clone(),
                    file: file.to_string(),
                    path: path.clone(),
                });
            }
        }
    }
    sessions.sort();
    tracing::debug!(root = %root.display(), sessions = sessions.len(), "discovered sessions");
    Ok(sessions)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{InterruptionClass, RangeClass};

    const LOG: &str = "\
2023-03-01T10:00:00.000Z|OPEN|paper.pdf
2023-03-01T10:00:04.000Z|FIXATIONSTART|100,100;10%,10%;intro
2023-03-01T10:00:04.200Z|FIXATIONEND|104,100;10%,10%;intro
2023-03-01T10:00:05.000Z|FIXATIONSTART|200,100;20%,10%;intro
2023-03-01T10:00:05.300Z|FIXATIONEND|200,100;20%,10%;intro
2023-03-01T10:00:20.000Z|FIXATIONSTART|300,100;30%,10%;body
2023-03-01T10:00:20.300Z|FIXATIONEND|300,100;30%,10%;body
2023-03-01T10:00:21.000Z|BLUR|
2023-03-01T10:00:21.500Z|REASON|interruption
2023-03-01T10:00:22.000Z|ACTIVE|mail;Inbox
2023-03-01T10:00:30.000Z|FOCUS|
2023-03-01T10:00:40.000Z|FIXATIONSTART|100,500;10%,50%;body
2023-03-01T10:00:40.400Z|FIXATIONEND|100,500;10%,50%;body
2023-03-01T10:01:04.000Z|FIXATIONSTART|100,600;10%,60%;end
2023-03-01T10:01:04.500Z|FIXATIONEND|100,600;10%,60%;end
2023-03-01T10:01:05.000Z|HEAD|0,0,0;0,0,0
";

    #[test]
    fn test_build_timeline() {
        let events = read_session(LOG).unwrap();
        let timeline = build_timeline(&events, &TimingConfig::default(), &[]).unwrap();

        assert_eq!(timeline.fixations.len(), 5);
        assert_eq!(timeline.saccades.len(), 4);
        assert_eq!(timeline.length_seconds(), 61);

        // Non-reading time after the blur and the tail, relative to the
        // first fixation at 4s
        let spans: Vec<(i64, i64)> = timeline
            .ignored
            .iter()
            .map(|range| (range.start, range.end))
            .collect();
        assert_eq!(spans, vec![(16, 29), (57, 60)]);
        assert_eq!(timeline.interruptions.len(), 1);
        assert_eq!(timeline.interruptions[0].timestamp, 16);
        assert_eq!(timeline.interruptions[0].class, InterruptionClass::Normal);
    }

    #[test]
    fn test_annotations_are_merged() {
        let events = read_session(LOG).unwrap();
        let start = events[1].timestamp;
        let annotation = Annotation {
            start: start + 40_000,
            end: start + 45_000,
            comment: Some("Looked away".to_string()),
        };
        let timeline = build_timeline(&events, &TimingConfig::default(), &[annotation]).unwrap();

        assert_eq!(timeline.ignored.len(), 3);
        assert_eq!(timeline.ignored[1].class, RangeClass::Annotated);
        assert_eq!((timeline.ignored[1].start, timeline.ignored[1].end), (40, 45));
        assert_eq!(timeline.ignored[1].comment, "Looked away");
    }

    #[test]
    fn test_reversed_annotation_is_rejected() {
        let events = read_session(LOG).unwrap();
        let start = events[1].timestamp;
        let annotation = Annotation {
            start: start + 45_000,
            end: start + 40_000,
            comment: None,
        };
        let result = build_timeline(&events, &TimingConfig::default(), &[annotation]);
        assert!(matches!(result, Err(ComputeError::InvalidAnnotation(_))));
    }

    #[test]
    fn test_interruption_after_last_fixation_is_dropped() {
        let log = "\
2023-03-01T10:00:00.000Z|OPEN|paper.pdf
2023-03-01T10:00:04.000Z|FIXATIONSTART|100,100;10%,10%;intro
2023-03-01T10:00:04.300Z|FIXATIONEND|100,100;10%,10%;intro
2023-03-01T10:00:30.000Z|FIXATIONSTART|200,100;20%,10%;body
2023-03-01T10:00:30.300Z|FIXATIONEND|200,100;20%,10%;body
2023-03-01T10:00:50.000Z|GAZE|200,100;20%,10%;body
2023-03-01T10:00:51.000Z|BLUR|
2023-03-01T10:01:00.000Z|FOCUS|
";
        let output = SessionProcessor::default().process(log).unwrap();
        let length = output.timeline.length_seconds();

        assert_eq!(length, 27);
        assert!(output.timeline.interruptions.is_empty());
        assert!(output.chunks.iter().all(|chunk| chunk.end <= length));
        assert!(output.chunks.iter().all(|chunk| !chunk.interruption));
        let spans: Vec<(i64, i64)> = output
            .chunks
            .iter()
            .map(|chunk| (chunk.start, chunk.end))
            .collect();
        assert_eq!(spans, vec![(2, 7), (7, 12), (12, 17), (17, 22), (22, 27)]);
        assert_eq!(output.chunks[4].fixations.count, 1);
    }

    #[test]
    fn test_session_without_fixations_fails() {
        let log = "2023-03-01T10:00:00.000Z|OPEN|paper.pdf\n";
        let result = SessionProcessor::default().process(log);
        assert!(matches!(result, Err(ComputeError::InsufficientFixations(_))));
    }

    #[test]
    fn test_processor_rejects_invalid_config() {
        let config = EngineConfig {
            chunk_size: 0,
            ..EngineConfig::default()
        };
        let result = SessionProcessor::new(config).process(LOG);
        assert!(matches!(result, Err(ComputeError::InvalidConfig(_))));
    }

    #[test]
    fn test_process_is_idempotent() {
        let processor = SessionProcessor::default();
        let first = processor.process(LOG).unwrap().to_json().unwrap();
        let second = processor.process(LOG).unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }
}
