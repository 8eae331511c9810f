//! Core data types for GaRSI Flux
//!
//! This module defines the records that flow between the timeline stages:
//! fixations and saccades, ignored ranges and interruptions, and feature-bearing
//! chunks.

use crate::error::ComputeError;
use crate::geometry::{Circle, Point};
use crate::schema::ActiveWindow;
use serde::{Deserialize, Serialize};

/// Anything with a start and end in absolute milliseconds
pub trait TimedEvent {
    fn start(&self) -> i64;
    fn end(&self) -> i64;

    fn duration_ms(&self) -> i64 {
        self.end() - self.start()
    }
}

/// A merged fixation interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    /// Start in absolute milliseconds
    pub start: i64,
    /// End in absolute milliseconds
    pub end: i64,
    /// Sampled gaze points, scroll corrected
    pub points: Vec<Point>,
    /// Smallest enclosing circle of `points`, rounded to 2 decimals
    pub circle: Circle,
}

impl TimedEvent for Fixation {
    fn start(&self) -> i64 {
        self.start
    }

    fn end(&self) -> i64 {
        self.end
    }
}

/// Eye movement between two consecutive fixations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Saccade {
    /// End of the previous fixation
    pub start: i64,
    /// Start of the next fixation
    pub end: i64,
    /// Center of the previous fixation circle
    pub origin: Point,
    /// Center of the next fixation circle
    pub destination: Point,
    /// Distance between circle centers
    pub length: f64,
    /// Center distance minus both circle radii
    pub radius_length: f64,
    /// Direction in degrees, `atan2(dy, dx)`
    pub angle: f64,
}

impl TimedEvent for Saccade {
    fn start(&self) -> i64 {
        self.start
    }

    fn end(&self) -> i64 {
        self.end
    }
}

/// Why a range is excluded from reading time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeClass {
    /// Produced by the interruption classifier
    Stripped,
    /// Submitted by a reviewer
    Annotated,
}

/// A time range excluded from reading-time analysis.
///
/// `start` and `end` are absolute milliseconds until the range is
/// relativized, session-relative whole seconds afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredRange {
    pub start: i64,
    pub end: i64,
    pub class: RangeClass,
    pub comment: String,
}

impl IgnoredRange {
    pub fn stripped(start: i64, end: i64, comment: impl Into<String>) -> Self {
        Self {
            start,
            end,
            class: RangeClass::Stripped,
            comment: comment.into(),
        }
    }
}

/// Reviewer-submitted ignored range in absolute milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub start: i64,
    pub end: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Annotation {
    /// Reject ranges that end before they start
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.start > self.end {
            return Err(ComputeError::InvalidAnnotation(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

impl From<&Annotation> for IgnoredRange {
    fn from(annotation: &Annotation) -> Self {
        IgnoredRange {
            start: annotation.start,
            end: annotation.end,
            class: RangeClass::Annotated,
            comment: annotation
                .comment
                .clone()
                .unwrap_or_else(|| "User annotation".to_string()),
        }
    }
}

/// Cause of an interruption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptionClass {
    /// Externally caused (`reason == "interruption"`)
    Normal,
    /// Any other cause
    Target,
}

/// A blur/focus cycle that took the reader away from the document.
///
/// `timestamp` is absolute milliseconds until relativized, then
/// session-relative whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interruption {
    pub timestamp: i64,
    pub class: InterruptionClass,
    pub reason: Option<String>,
    /// Applications seen while blurred, in order
    pub active: Vec<ActiveWindow>,
}

/// Boundaries of a chunk in session-relative seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkBounds {
    pub start: i64,
    pub end: i64,
    /// Whether this chunk ends exactly at an interruption
    pub interruption: bool,
}

impl ChunkBounds {
    pub fn new(start: i64, end: i64, interruption: bool) -> Self {
        Self {
            start,
            end,
            interruption,
        }
    }

    pub fn contains(&self, second: i64) -> bool {
        second >= self.start && second < self.end
    }
}

/// Summary statistics over one quantity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureStats {
    pub avg: f64,
    pub med: f64,
    pub min: f64,
    pub max: f64,
    /// Sample variance, zero with fewer than two values
    pub var: f64,
}

/// Fixation features of a chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FixationFeatures {
    /// Fixation duration in milliseconds
    pub duration: FeatureStats,
    pub count: usize,
}

/// Saccade features of a chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SaccadeFeatures {
    /// Saccade duration in milliseconds
    pub duration: FeatureStats,
    /// Center-to-center length in pixels
    pub length: FeatureStats,
    /// Direction in degrees
    pub angle: FeatureStats,
    pub count: usize,
}

/// A fixed-length window of valid reading time with aggregated features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub start: i64,
    pub end: i64,
    pub interruption: bool,
    pub fixations: FixationFeatures,
    pub saccades: SaccadeFeatures,
}

impl Chunk {
    pub fn bounds(&self) -> ChunkBounds {
        ChunkBounds::new(self.start, self.end, self.interruption)
    }
}
