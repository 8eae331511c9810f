//! Fixation and saccade derivation
//!
//! Collapses FIXATIONSTART / FIXATIONDATA* / FIXATIONEND runs into fixation
//! intervals and derives one saccade between each pair of adjacent fixations.

use crate::error::ComputeError;
use crate::geometry::{minimal_enclosing_circle, Point};
use crate::schema::{Event, EventType};
use crate::types::{Fixation, Saccade};

/// Decimal places kept for fixation circles
const CIRCLE_DECIMALS: i32 = 2;

/// Fixation under construction
struct OpenFixation {
    start: i64,
    points: Vec<Point>,
}

/// Merge fixation start/data/end events into fixation intervals.
///
/// FIXATIONDATA and FIXATIONEND outside an open fixation are ignored. A
/// FIXATIONSTART while a fixation is open discards the open one.
pub fn merge_fixations(events: &[Event]) -> Result<Vec<Fixation>, ComputeError> {
    let mut fixations = Vec::new();
    let mut current: Option<OpenFixation> = None;
    let mut orphaned = 0usize;

    for event in events {
        match event.event_type {
            EventType::FixationStart => {
                current = Some(OpenFixation {
                    start: event.timestamp,
                    points: vec![require_point(event)?],
                });
            }
            EventType::FixationData => match current.as_mut() {
                Some(fixation) => fixation.points.push(require_point(event)?),
                None => orphaned += 1,
            },
            EventType::FixationEnd => match current.take() {
                Some(mut fixation) => {
                    fixation.points.push(require_point(event)?);
                    fixations.push(close_fixation(fixation, event.timestamp)?);
                }
                None => orphaned += 1,
            },
            _ => {}
        }
    }

    if orphaned > 0 {
        tracing::warn!(orphaned, "ignored fixation events outside a fixation");
    }
    tracing::debug!(fixations = fixations.len(), "merged fixations");
    Ok(fixations)
}

fn close_fixation(fixation: OpenFixation, end: i64) -> Result<Fixation, ComputeError> {
    let circle = minimal_enclosing_circle(&fixation.points)
        .ok_or_else(|| ComputeError::MissingField("fixation points".to_string()))?
        .rounded(CIRCLE_DECIMALS);
    Ok(Fixation {
        start: fixation.start,
        end,
        points: fixation.points,
        circle,
    })
}

fn require_point(event: &Event) -> Result<Point, ComputeError> {
    event.point().ok_or_else(|| {
        ComputeError::MissingField(format!(
            "coordinates of {} event at {}",
            event.event_type.as_str(),
            event.timestamp
        ))
    })
}

/// Derive saccades between each pair of temporally adjacent fixations.
///
/// Zero or one fixation yields no saccades.
pub fn derive_saccades(fixations: &[Fixation]) -> Vec<Saccade> {
    fixations
        .windows(2)
        .map(|pair| {
            let (from, to) = (&pair[0], &pair[1]);
            let origin = from.circle.center();
            let destination = to.circle.center();
            let length = origin.distance(&destination);
            Saccade {
                start: from.end,
                end: to.start,
                origin,
                destination,
                length,
                radius_length: length - from.circle.radius - to.circle.radius,
                angle: (destination.y - origin.y)
                    .atan2(destination.x - origin.x)
                    .to_degrees(),
            }
        })
        .collect()
}
