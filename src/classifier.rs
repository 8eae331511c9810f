//! Interruption classification
//!
//! A state machine over the normalized event stream. It decides which time
//! ranges are not valid reading time (before the document opened, the lag
//! around an interruption, the tail of the session) and records every
//! blur/focus cycle as an interruption.
//!
//! ```text
//! before --OPEN--> reading --BLUR--> blurred --FOCUS--> reading
//! ```

use crate::config::TimingConfig;
use crate::error::ComputeError;
use crate::intervals::merge_overlapping;
use crate::schema::{ActiveWindow, Event, EventArgs, EventType};
use crate::types::{IgnoredRange, Interruption, InterruptionClass};

/// Reason value marking an externally caused interruption
pub const EXTERNAL_REASON: &str = "interruption";

const COMMENT_OPEN: &str = "Before and shortly after open";
const COMMENT_INTERRUPTION_LAG: &str = "Interruption lag";
const COMMENT_NON_READING: &str = "Non-reading time";
const COMMENT_TAIL: &str = "Ignore last gazes";

/// Reading phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingPhase {
    /// No document opened yet
    Before,
    Reading,
    /// Reader window lost focus
    Blurred,
}

/// Classifier state threaded through the event fold
#[derive(Debug, Clone)]
pub struct ClassifierState {
    pub phase: ReadingPhase,
    /// Last gaze outside an ignoring window
    pub last_gaze_timestamp: Option<i64>,
    /// Gaze before this absolute time is disregarded
    pub ignoring_until: Option<i64>,
    /// Pending cause of the next interruption
    pub reason: Option<String>,
    /// Applications seen while blurred
    pub active_windows: Vec<ActiveWindow>,
    pub ignored: Vec<IgnoredRange>,
    pub interruptions: Vec<Interruption>,
}

impl Default for ClassifierState {
    fn default() -> Self {
        Self {
            phase: ReadingPhase::Before,
            last_gaze_timestamp: None,
            ignoring_until: None,
            reason: None,
            active_windows: Vec::new(),
            ignored: Vec::new(),
            interruptions: Vec::new(),
        }
    }
}

impl ClassifierState {
    /// Advance the machine by one event.
    ///
    /// `session_start` is the timestamp of the first event in the session.
    pub fn step(mut self, event: &Event, session_start: i64, timing: &TimingConfig) -> Self {
        match (&event.event_type, self.phase) {
            (EventType::Open, _) => {
                let ignoring_until = event.timestamp + timing.resumption_lag_ms;
                self.ignoring_until = Some(ignoring_until);
                self.ignored.push(IgnoredRange::stripped(
                    self.last_gaze_timestamp.unwrap_or(session_start),
                    ignoring_until,
                    COMMENT_OPEN,
                ));
                self.phase = ReadingPhase::Reading;
            }
            (event_type, ReadingPhase::Reading) if event_type.is_gaze_class() => {
                if self
                    .ignoring_until
                    .map_or(true, |until| until < event.timestamp)
                {
                    self.last_gaze_timestamp = Some(event.timestamp);
                }
            }
            (EventType::Blur, ReadingPhase::Reading) => {
                self.phase = ReadingPhase::Blurred;
            }
            (EventType::Active, ReadingPhase::Blurred) => {
                if let EventArgs::Active(window) = &event.args {
                    self.active_windows.push(window.clone());
                }
            }
            (EventType::Reason, _) => {
                if let EventArgs::Reason(args) = &event.args {
                    self.reason = Some(args.reason.clone());
                }
            }
            (EventType::Focus, ReadingPhase::Blurred) => {
                self.close_interruption(event.timestamp, timing);
            }
            _ => {}
        }
        self
    }

    fn close_interruption(&mut self, timestamp: i64, timing: &TimingConfig) {
        let ignoring_until = timestamp + timing.resumption_lag_ms;
        self.ignoring_until = Some(ignoring_until);

        if let Some(last_gaze) = self.last_gaze_timestamp.take() {
            let class = if self.reason.as_deref() == Some(EXTERNAL_REASON) {
                InterruptionClass::Normal
            } else {
                InterruptionClass::Target
            };

            if timing.interruption_lag_ms > 0 {
                self.ignored.push(IgnoredRange::stripped(
                    last_gaze - timing.interruption_lag_ms,
                    last_gaze,
                    COMMENT_INTERRUPTION_LAG,
                ));
            }
            self.ignored.push(IgnoredRange::stripped(
                last_gaze,
                ignoring_until,
                COMMENT_NON_READING,
            ));
            self.interruptions.push(Interruption {
                timestamp: last_gaze - timing.interruption_lag_ms,
                class,
                reason: self.reason.clone(),
                active: std::mem::take(&mut self.active_windows),
            });
        }

        self.reason = None;
        self.active_windows.clear();
        self.phase = ReadingPhase::Reading;
    }

    /// Close the session: strip the tail after the last trusted gaze.
    fn finish(mut self, session_end: i64, timing: &TimingConfig) -> Classification {
        let tail_start = self.last_gaze_timestamp.unwrap_or(0) - timing.resumption_lag_ms;
        let tail_start = match self.ignored.last() {
            Some(previous) => tail_start.max(previous.end),
            None => tail_start,
        };
        self.ignored
            .push(IgnoredRange::stripped(tail_start, session_end, COMMENT_TAIL));

        Classification {
            ignored: self.ignored,
            interruptions: self.interruptions,
        }
    }
}

/// Classifier output in absolute milliseconds
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Ignored ranges, sorted by start and merged
    pub ignored: Vec<IgnoredRange>,
    /// Interruptions in event order
    pub interruptions: Vec<Interruption>,
}

/// Classify the timeline of a normalized, time-ordered event sequence.
pub fn classify_times(
    events: &[Event],
    timing: &TimingConfig,
) -> Result<Classification, ComputeError> {
    let (first, last) = match (events.first(), events.last()) {
        (Some(first), Some(last)) => (first.timestamp, last.timestamp),
        _ => {
            return Err(ComputeError::InsufficientEvents(
                "cannot classify an empty session".to_string(),
            ))
        }
    };

    let mut classification = events
        .iter()
        .fold(ClassifierState::default(), |state, event| {
            state.step(event, first, timing)
        })
        .finish(last, timing);

    classification.ignored = merge_overlapping(classification.ignored)?;

    tracing::debug!(
        ignored = classification.ignored.len(),
        interruptions = classification.interruptions.len(),
        "classified session timeline"
    );
    Ok(classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GazeArgs, OpenArgs, ReasonArgs};

    fn event(timestamp: i64, event_type: EventType) -> Event {
        let args = match event_type {
            EventType::Gaze
            | EventType::FixationStart
            | EventType::FixationData
            | EventType::FixationEnd => EventArgs::Gaze(GazeArgs {
                x: 0.0,
                y: 0.0,
                rel_x: 0.0,
                rel_y: 0.0,
                text: String::new(),
            }),
            EventType::Open => EventArgs::Open(OpenArgs {
                document: "paper.pdf".to_string(),
            }),
            _ => EventArgs::empty(),
        };
        Event::new(timestamp, event_type, args)
    }

    fn reason(timestamp: i64, reason: &str) -> Event {
        Event::new(
            timestamp,
            EventType::Reason,
            EventArgs::Reason(ReasonArgs {
                reason: reason.to_string(),
            }),
        )
    }

    fn active(timestamp: i64, app_id: &str) -> Event {
        Event::new(
            timestamp,
            EventType::Active,
            EventArgs::Active(ActiveWindow {
                app_id: app_id.to_string(),
                app_title: format!("{app_id} window"),
            }),
        )
    }

    fn spans(classification: &Classification) -> Vec<(i64, i64)> {
        classification
            .ignored
            .iter()
            .map(|range| (range.start, range.end))
            .collect()
    }

    #[test]
    fn test_open_strips_session_start() {
        let events = vec![
            event(0, EventType::Gaze),
            event(1000, EventType::Open),
            event(5000, EventType::Gaze),
            event(20000, EventType::Gaze),
            event(21000, EventType::Head),
        ];
        let result = classify_times(&events, &TimingConfig::default()).unwrap();

        // [0, 4000] from OPEN, tail from 20000 - 3000
        assert_eq!(spans(&result), vec![(0, 4000), (17000, 21000)]);
        assert_eq!(result.ignored[0].comment, "Before and shortly after open");
        assert_eq!(result.ignored[1].comment, "Ignore last gazes");
        assert!(result.interruptions.is_empty());
    }

    #[test]
    fn test_gaze_inside_ignoring_window_is_not_trusted() {
        let events = vec![
            event(0, EventType::Open),
            event(2000, EventType::Gaze),
            event(3000, EventType::Gaze),
            event(10000, EventType::Head),
        ];
        let result = classify_times(&events, &TimingConfig::default()).unwrap();

        // No trusted gaze: the tail starts at the end of the open range.
        // Touching ranges are not merged.
        assert_eq!(spans(&result), vec![(0, 3000), (3000, 10000)]);
        assert_eq!(result.ignored[1].comment, "Ignore last gazes");
    }

    #[test]
    fn test_external_interruption() {
        let events = vec![
            event(0, EventType::Open),
            event(10000, EventType::FixationStart),
            event(10200, EventType::FixationEnd),
            event(11000, EventType::Blur),
            reason(11500, "interruption"),
            active(12000, "mail"),
            active(13000, "chat"),
            event(15000, EventType::Focus),
            event(20000, EventType::Gaze),
            event(30000, EventType::Gaze),
            event(31000, EventType::Head),
        ];
        let result = classify_times(&events, &TimingConfig::default()).unwrap();

        assert_eq!(
            spans(&result),
            vec![(0, 3000), (10200, 18000), (27000, 31000)]
        );
        assert_eq!(result.ignored[1].comment, "Non-reading time");

        assert_eq!(result.interruptions.len(), 1);
        let interruption = &result.interruptions[0];
        assert_eq!(interruption.timestamp, 10200);
        assert_eq!(interruption.class, InterruptionClass::Normal);
        assert_eq!(interruption.reason.as_deref(), Some("interruption"));
        let apps: Vec<&str> = interruption
            .active
            .iter()
            .map(|window| window.app_id.as_str())
            .collect();
        assert_eq!(apps, vec!["mail", "chat"]);
    }

    #[test]
    fn test_target_interruption_without_reason() {
        let events = vec![
            event(0, EventType::Open),
            event(10000, EventType::Gaze),
            event(11000, EventType::Blur),
            event(15000, EventType::Focus),
            event(40000, EventType::Gaze),
        ];
        let result = classify_times(&events, &TimingConfig::default()).unwrap();

        assert_eq!(result.interruptions.len(), 1);
        assert_eq!(result.interruptions[0].class, InterruptionClass::Target);
        assert_eq!(result.interruptions[0].reason, None);
    }

    #[test]
    fn test_interruption_lag() {
        let timing = TimingConfig {
            interruption_lag_ms: 2000,
            ..TimingConfig::default()
        };
        let events = vec![
            event(0, EventType::Open),
            event(10000, EventType::Gaze),
            event(11000, EventType::Blur),
            event(15000, EventType::Focus),
            event(30000, EventType::Gaze),
            event(40000, EventType::Head),
        ];
        let result = classify_times(&events, &timing).unwrap();

        // Lag range [8000, 10000] touches the non-reading range but does not
        // overlap it, so both stay separate.
        assert_eq!(
            spans(&result),
            vec![(0, 3000), (8000, 10000), (10000, 18000), (27000, 40000)]
        );
        assert_eq!(result.ignored[1].comment, "Interruption lag");
        assert_eq!(result.interruptions[0].timestamp, 8000);
    }

    #[test]
    fn test_focus_without_trusted_gaze_emits_nothing() {
        let events = vec![
            event(0, EventType::Open),
            event(1000, EventType::Blur),
            active(1500, "mail"),
            event(2000, EventType::Focus),
            event(10000, EventType::Gaze),
            event(20000, EventType::Gaze),
        ];
        let result = classify_times(&events, &TimingConfig::default()).unwrap();

        assert!(result.interruptions.is_empty());
        assert_eq!(spans(&result), vec![(0, 3000), (17000, 20000)]);
    }

    #[test]
    fn test_active_and_blur_ignored_outside_their_phase() {
        let events = vec![
            event(0, EventType::Blur),
            active(100, "mail"),
            event(200, EventType::Open),
            active(300, "mail"),
            event(5000, EventType::Gaze),
            event(6000, EventType::Blur),
            event(7000, EventType::Focus),
            event(20000, EventType::Gaze),
        ];
        let result = classify_times(&events, &TimingConfig::default()).unwrap();

        assert_eq!(result.interruptions.len(), 1);
        assert!(result.interruptions[0].active.is_empty());
    }

    #[test]
    fn test_reason_recorded_in_any_phase() {
        let events = vec![
            reason(0, "interruption"),
            event(100, EventType::Open),
            event(5000, EventType::Gaze),
            event(6000, EventType::Blur),
            event(7000, EventType::Focus),
            event(20000, EventType::Gaze),
        ];
        let result = classify_times(&events, &TimingConfig::default()).unwrap();
        assert_eq!(result.interruptions[0].class, InterruptionClass::Normal);
    }

    #[test]
    fn test_session_without_open_is_fully_ignored() {
        let events = vec![
            event(1000, EventType::Gaze),
            event(9000, EventType::Gaze),
        ];
        let result = classify_times(&events, &TimingConfig::default()).unwrap();
        assert_eq!(spans(&result), vec![(-3000, 9000)]);
    }

    #[test]
    fn test_empty_session_is_an_error() {
        let result = classify_times(&[], &TimingConfig::default());
        assert!(matches!(result, Err(ComputeError::InsufficientEvents(_))));
    }

    #[test]
    fn test_state_step_is_explicit() {
        let timing = TimingConfig::default();
        let state = ClassifierState::default();
        assert_eq!(state.phase, ReadingPhase::Before);

        let state = state.step(&event(0, EventType::Open), 0, &timing);
        assert_eq!(state.phase, ReadingPhase::Reading);
        assert_eq!(state.ignoring_until, Some(3000));

        let state = state.step(&event(4000, EventType::Gaze), 0, &timing);
        assert_eq!(state.last_gaze_timestamp, Some(4000));

        let state = state.step(&event(4500, EventType::Blur), 0, &timing);
        assert_eq!(state.phase, ReadingPhase::Blurred);

        let state = state.step(&event(4600, EventType::Gaze), 0, &timing);
        assert_eq!(state.last_gaze_timestamp, Some(4000));

        let state = state.step(&event(9000, EventType::Focus), 0, &timing);
        assert_eq!(state.phase, ReadingPhase::Reading);
        assert_eq!(state.last_gaze_timestamp, None);
        assert_eq!(state.interruptions.len(), 1);
    }
}
