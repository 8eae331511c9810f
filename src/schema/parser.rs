//! Event log parsing and normalization
//!
//! Log lines have the form `timestamp|TYPE|arg1;arg2;...`. Timestamps are
//! ISO-8601 with millisecond precision and a trailing `Z`.

use crate::error::ComputeError;
use crate::schema::event::{
    ActiveWindow, Event, EventArgs, EventType, GazeArgs, HeadArgs, OpenArgs, ReasonArgs,
    ScrollArgs, ZoomArgs, ZoomFactor,
};
use chrono::NaiveDateTime;

/// Third field value that suppresses a line
pub const HIDDEN_MARKER: &str = "[hidden]";

/// Timestamp layout written by the logger
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Parse a log timestamp into absolute milliseconds since the epoch.
pub fn parse_timestamp(raw: &str) -> Result<i64, ComputeError> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
        .map(|date| date.and_utc().timestamp_millis())
        .map_err(|_| ComputeError::TimestampError(raw.to_string()))
}

/// Parse a single log line.
///
/// Returns `Ok(None)` for blank lines and lines hidden by the logger.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Event>, ComputeError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let sections: Vec<&str> = line.splitn(3, '|').collect();
    if sections.len() < 3 {
        return Err(ComputeError::parse(
            line_no,
            format!("expected 'timestamp|type|args', got '{line}'"),
        ));
    }
    if sections[2] == HIDDEN_MARKER {
        return Ok(None);
    }

    let timestamp =
        parse_timestamp(sections[0]).map_err(|e| ComputeError::parse(line_no, e.to_string()))?;
    let event_type = EventType::from_label(sections[1].trim());
    let args: Vec<&str> = sections[2].split(';').collect();
    let args = parse_event_args(&event_type, &args, line_no)?;

    Ok(Some(Event::new(timestamp, event_type, args)))
}

/// Parse every line of a session log, preserving source order.
pub fn parse_session(log: &str) -> Result<Vec<Event>, ComputeError> {
    let mut events = Vec::new();
    for (index, line) in log.lines().enumerate() {
        if let Some(event) = parse_line(line, index + 1)? {
            events.push(event);
        }
    }
    tracing::debug!(events = events.len(), "parsed session log");
    Ok(events)
}

/// Shift the vertical coordinate of every gaze-class event by the scroll
/// offset in effect at that point of the log.
///
/// The offset starts at 0 and is replaced by `px_after` on every SCROLL.
pub fn normalize_events(events: Vec<Event>) -> Result<Vec<Event>, ComputeError> {
    let capacity = events.len();
    let (_, normalized) = events.into_iter().try_fold(
        (0.0_f64, Vec::with_capacity(capacity)),
        |(scroll_offset, mut normalized), mut event| {
            let scroll_offset = match (&event.event_type, &mut event.args) {
                (EventType::Scroll, EventArgs::Scroll(scroll)) => scroll.px_after,
                (event_type, EventArgs::Gaze(gaze)) if event_type.is_gaze_class() => {
                    gaze.y += scroll_offset;
                    scroll_offset
                }
                (event_type, _) if event_type.is_gaze_class() => {
                    return Err(ComputeError::MissingField(format!(
                        "y coordinate of {} event at {}",
                        event_type.as_str(),
                        event.timestamp
                    )));
                }
                _ => scroll_offset,
            };
            normalized.push(event);
            Ok((scroll_offset, normalized))
        },
    )?;
    Ok(normalized)
}

/// Parse and normalize a session log in one step.
pub fn read_session(log: &str) -> Result<Vec<Event>, ComputeError> {
    normalize_events(parse_session(log)?)
}

fn parse_event_args(
    event_type: &EventType,
    args: &[&str],
    line_no: usize,
) -> Result<EventArgs, ComputeError> {
    match event_type {
        EventType::Open => Ok(EventArgs::Open(OpenArgs {
            document: args[0].to_string(),
        })),
        EventType::Scroll => parse_scroll_args(args, line_no),
        EventType::Zoom => parse_zoom_args(args, line_no),
        EventType::Active => Ok(EventArgs::Active(ActiveWindow {
            app_id: args[0].to_string(),
            app_title: args[1..].join(";"),
        })),
        EventType::Reason => Ok(EventArgs::Reason(ReasonArgs {
            reason: args[0].to_string(),
        })),
        event_type if event_type.is_gaze_class() => parse_gaze_args(args, line_no),
        EventType::Head => parse_head_args(args, line_no),
        _ => Ok(EventArgs::empty()),
    }
}

fn parse_scroll_args(args: &[&str], line_no: usize) -> Result<EventArgs, ComputeError> {
    let (px_before, px_after) = split_transition(arg(args, 0, "scroll pixels", line_no)?, line_no)?;
    let (pct_before, pct_after) =
        split_transition(arg(args, 1, "scroll percentage", line_no)?, line_no)?;

    Ok(EventArgs::Scroll(ScrollArgs {
        px_before: parse_number(px_before, "px_before", line_no)?,
        px_after: parse_number(px_after, "px_after", line_no)?,
        pct_before: parse_number(pct_before.trim_end_matches('%'), "pct_before", line_no)?,
        pct_after: parse_number(pct_after.trim_end_matches('%'), "pct_after", line_no)?,
    }))
}

fn parse_zoom_args(args: &[&str], line_no: usize) -> Result<EventArgs, ComputeError> {
    let (before, after) = split_transition(arg(args, 0, "zoom factor", line_no)?, line_no)?;
    Ok(EventArgs::Zoom(ZoomArgs {
        factor_before: ZoomFactor::parse(before),
        factor_after: ZoomFactor::parse(after),
    }))
}

fn parse_gaze_args(args: &[&str], line_no: usize) -> Result<EventArgs, ComputeError> {
    let mut point = args[0].split(',');
    let x = point.next().unwrap_or_default();
    let Some(y) = point.next() else {
        // No vertical coordinate; normalization rejects the event.
        return Ok(EventArgs::empty());
    };

    let relative = arg(args, 1, "relative position", line_no)?;
    let (rel_x, rel_y) = relative.split_once(',').ok_or_else(|| {
        ComputeError::parse(line_no, format!("expected '<rel_x>%,<rel_y>%', got '{relative}'"))
    })?;

    Ok(EventArgs::Gaze(GazeArgs {
        x: parse_number(x, "x", line_no)?,
        y: parse_number(y, "y", line_no)?,
        rel_x: parse_number(rel_x.trim_end_matches('%'), "rel_x", line_no)?,
        rel_y: parse_number(rel_y.trim_end_matches('%'), "rel_y", line_no)?,
        text: args.get(2..).map(|rest| rest.join(";")).unwrap_or_default(),
    }))
}

fn parse_head_args(args: &[&str], line_no: usize) -> Result<EventArgs, ComputeError> {
    let position = parse_triple(arg(args, 0, "head position", line_no)?, line_no)?;
    let rotation = parse_triple(arg(args, 1, "head rotation", line_no)?, line_no)?;
    Ok(EventArgs::Head(HeadArgs {
        x: position[0],
        y: position[1],
        z: position[2],
        rot_x: rotation[0],
        rot_y: rotation[1],
        rot_z: rotation[2],
    }))
}

fn arg<'a>(args: &[&'a str], index: usize, name: &str, line_no: usize) -> Result<&'a str, ComputeError> {
    args.get(index)
        .copied()
        .ok_or_else(|| ComputeError::parse(line_no, format!("missing {name}")))
}

fn split_transition(raw: &str, line_no: usize) -> Result<(&str, &str), ComputeError> {
    raw.split_once("->")
        .ok_or_else(|| ComputeError::parse(line_no, format!("expected '<before>-><after>', got '{raw}'")))
}

fn parse_triple(raw: &str, line_no: usize) -> Result<[f64; 3], ComputeError> {
    let values = raw
        .split(',')
        .map(|value| parse_number(value, "coordinate", line_no))
        .collect::<Result<Vec<_>, _>>()?;
    values
        .try_into()
        .map_err(|_| ComputeError::parse(line_no, format!("expected three values, got '{raw}'")))
}

fn parse_number(raw: &str, name: &str, line_no: usize) -> Result<f64, ComputeError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ComputeError::parse(line_no, format!("invalid {name} '{raw}'")))
}
