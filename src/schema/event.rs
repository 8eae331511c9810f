//! Reading-session event definitions
//!
//! One event per logged line. The logger writes a fixed set of event types;
//! anything else is kept as [`EventType::Other`] with empty args so later
//! stages simply never match it.

use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// Logged event types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    /// Document opened in the reader
    Open,
    Scroll,
    Zoom,
    /// Foreground application seen while the reader was blurred
    Active,
    /// Cause of the upcoming interruption
    Reason,
    Gaze,
    FixationStart,
    FixationData,
    FixationEnd,
    Head,
    Blur,
    Focus,
    /// For event types the engine does not interpret
    #[serde(untagged)]
    Other(String),
}

impl EventType {
    /// Map a log label onto an event type.
    pub fn from_label(label: &str) -> Self {
        match label {
            "OPEN" => EventType::Open,
            "SCROLL" => EventType::Scroll,
            "ZOOM" => EventType::Zoom,
            "ACTIVE" => EventType::Active,
            "REASON" => EventType::Reason,
            "GAZE" => EventType::Gaze,
            "FIXATIONSTART" => EventType::FixationStart,
            "FIXATIONDATA" => EventType::FixationData,
            "FIXATIONEND" => EventType::FixationEnd,
            "HEAD" => EventType::Head,
            "BLUR" => EventType::Blur,
            "FOCUS" => EventType::Focus,
            other => EventType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Open => "OPEN",
            EventType::Scroll => "SCROLL",
            EventType::Zoom => "ZOOM",
            EventType::Active => "ACTIVE",
            EventType::Reason => "REASON",
            EventType::Gaze => "GAZE",
            EventType::FixationStart => "FIXATIONSTART",
            EventType::FixationData => "FIXATIONDATA",
            EventType::FixationEnd => "FIXATIONEND",
            EventType::Head => "HEAD",
            EventType::Blur => "BLUR",
            EventType::Focus => "FOCUS",
            EventType::Other(label) => label.as_str(),
        }
    }

    /// GAZE and every type whose label begins with `FIXATION` carry screen
    /// coordinates.
    pub fn is_gaze_class(&self) -> bool {
        match self {
            EventType::Gaze
            | EventType::FixationStart
            | EventType::FixationData
            | EventType::FixationEnd => true,
            EventType::Other(label) => label.starts_with("FIXATION"),
            _ => false,
        }
    }
}

/// OPEN args
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenArgs {
    pub document: String,
}

/// SCROLL args: `<px_before>-><px_after>;<pct_before>%-><pct_after>%`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollArgs {
    pub px_before: f64,
    pub px_after: f64,
    pub pct_before: f64,
    pub pct_after: f64,
}

/// Zoom factor, either numeric or a named mode such as `page-fit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoomFactor {
    Value(f64),
    Label(String),
}

impl ZoomFactor {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(value) => ZoomFactor::Value(value),
            Err(_) => ZoomFactor::Label(raw.trim().to_string()),
        }
    }
}

/// ZOOM args
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomArgs {
    pub factor_before: ZoomFactor,
    pub factor_after: ZoomFactor,
}

/// Foreground application reported by an ACTIVE event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWindow {
    pub app_id: String,
    pub app_title: String,
}

/// REASON args
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonArgs {
    pub reason: String,
}

/// GAZE and FIXATION* args
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeArgs {
    /// Horizontal page coordinate in pixels
    pub x: f64,
    /// Vertical page coordinate in pixels (scroll-corrected after normalization)
    pub y: f64,
    /// Horizontal viewport position in percent
    pub rel_x: f64,
    /// Vertical viewport position in percent
    pub rel_y: f64,
    /// Text under the gaze point
    pub text: String,
}

/// HEAD args
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadArgs {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rot_x: f64,
    pub rot_y: f64,
    pub rot_z: f64,
}

/// Serializes as `{}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmptyArgs {}

/// Type-specific event args
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventArgs {
    Open(OpenArgs),
    Scroll(ScrollArgs),
    Zoom(ZoomArgs),
    Active(ActiveWindow),
    Reason(ReasonArgs),
    Gaze(GazeArgs),
    Head(HeadArgs),
    Empty(EmptyArgs),
}

impl EventArgs {
    pub fn empty() -> Self {
        EventArgs::Empty(EmptyArgs::default())
    }
}

/// A parsed, timestamped event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Absolute milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub args: EventArgs,
}

impl Event {
    pub fn new(timestamp: i64, event_type: EventType, args: EventArgs) -> Self {
        Self {
            timestamp,
            event_type,
            args,
        }
    }

    /// Spatial point of a gaze-class event
    pub fn point(&self) -> Option<Point> {
        match &self.args {
            EventArgs::Gaze(gaze) => Some(Point::new(gaze.x, gaze.y)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_labels() {
        for label in [
            "OPEN",
            "SCROLL",
            "ZOOM",
            "ACTIVE",
            "REASON",
            "GAZE",
            "FIXATIONSTART",
            "FIXATIONDATA",
            "FIXATIONEND",
            "HEAD",
            "BLUR",
            "FOCUS",
        ] {
            let event_type = EventType::from_label(label);
            assert!(!matches!(event_type, EventType::Other(_)), "{label}");
            assert_eq!(event_type.as_str(), label);
        }

        assert_eq!(
            EventType::from_label("MOUSE"),
            EventType::Other("MOUSE".to_string())
        );
    }

    #[test]
    fn test_event_type_serialization() {
        let json = serde_json::to_string(&EventType::FixationStart).unwrap();
        assert_eq!(json, "\"FIXATIONSTART\"");

        let json = serde_json::to_string(&EventType::Other("MOUSE".to_string())).unwrap();
        assert_eq!(json, "\"MOUSE\"");
    }

    #[test]
    fn test_gaze_class() {
        assert!(EventType::Gaze.is_gaze_class());
        assert!(EventType::FixationData.is_gaze_class());
        assert!(!EventType::Head.is_gaze_class());
        assert!(EventType::Other("FIXATIONX".to_string()).is_gaze_class());
        assert!(!EventType::Other("MOUSE".to_string()).is_gaze_class());
    }

    #[test]
    fn test_zoom_factor() {
        assert_eq!(ZoomFactor::parse("1.5"), ZoomFactor::Value(1.5));
        assert_eq!(
            ZoomFactor::parse("page-fit"),
            ZoomFactor::Label("page-fit".to_string())
        );
    }

    #[test]
    fn test_empty_args_serialize_as_object() {
        let event = Event::new(10, EventType::Blur, EventArgs::empty());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "BLUR");
        assert!(value["args"].as_object().unwrap().is_empty());
    }
}
