//! GaRSI Flux - Reading-session timeline engine for interruption research
//!
//! Flux transforms raw gaze and interaction logs from reading sessions into
//! fixed-size, feature-bearing time chunks through a deterministic pipeline:
//! parsing → fixation merging → interruption classification → range
//! merging and trimming → chunking → feature aggregation.
//!
//! ## Modules
//!
//! - **Timeline Pipeline**: Process one session log into fixations, ignored
//!   ranges, interruptions and chunks
//! - **Dataset**: Flatten chunk features into classifier inputs

pub mod chunker;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod fixation;
pub mod geometry;
pub mod intervals;
pub mod pipeline;
pub mod schema;
pub mod types;

pub use config::{EngineConfig, TimingConfig};
pub use error::ComputeError;
pub use pipeline::{
    build_timeline, discover_sessions, featurize, process_session, SessionOutput, SessionProcessor,
    SessionSource, SessionTimeline,
};

// Schema exports
pub use schema::{read_session, Event, EventArgs, EventType};

// Domain exports
pub use types::{Annotation, Chunk, Fixation, IgnoredRange, Interruption, Saccade};

/// Flux version embedded in session output
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "garsi-flux";
