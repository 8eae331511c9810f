//! Reading-session log schema
//!
//! This module defines the typed events written by the reading logger and
//! the parser that turns raw log lines into scroll-corrected events.

mod event;
mod parser;

pub use event::*;
pub use parser::*;
