//! Tracksmith - agent-driven music project editing
//!
//! An agent builds a music project one tool call at a time, renders it
//! through an external renderer and reads back a compact description of
//! what it made.
//!
//! # Architecture
//!
//! - `model`: tracks, patterns, notes, sample clips and automation
//! - `engine`: the [`Session`] every tool call mutates, with validation
//! - `state`: versioned JSON project files
//! - `describe`: symbolic summaries for feedback
//! - `render`: the external renderer and acoustic analysis
//! - `tools`: the JSON tool-call boundary
//! - `theory`: chord and scale lookup

pub mod cli;
pub mod config;
pub mod describe;
pub mod engine;
pub mod error;
pub mod model;
pub mod render;
pub mod state;
pub mod theory;
pub mod tools;

pub use config::RenderConfig;
pub use engine::{create_project, NoteSpec, PitchSpec, ProjectPhase, Session};
pub use error::{Result, StudioError};
pub use render::{AudioFormat, RenderCoordinator, RenderOutcome};
pub use tools::{ToolCall, ToolHost, ToolResponse};
