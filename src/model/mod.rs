//! Entity Model
//!
//! In-memory representation of a project: tracks, patterns, notes, sample
//! clips and automation. Pure data with read accessors; mutation lives in
//! [`crate::engine`].

pub mod automation;
pub mod ids;
pub mod note;
pub mod pattern;
pub mod project;
pub mod time;
pub mod track;

pub use automation::{AutomationClip, AutomationTarget, ControlPoint, Progression};
pub use ids::{AutomationId, ClipId, IdAllocator, PatternId, TrackId};
pub use note::{pitch_to_name, Note, DEFAULT_VELOCITY};
pub use pattern::Pattern;
pub use project::Project;
pub use time::TimeSignature;
pub use track::{SampleClip, Track, TrackContent, TrackKind};
