//! Mutation Engine
//!
//! [`Session`] is the explicit, session-scoped state every tool call runs
//! against: the project, the theory lookup used for chord expansion, and the
//! lifecycle phase. Operations validate every input before touching the
//! project, so a failed call never leaves partial state behind.

mod automation;
mod patterns;
mod tracks;

pub use patterns::{NoteSpec, PitchSpec};

use std::fmt;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::error::{Result, StudioError};
use crate::model::project::check_tempo;
use crate::model::{Project, TimeSignature};
use crate::render::{AudioFormat, RenderCoordinator, RenderOutcome};
use crate::state;
use crate::theory::{ChordTable, TheoryLookup};

/// Where the project is in its save/render lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPhase {
    /// Never written to disk in this session.
    Unsaved,
    /// Saved to (or loaded from) a project file.
    Saved,
    /// Rendered to audio at least once since the last save.
    Rendered,
}

impl fmt::Display for ProjectPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectPhase::Unsaved => write!(f, "unsaved"),
            ProjectPhase::Saved => write!(f, "saved"),
            ProjectPhase::Rendered => write!(f, "rendered"),
        }
    }
}

/// Create an empty project.
pub fn create_project(tempo: f64, time_signature: TimeSignature) -> Result<Project> {
    check_tempo(tempo)?;
    time_signature.validate()?;
    Ok(Project::new(tempo, time_signature))
}

/// One agent's editing session over one project.
pub struct Session {
    project: Project,
    theory: Box<dyn TheoryLookup>,
    phase: ProjectPhase,
    revision: u64,
    saved_revision: Option<u64>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("project", &self.project.name)
            .field("phase", &self.phase)
            .field("revision", &self.revision)
            .finish()
    }
}

impl Session {
    /// Start a session on a new, empty project.
    pub fn create(tempo: f64, time_signature: TimeSignature) -> Result<Self> {
        let project = create_project(tempo, time_signature)?;
        info!(
            "Created project at {} BPM, {}",
            tempo, time_signature
        );
        Ok(Session::from_project(project, ProjectPhase::Unsaved))
    }

    /// Start a session on a project file.
    pub fn load(path: &Path) -> Result<Self> {
        let project = state::load(path)?;
        let mut session = Session::from_project(project, ProjectPhase::Saved);
        session.saved_revision = Some(0);
        Ok(session)
    }

    fn from_project(project: Project, phase: ProjectPhase) -> Self {
        Session {
            project,
            theory: Box::new(ChordTable::new()),
            phase,
            revision: 0,
            saved_revision: None,
        }
    }

    /// Swap the chord/scale lookup used by `add_chord` and `add_scale`.
    pub fn with_theory(mut self, theory: Box<dyn TheoryLookup>) -> Self {
        self.theory = theory;
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn phase(&self) -> ProjectPhase {
        self.phase
    }

    /// Number of mutations that changed the project in this session.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// True if the project changed since it was last saved or loaded.
    pub fn has_unsaved_changes(&self) -> bool {
        self.saved_revision != Some(self.revision)
    }

    /// Save to `path`, or to the path the project was last saved to.
    pub fn save(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let target = match path {
            Some(p) => p.to_path_buf(),
            None => self.project.path.clone().ok_or_else(|| {
                StudioError::invalid("path", "project has never been saved; give a path")
            })?,
        };
        state::save(&mut self.project, &target)?;
        self.phase = ProjectPhase::Saved;
        self.saved_revision = Some(self.revision);
        Ok(target)
    }

    /// Render the current in-memory project and describe the result.
    pub fn render(
        &mut self,
        coordinator: &RenderCoordinator,
        output: &Path,
        format: Option<AudioFormat>,
    ) -> Result<RenderOutcome> {
        let outcome = coordinator.render(&self.project, output, format)?;
        self.phase = ProjectPhase::Rendered;
        Ok(outcome)
    }

    pub(crate) fn theory(&self) -> &dyn TheoryLookup {
        self.theory.as_ref()
    }

    /// Mutable project access for operations; bumps the revision.
    pub(crate) fn edit(&mut self) -> &mut Project {
        self.revision += 1;
        &mut self.project
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_project_rejects_bad_tempo() {
        for tempo in [0.0, -120.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                create_project(tempo, TimeSignature::default()),
                Err(StudioError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_new_session_is_unsaved() {
        let session = Session::create(120.0, TimeSignature::default()).unwrap();
        assert_eq!(session.phase(), ProjectPhase::Unsaved);
        assert!(session.has_unsaved_changes());
        assert_eq!(session.project().tempo(), 120.0);
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut session = Session::create(120.0, TimeSignature::default()).unwrap();
        assert!(matches!(
            session.save(None),
            Err(StudioError::InvalidParameter { .. })
        ));
    }
}
