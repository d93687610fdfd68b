//! Track and project-level operations.

use log::debug;

use super::Session;
use crate::error::{Result, StudioError};
use crate::model::project::check_tempo;
use crate::model::track::{check_pan, check_volume};
use crate::model::{TimeSignature, Track, TrackId, TrackKind};

fn check_name(param: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StudioError::invalid(param, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

impl Session {
    /// Append a track and return its id.
    pub fn add_track(&mut self, kind: TrackKind, name: &str) -> Result<TrackId> {
        let name = check_name("name", name)?;
        let project = self.edit();
        let id = project.ids.track();
        project.tracks.push(Track::new(id, kind, name));
        debug!("[ENGINE] Added {} track {}", kind, id);
        Ok(id)
    }

    /// Remove a track with everything on it. Other ids are unaffected.
    pub fn remove_track(&mut self, id: TrackId) -> Result<Track> {
        let index = self
            .project
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StudioError::not_found("track", id))?;
        let removed = self.edit().tracks.remove(index);
        debug!("[ENGINE] Removed track {} ({})", id, removed.name);
        Ok(removed)
    }

    pub fn rename_track(&mut self, id: TrackId, name: &str) -> Result<()> {
        self.project.track(id)?;
        let name = check_name("name", name)?;
        self.edit().track_mut(id)?.name = name;
        debug!("[ENGINE] Renamed track {}", id);
        Ok(())
    }

    /// Set volume in percent. Out-of-range values are rejected, not clamped.
    pub fn set_track_volume(&mut self, id: TrackId, volume: f64) -> Result<()> {
        self.project.track(id)?;
        check_volume(volume)?;
        self.edit().track_mut(id)?.volume = volume;
        debug!("[ENGINE] Track {} volume {}", id, volume);
        Ok(())
    }

    /// Set pan (-100 left, 100 right). Out-of-range values are rejected.
    pub fn set_track_pan(&mut self, id: TrackId, pan: f64) -> Result<()> {
        self.project.track(id)?;
        check_pan(pan)?;
        self.edit().track_mut(id)?.pan = pan;
        debug!("[ENGINE] Track {} pan {}", id, pan);
        Ok(())
    }

    pub fn set_track_mute(&mut self, id: TrackId, muted: bool) -> Result<()> {
        self.project.track(id)?;
        self.edit().track_mut(id)?.muted = muted;
        debug!("[ENGINE] Track {} muted={}", id, muted);
        Ok(())
    }

    pub fn set_track_solo(&mut self, id: TrackId, solo: bool) -> Result<()> {
        self.project.track(id)?;
        self.edit().track_mut(id)?.solo = solo;
        debug!("[ENGINE] Track {} solo={}", id, solo);
        Ok(())
    }

    /// Change the instrument plugin of an instrument track.
    pub fn set_instrument(&mut self, id: TrackId, plugin: &str) -> Result<()> {
        let track = self.project.track(id)?;
        if track.kind() != TrackKind::Instrument {
            return Err(StudioError::invalid(
                "track",
                format!("track {} is a {} track", id, track.kind()),
            ));
        }
        let plugin = check_name("instrument", plugin)?.to_lowercase();
        if let crate::model::TrackContent::Instrument { instrument, .. } =
            &mut self.edit().track_mut(id)?.content
        {
            *instrument = plugin;
        }
        debug!("[ENGINE] Track {} instrument changed", id);
        Ok(())
    }

    pub fn set_tempo(&mut self, bpm: f64) -> Result<()> {
        check_tempo(bpm)?;
        self.edit().tempo = bpm;
        debug!("[ENGINE] Tempo {} BPM", bpm);
        Ok(())
    }

    pub fn set_time_signature(&mut self, time_signature: TimeSignature) -> Result<()> {
        time_signature.validate()?;
        self.edit().time_signature = time_signature;
        debug!("[ENGINE] Time signature {}", time_signature);
        Ok(())
    }

    pub fn rename_project(&mut self, name: &str) -> Result<()> {
        let name = check_name("name", name)?;
        self.edit().name = name;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::create(120.0, TimeSignature::default()).unwrap()
    }

    #[test]
    fn test_ids_survive_removal() {
        let mut s = session();
        let a = s.add_track(TrackKind::Instrument, "A").unwrap();
        let b = s.add_track(TrackKind::Instrument, "B").unwrap();
        s.remove_track(a).unwrap();
        let c = s.add_track(TrackKind::Sample, "C").unwrap();

        assert_ne!(c, a);
        assert_eq!(s.project().track(b).unwrap().name(), "B");
        assert!(matches!(
            s.remove_track(a),
            Err(StudioError::NotFound { .. })
        ));
    }

    #[test]
    fn test_volume_rejected_not_clamped() {
        let mut s = session();
        let id = s.add_track(TrackKind::Instrument, "Pad").unwrap();
        let before = s.revision();
        assert!(s.set_track_volume(id, 250.0).is_err());
        assert!(s.set_track_pan(id, -150.0).is_err());
        assert_eq!(s.project().track(id).unwrap().volume(), 100.0);
        assert_eq!(s.revision(), before);

        s.set_track_volume(id, 0.0).unwrap();
        s.set_track_pan(id, -100.0).unwrap();
        assert_eq!(s.project().track(id).unwrap().volume(), 0.0);
        assert_eq!(s.project().track(id).unwrap().pan(), -100.0);
    }

    #[test]
    fn test_instrument_only_on_instrument_tracks() {
        let mut s = session();
        let inst = s.add_track(TrackKind::Instrument, "Lead").unwrap();
        let smp = s.add_track(TrackKind::Sample, "Drums").unwrap();
        s.set_instrument(inst, "Kicker").unwrap();
        assert_eq!(s.project().track(inst).unwrap().instrument(), Some("kicker"));
        assert!(s.set_instrument(smp, "kicker").is_err());
    }

    #[test]
    fn test_flags_and_names() {
        let mut s = session();
        let id = s.add_track(TrackKind::Instrument, "Bass").unwrap();
        s.set_track_mute(id, true).unwrap();
        s.set_track_solo(id, true).unwrap();
        s.rename_track(id, "Sub Bass").unwrap();
        let track = s.project().track(id).unwrap();
        assert!(track.is_muted() && track.is_solo());
        assert_eq!(track.name(), "Sub Bass");
        assert!(s.rename_track(id, "   ").is_err());
        assert!(s.add_track(TrackKind::Sample, "").is_err());
    }

    #[test]
    fn test_project_settings() {
        let mut s = session();
        s.set_tempo(90.0).unwrap();
        assert!(s.set_tempo(0.0).is_err());
        s.set_time_signature(TimeSignature { numerator: 6, denominator: 8 })
            .unwrap();
        assert!(s
            .set_time_signature(TimeSignature { numerator: 4, denominator: 3 })
            .is_err());
        s.rename_project("Night Drive").unwrap();
        assert_eq!(s.project().tempo(), 90.0);
        assert_eq!(s.project().beats_per_bar(), 3.0);
        assert_eq!(s.project().name(), "Night Drive");
    }
}
