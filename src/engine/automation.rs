//! Automation clip operations.

use std::f64::consts::TAU;

use log::debug;

use super::Session;
use crate::error::{Result, StudioError};
use crate::model::pattern::validate_placement;
use crate::model::{AutomationClip, AutomationId, AutomationTarget, ControlPoint, Progression, TrackId};

/// Points generated per LFO cycle.
pub const LFO_POINTS_PER_CYCLE: u32 = 8;

/// Upper bound on LFO steps in one clip (4096 cycles).
pub const MAX_LFO_STEPS: u64 = 32_768;

impl Session {
    /// Attach an empty automation clip to a track.
    pub fn add_automation_clip(
        &mut self,
        track_id: TrackId,
        target: AutomationTarget,
        start_bar: f64,
        length_bars: f64,
        progression: Progression,
    ) -> Result<AutomationId> {
        self.project.track(track_id)?;
        validate_placement(start_bar, length_bars)?;

        let project = self.edit();
        let id = project.ids.automation();
        project.track_mut(track_id)?.automation.push(AutomationClip::new(
            id,
            target,
            start_bar,
            length_bars,
            progression,
        ));
        debug!("[ENGINE] Automation clip {} on track {}", id, track_id);
        Ok(id)
    }

    pub fn remove_automation_clip(&mut self, id: AutomationId) -> Result<AutomationClip> {
        let track_id = self
            .project
            .tracks()
            .iter()
            .find(|t| t.automation().iter().any(|a| a.id() == id))
            .map(|t| t.id())
            .ok_or_else(|| StudioError::not_found("automation clip", id))?;
        let clips = &mut self.edit().track_mut(track_id)?.automation;
        let index = clips
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| StudioError::not_found("automation clip", id))?;
        Ok(clips.remove(index))
    }

    /// Add one point; a point already at `time` takes the new value.
    pub fn add_automation_point(&mut self, id: AutomationId, time: f64, value: f64) -> Result<()> {
        let point = ControlPoint { time, value };
        self.project.automation(id)?.check_point(&point)?;
        self.edit().automation_mut(id)?.upsert_point(point);
        debug!("[ENGINE] Automation {} point at {} = {}", id, time, value);
        Ok(())
    }

    /// Replace all points. Any invalid point rejects the call; for repeated
    /// times the last one given wins.
    pub fn set_automation_points(&mut self, id: AutomationId, points: &[ControlPoint]) -> Result<usize> {
        let clip = self.project.automation(id)?;
        for point in points {
            clip.check_point(point)?;
        }
        let clip = self.edit().automation_mut(id)?;
        clip.points.clear();
        for point in points {
            clip.upsert_point(*point);
        }
        debug!("[ENGINE] Automation {} set to {} points", id, clip.points.len());
        Ok(clip.points.len())
    }

    /// Replace the clip's points with a linear ramp.
    ///
    /// `end_time` defaults to the end of the clip.
    pub fn create_automation_ramp(
        &mut self,
        id: AutomationId,
        start_value: f64,
        end_value: f64,
        start_time: f64,
        end_time: Option<f64>,
    ) -> Result<()> {
        let clip = self.project.automation(id)?;
        let end_time = end_time.unwrap_or(clip.length_bars() * self.project.beats_per_bar());
        let start = ControlPoint { time: start_time, value: start_value };
        let end = ControlPoint { time: end_time, value: end_value };
        clip.check_point(&start)?;
        clip.check_point(&end)?;
        if end_time <= start_time {
            return Err(StudioError::invalid(
                "end_time",
                format!("{} must be after start time {}", end_time, start_time),
            ));
        }

        let clip = self.edit().automation_mut(id)?;
        clip.progression = Progression::Linear;
        clip.points = vec![start, end];
        debug!("[ENGINE] Automation {} ramp {} -> {}", id, start_value, end_value);
        Ok(())
    }

    /// Replace the clip's points with a sine wave between `min` and `max`.
    ///
    /// Without `cycles`, the count follows from the clip length and
    /// `cycles_per_bar`, with at least one cycle.
    pub fn create_automation_lfo(
        &mut self,
        id: AutomationId,
        min: f64,
        max: f64,
        cycles_per_bar: f64,
        cycles: Option<u32>,
    ) -> Result<usize> {
        let clip = self.project.automation(id)?;
        clip.target().check_value(min)?;
        clip.target().check_value(max)?;
        if min > max {
            return Err(StudioError::invalid(
                "min",
                format!("{} is above max {}", min, max),
            ));
        }
        if !cycles_per_bar.is_finite() || cycles_per_bar <= 0.0 {
            return Err(StudioError::invalid(
                "cycles_per_bar",
                format!("{} must be positive", cycles_per_bar),
            ));
        }
        if cycles == Some(0) {
            return Err(StudioError::invalid("cycles", "must be at least 1"));
        }

        // Float-to-int casts saturate, so huge rates land in the bound check.
        let cycles = match cycles {
            Some(n) => u64::from(n),
            None => ((clip.length_bars() * cycles_per_bar) as u64).max(1),
        };
        let total_points = cycles
            .checked_mul(u64::from(LFO_POINTS_PER_CYCLE))
            .filter(|steps| *steps <= MAX_LFO_STEPS)
            .ok_or_else(|| {
                StudioError::invalid(
                    "cycles",
                    format!(
                        "{} cycles exceed the limit of {} per clip",
                        cycles,
                        MAX_LFO_STEPS / u64::from(LFO_POINTS_PER_CYCLE)
                    ),
                )
            })?;
        let total_beats = clip.length_bars() * self.project.beats_per_bar();
        let center = (max + min) / 2.0;
        let amplitude = (max - min) / 2.0;

        let points: Vec<ControlPoint> = (0..=total_points)
            .map(|i| {
                let phase = i as f64 / LFO_POINTS_PER_CYCLE as f64 * TAU;
                ControlPoint {
                    time: i as f64 / total_points as f64 * total_beats,
                    value: (center + amplitude * phase.sin()).clamp(min, max),
                }
            })
            .collect();

        let clip = self.edit().automation_mut(id)?;
        clip.progression = Progression::Cubic;
        clip.points = points;
        debug!("[ENGINE] Automation {} LFO, {} cycles", id, cycles);
        Ok(clip.points.len())
    }

    /// Remove every point. Idempotent.
    pub fn clear_automation(&mut self, id: AutomationId) -> Result<usize> {
        let count = self.project.automation(id)?.points().len();
        if count > 0 {
            self.edit().automation_mut(id)?.points.clear();
        }
        Ok(count)
    }
}
