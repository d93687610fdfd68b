//! Automation clips: parameter curves attached to a track.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ids::AutomationId;
use super::pattern::validate_placement;
use crate::error::{Result, StudioError};

/// Parameter an automation clip drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationTarget {
    /// Track volume in percent (0–200).
    Volume,
    /// Track pan (-100..=100).
    Pan,
    /// Any other named parameter; values are not range-checked.
    Custom(String),
}

impl AutomationTarget {
    /// Allowed value range, if the target has one.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        match self {
            AutomationTarget::Volume => Some((0.0, 200.0)),
            AutomationTarget::Pan => Some((-100.0, 100.0)),
            AutomationTarget::Custom(_) => None,
        }
    }

    pub(crate) fn check_value(&self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(StudioError::invalid("value", "must be a finite number"));
        }
        if let Some((lo, hi)) = self.value_range() {
            if value < lo || value > hi {
                return Err(StudioError::invalid(
                    "value",
                    format!("{} outside {}..={} for {}", value, lo, hi, self),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for AutomationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomationTarget::Volume => write!(f, "volume"),
            AutomationTarget::Pan => write!(f, "pan"),
            AutomationTarget::Custom(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for AutomationTarget {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" => Err(StudioError::invalid("target", "parameter name is empty")),
            "volume" | "vol" => Ok(AutomationTarget::Volume),
            "pan" | "panning" => Ok(AutomationTarget::Pan),
            other => Ok(AutomationTarget::Custom(other.to_string())),
        }
    }
}

/// Interpolation between control points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progression {
    Discrete,
    #[default]
    Linear,
    Cubic,
}

impl FromStr for Progression {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "discrete" | "0" => Ok(Progression::Discrete),
            "linear" | "1" => Ok(Progression::Linear),
            "cubic" | "cubic_hermite" | "2" => Ok(Progression::Cubic),
            other => Err(StudioError::invalid(
                "progression",
                format!("unknown progression '{}'", other),
            )),
        }
    }
}

/// One control point; `time` is in beats from the clip start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub time: f64,
    pub value: f64,
}

/// Automation clip on a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationClip {
    pub(crate) id: AutomationId,
    pub(crate) target: AutomationTarget,
    pub(crate) start_bar: f64,
    pub(crate) length_bars: f64,
    #[serde(default)]
    pub(crate) progression: Progression,
    #[serde(default)]
    pub(crate) points: Vec<ControlPoint>,
}

impl AutomationClip {
    pub(crate) fn new(
        id: AutomationId,
        target: AutomationTarget,
        start_bar: f64,
        length_bars: f64,
        progression: Progression,
    ) -> Self {
        AutomationClip {
            id,
            target,
            start_bar,
            length_bars,
            progression,
            points: Vec::new(),
        }
    }

    pub fn id(&self) -> AutomationId {
        self.id
    }

    pub fn target(&self) -> &AutomationTarget {
        &self.target
    }

    pub fn start_bar(&self) -> f64 {
        self.start_bar
    }

    pub fn length_bars(&self) -> f64 {
        self.length_bars
    }

    pub fn progression(&self) -> Progression {
        self.progression
    }

    /// Points in strictly increasing time order.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Insert a point; an existing point at the same time is overwritten.
    pub(crate) fn upsert_point(&mut self, point: ControlPoint) {
        match self
            .points
            .binary_search_by(|p| p.time.total_cmp(&point.time))
        {
            Ok(idx) => self.points[idx].value = point.value,
            Err(idx) => self.points.insert(idx, point),
        }
    }

    pub(crate) fn check_point(&self, point: &ControlPoint) -> Result<()> {
        if !point.time.is_finite() || point.time < 0.0 {
            return Err(StudioError::invalid(
                "time",
                format!("{} must be a non-negative beat offset", point.time),
            ));
        }
        self.target.check_value(point.value)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_placement(self.start_bar, self.length_bars)?;
        for point in &self.points {
            self.check_point(point)?;
        }
        if self.points.windows(2).any(|w| w[0].time >= w[1].time) {
            return Err(StudioError::invalid(
                "points",
                "control points are not strictly increasing in time",
            ));
        }
        Ok(())
    }
}
