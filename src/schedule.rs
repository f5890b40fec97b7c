//! Activity scheduling for actor loops
//!
//! Decides, for one loop iteration, how busy an actor should be and how long it
//! waits before the next action. The wait is an inter-arrival time: it spaces
//! action *starts*, not completions.
//!
//! # Model
//!
//! - **Local hour**: wall-clock UTC hour shifted by the actor's timezone offset, modulo 24
//! - **Peak window**: half-open `[start, end)` in local hours; `start > end` wraps past midnight
//! - **Activity**: `multiplier x 2.5` inside the window, `x 0.5` outside, `0` on disk emergency
//! - **Band**: activity above 1.0 draws ops/min from the peak band, otherwise the off-peak band
//! - **Interval**: `60 / ops_per_min` seconds, jittered uniformly to `[0.5, 1.5] x base`

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    INTERVAL_JITTER, OFF_PEAK_ACTIVITY_FACTOR, PEAK_ACTIVITY_FACTOR, PEAK_BAND_ACTIVITY,
};
use crate::disk::DiskVerdict;

/// The two kinds of action an actor performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Upload,
    Download,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Upload => f.write_str("upload"),
            ActionKind::Download => f.write_str("download"),
        }
    }
}

/// Peak-hour window in actor-local hours, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct PeakWindow {
    pub start: u8,
    pub end: u8,
}

impl PeakWindow {
    pub fn new(start: u8, end: u8) -> Result<Self, String> {
        if start > 23 {
            return Err(format!("peak start hour {} outside 0..=23", start));
        }
        if end > 24 {
            return Err(format!("peak end hour {} outside 0..=24", end));
        }
        Ok(Self { start, end })
    }

    /// Whether this window crosses midnight
    pub fn wraps(&self) -> bool {
        self.start > self.end
    }

    /// Membership test for a local hour in `[0, 24)` (fractional allowed)
    pub fn contains(&self, local_hour: f64) -> bool {
        let start = f64::from(self.start);
        let end = f64::from(self.end);
        if self.wraps() {
            local_hour >= start || local_hour < end
        } else {
            start <= local_hour && local_hour < end
        }
    }
}

impl TryFrom<(u8, u8)> for PeakWindow {
    type Error = String;

    fn try_from((start, end): (u8, u8)) -> Result<Self, Self::Error> {
        PeakWindow::new(start, end)
    }
}

impl From<PeakWindow> for (u8, u8) {
    fn from(w: PeakWindow) -> Self {
        (w.start, w.end)
    }
}

impl fmt::Display for PeakWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.start, self.end)
    }
}

/// Shift a wall-clock hour by a (possibly fractional, possibly negative) offset.
pub fn shift_hour(wall_clock_hour: f64, tz_offset_hours: f64) -> f64 {
    (wall_clock_hour + tz_offset_hours).rem_euclid(24.0)
}

/// Actor-local hour for a UTC instant, with minute precision.
pub fn local_hour(now: DateTime<Utc>, tz_offset_hours: f64) -> f64 {
    let wall = f64::from(now.hour()) + f64::from(now.minute()) / 60.0;
    shift_hour(wall, tz_offset_hours)
}

/// Activity level for one iteration.
pub fn activity_level(multiplier: f64, in_peak: bool, disk: DiskVerdict) -> f64 {
    if disk == DiskVerdict::Emergency {
        return 0.0;
    }
    let factor = if in_peak {
        PEAK_ACTIVITY_FACTOR
    } else {
        OFF_PEAK_ACTIVITY_FACTOR
    };
    multiplier * factor
}

/// Operations-per-minute band, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeBand {
    pub min: f64,
    pub max: f64,
}

impl VolumeBand {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max <= self.min {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }
}

/// Base inter-arrival time for a rate in operations per minute.
pub fn base_interval(ops_per_minute: f64) -> Duration {
    Duration::from_secs_f64(60.0 / ops_per_minute.max(f64::MIN_POSITIVE))
}

/// Apply +/-50% uniform jitter to a base interval.
pub fn jittered<R: Rng + ?Sized>(base: Duration, rng: &mut R) -> Duration {
    let factor = rng.random_range((1.0 - INTERVAL_JITTER)..=(1.0 + INTERVAL_JITTER));
    base.mul_f64(factor)
}

/// Weighted coin flip between upload and download.
pub fn choose_action<R: Rng + ?Sized>(upload_ratio: f64, rng: &mut R) -> ActionKind {
    if rng.random_bool(upload_ratio.clamp(0.0, 1.0)) {
        ActionKind::Upload
    } else {
        ActionKind::Download
    }
}

/// What one loop iteration should do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationPlan {
    pub local_hour: f64,
    pub in_peak: bool,
    pub activity: f64,
    pub ops_per_minute: f64,
    pub interval: Duration,
    /// `None` when activity is zero (disk emergency): idle this iteration
    pub action: Option<ActionKind>,
}

/// Per-actor schedule parameters.
#[derive(Debug, Clone)]
pub struct ActivitySchedule {
    pub window: PeakWindow,
    pub tz_offset_hours: f64,
    pub multiplier: f64,
    pub peak_band: VolumeBand,
    pub off_peak_band: VolumeBand,
    pub upload_ratio: f64,
}

impl ActivitySchedule {
    pub fn plan<R: Rng + ?Sized>(
        &self,
        now: DateTime<Utc>,
        disk: DiskVerdict,
        rng: &mut R,
    ) -> IterationPlan {
        let hour = local_hour(now, self.tz_offset_hours);
        let in_peak = self.window.contains(hour);
        let activity = activity_level(self.multiplier, in_peak, disk);

        let band = if activity > PEAK_BAND_ACTIVITY {
            self.peak_band
        } else {
            self.off_peak_band
        };
        let ops_per_minute = band.sample(rng);
        let interval = jittered(base_interval(ops_per_minute), rng);

        let action = if activity > 0.0 {
            Some(choose_action(self.upload_ratio, rng))
        } else {
            None
        };

        IterationPlan {
            local_hour: hour,
            in_peak,
            activity,
            ops_per_minute,
            interval,
            action,
        }
    }
}
