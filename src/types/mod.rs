//! Core data types for the Pomodoro engine.
//!
//! This module defines the data structures used for:
//! - Timer mode and status
//! - User settings with their validation bounds
//! - Timer state snapshots
//! - Persisted storage records
//! - Time formatting for display

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// TimerMode
// ============================================================================

/// The countdown currently being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    /// Focused work session
    #[default]
    Focus,
    /// Short break between focus sessions
    ShortBreak,
    /// Long break after every `long_break_interval` focus sessions
    LongBreak,
}

impl TimerMode {
    /// Returns the persisted name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Focus => "focus",
            TimerMode::ShortBreak => "shortBreak",
            TimerMode::LongBreak => "longBreak",
        }
    }

    /// Returns the human-readable label of the mode.
    pub fn label(&self) -> &'static str {
        match self {
            TimerMode::Focus => "Focus",
            TimerMode::ShortBreak => "Break",
            TimerMode::LongBreak => "Long Break",
        }
    }

    /// Parses a persisted mode name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "focus" => Some(TimerMode::Focus),
            "shortBreak" => Some(TimerMode::ShortBreak),
            "longBreak" => Some(TimerMode::LongBreak),
            _ => None,
        }
    }

    /// Returns true for either break mode.
    pub fn is_break(&self) -> bool {
        matches!(self, TimerMode::ShortBreak | TimerMode::LongBreak)
    }
}

// ============================================================================
// TimerStatus
// ============================================================================

/// Whether the countdown is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    /// Not counting down; remaining time is the value to resume from
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Counting down was interrupted by the user
    Paused,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Inclusive bounds for a numeric setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingBounds {
    pub min: u32,
    pub max: u32,
}

impl SettingBounds {
    const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Returns true if `value` lies within the bounds.
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Focus duration bounds in minutes.
pub const FOCUS_DURATION_BOUNDS: SettingBounds = SettingBounds::new(1, 60);
/// Short break duration bounds in minutes.
pub const SHORT_BREAK_DURATION_BOUNDS: SettingBounds = SettingBounds::new(1, 30);
/// Long break duration bounds in minutes.
pub const LONG_BREAK_DURATION_BOUNDS: SettingBounds = SettingBounds::new(1, 60);
/// Bounds for the number of focus sessions before a long break.
pub const LONG_BREAK_INTERVAL_BOUNDS: SettingBounds = SettingBounds::new(2, 10);

/// User-configurable durations and toggles.
///
/// Every numeric field is always inside its bound; values only enter this
/// type through [`crate::settings::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Focus duration in minutes (1-60)
    pub focus_duration: u32,
    /// Short break duration in minutes (1-30)
    pub short_break_duration: u32,
    /// Long break duration in minutes (1-60)
    pub long_break_duration: u32,
    /// Completed focus sessions between long breaks (2-10)
    pub long_break_interval: u32,
    /// Whether the next mode starts running when a countdown expires
    pub auto_start_next: bool,
    /// Whether to play a chime on completion
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            focus_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            long_break_interval: 4,
            auto_start_next: false,
            sound_enabled: true,
        }
    }
}

impl Settings {
    /// Returns the configured duration of `mode` in seconds.
    pub fn duration_for_mode(&self, mode: TimerMode) -> u32 {
        let minutes = match mode {
            TimerMode::Focus => self.focus_duration,
            TimerMode::ShortBreak => self.short_break_duration,
            TimerMode::LongBreak => self.long_break_duration,
        };
        minutes * 60
    }
}

// ============================================================================
// SettingsPatch
// ============================================================================

/// A partial, unvalidated settings update.
///
/// Numeric fields are carried as `f64` so that non-finite and fractional
/// input reaches validation unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub focus_duration: Option<f64>,
    pub short_break_duration: Option<f64>,
    pub long_break_duration: Option<f64>,
    pub long_break_interval: Option<f64>,
    pub auto_start_next: Option<bool>,
    pub sound_enabled: Option<bool>,
}

impl SettingsPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_focus_duration(mut self, minutes: f64) -> Self {
        self.focus_duration = Some(minutes);
        self
    }

    pub fn with_short_break_duration(mut self, minutes: f64) -> Self {
        self.short_break_duration = Some(minutes);
        self
    }

    pub fn with_long_break_duration(mut self, minutes: f64) -> Self {
        self.long_break_duration = Some(minutes);
        self
    }

    pub fn with_long_break_interval(mut self, sessions: f64) -> Self {
        self.long_break_interval = Some(sessions);
        self
    }

    pub fn with_auto_start_next(mut self, enabled: bool) -> Self {
        self.auto_start_next = Some(enabled);
        self
    }

    pub fn with_sound_enabled(mut self, enabled: bool) -> Self {
        self.sound_enabled = Some(enabled);
        self
    }

    /// Returns true if the patch sets no field.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Reads a patch from an untrusted JSON value.
    ///
    /// Fields with the wrong type are dropped, so they fall back to defaults
    /// during validation.
    pub fn from_json(value: &Value) -> Self {
        let number = |key: &str| value.get(key).and_then(Value::as_f64);
        let flag = |key: &str| value.get(key).and_then(Value::as_bool);

        Self {
            focus_duration: number("focusDuration"),
            short_break_duration: number("shortBreakDuration"),
            long_break_duration: number("longBreakDuration"),
            long_break_interval: number("longBreakInterval"),
            auto_start_next: flag("autoStartNext"),
            sound_enabled: flag("soundEnabled"),
        }
    }

    /// Overlays this patch onto `base`, returning a patch with every field set.
    pub fn merged_onto(&self, base: &Settings) -> Self {
        let full = SettingsPatch::from(base);
        Self {
            focus_duration: self.focus_duration.or(full.focus_duration),
            short_break_duration: self.short_break_duration.or(full.short_break_duration),
            long_break_duration: self.long_break_duration.or(full.long_break_duration),
            long_break_interval: self.long_break_interval.or(full.long_break_interval),
            auto_start_next: self.auto_start_next.or(full.auto_start_next),
            sound_enabled: self.sound_enabled.or(full.sound_enabled),
        }
    }
}

impl From<&Settings> for SettingsPatch {
    fn from(settings: &Settings) -> Self {
        Self {
            focus_duration: Some(f64::from(settings.focus_duration)),
            short_break_duration: Some(f64::from(settings.short_break_duration)),
            long_break_duration: Some(f64::from(settings.long_break_duration)),
            long_break_interval: Some(f64::from(settings.long_break_interval)),
            auto_start_next: Some(settings.auto_start_next),
            sound_enabled: Some(settings.sound_enabled),
        }
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Snapshot of the countdown state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    /// Current mode
    pub mode: TimerMode,
    /// Current status
    pub status: TimerStatus,
    /// Remaining seconds in the current mode
    pub time_remaining: u32,
    /// Focus sessions completed over the lifetime of the stored data
    pub completed_sessions: u32,
    /// Focus sessions completed since local midnight
    pub today_sessions: u32,
}

impl TimerState {
    /// Creates an idle focus state with the full focus duration.
    pub fn new(settings: &Settings) -> Self {
        Self {
            mode: TimerMode::Focus,
            status: TimerStatus::Idle,
            time_remaining: settings.duration_for_mode(TimerMode::Focus),
            completed_sessions: 0,
            today_sessions: 0,
        }
    }

    /// Returns true if the timer is counting down.
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    /// Returns true if the timer is paused.
    pub fn is_paused(&self) -> bool {
        self.status == TimerStatus::Paused
    }

    /// Returns true if the timer is idle.
    pub fn is_idle(&self) -> bool {
        self.status == TimerStatus::Idle
    }
}

// ============================================================================
// Persisted Records
// ============================================================================

/// Timer state as written to storage.
///
/// `time_remaining` is only written while the timer is idle, since a running
/// countdown cannot survive a reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTimerState {
    pub mode: TimerMode,
    pub completed_sessions: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<u32>,
}

impl PersistedTimerState {
    /// Builds the record for `state`.
    pub fn from_state(state: &TimerState) -> Self {
        Self {
            mode: state.mode,
            completed_sessions: state.completed_sessions,
            time_remaining: state.is_idle().then_some(state.time_remaining),
        }
    }

    /// Reads the record from an untrusted JSON value.
    ///
    /// Unknown modes become [`TimerMode::Focus`]; malformed counters become 0;
    /// a missing or non-positive remaining time becomes `None`.
    pub fn from_json(value: &Value) -> Self {
        let mode = value
            .get("mode")
            .and_then(Value::as_str)
            .and_then(TimerMode::from_name)
            .unwrap_or_default();
        let completed_sessions = value
            .get("completedSessions")
            .and_then(Value::as_f64)
            .and_then(non_negative_count)
            .unwrap_or(0);
        let time_remaining = value
            .get("timeRemaining")
            .and_then(Value::as_f64)
            .and_then(non_negative_count)
            .filter(|seconds| *seconds > 0);

        Self {
            mode,
            completed_sessions,
            time_remaining,
        }
    }
}

/// Daily session counter as written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodaySessions {
    /// Local calendar date the count belongs to
    pub date: NaiveDate,
    /// Focus sessions completed on `date`
    pub sessions: u32,
}

impl TodaySessions {
    pub fn new(date: NaiveDate, sessions: u32) -> Self {
        Self { date, sessions }
    }

    /// Reads the record from an untrusted JSON value.
    ///
    /// Returns `None` when the date is missing or unparsable, since a count
    /// without a day cannot be attributed.
    pub fn from_json(value: &Value) -> Option<Self> {
        let date = value
            .get("date")
            .and_then(Value::as_str)
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())?;
        let sessions = value
            .get("sessions")
            .and_then(Value::as_f64)
            .and_then(non_negative_count)
            .unwrap_or(0);

        Some(Self { date, sessions })
    }
}

/// Rounds a finite, non-negative number into a `u32` count.
fn non_negative_count(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value.round().min(f64::from(u32::MAX)) as u32)
}

// ============================================================================
// Formatting
// ============================================================================

/// Formats seconds as `MM:SS` with leading zeros, e.g. `125` -> `02:05`.
pub fn format_time(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Formats seconds as `M:SS`, e.g. `125` -> `2:05`.
pub fn format_time_mini(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

// ============================================================================
// Tests
// ============================================================================
