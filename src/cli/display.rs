//! Display utilities for the Pomodoro engine CLI.
//!
//! This module provides formatted output for:
//! - Timer status
//! - Settings
//! - Completion notices
//! - Error messages

use crate::types::{format_time, Settings, TimerMode, TimerState, TimerStatus};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the full timer status.
    pub fn show_status(state: &TimerState) {
        println!("Pomodoro status");
        println!("─────────────────────────────");
        println!("Mode:      {}", state.mode.label());
        println!("Status:    {}", Self::status_label(state.status));
        println!("Remaining: {}", format_time(state.time_remaining));
        println!("Sessions:  {} today, {} total", state.today_sessions, state.completed_sessions);
    }

    /// Shows the current settings.
    pub fn show_settings(settings: &Settings) {
        println!("Focus:       {} min", settings.focus_duration);
        println!("Short break: {} min", settings.short_break_duration);
        println!("Long break:  {} min", settings.long_break_duration);
        println!("Long break every {} sessions", settings.long_break_interval);
        println!("Auto-start:  {}", Self::on_off(settings.auto_start_next));
        println!("Sound:       {}", Self::on_off(settings.sound_enabled));
    }

    /// Shows a one-line state summary.
    pub fn show_state_line(state: &TimerState) {
        println!("{}", Self::state_line(state));
    }

    /// Shows a completion notice.
    pub fn show_completion(mode: TimerMode) {
        println!("{}", Self::completion_message(mode));
    }

    /// Shows the reset confirmation.
    pub fn show_reset() {
        println!("* All timer data has been reset");
    }

    /// Shows interactive help.
    pub fn show_help() {
        println!("Commands:");
        println!("  start | pause | complete | status | settings | reset | quit");
        println!("  set <focus|short-break|long-break|interval> <number>");
        println!("  set <auto-start|sound> <on|off>");
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Formats a one-line summary, e.g. `[Focus] running 24:59 (today: 2)`.
    pub fn state_line(state: &TimerState) -> String {
        format!(
            "[{}] {} {} (today: {})",
            state.mode.label(),
            state.status.as_str(),
            format_time(state.time_remaining),
            state.today_sessions
        )
    }

    /// Returns the notice shown when `mode` completes.
    pub fn completion_message(mode: TimerMode) -> &'static str {
        match mode {
            TimerMode::Focus => "* Focus session complete. Time for a break!",
            TimerMode::ShortBreak => "* Break over. Ready to focus?",
            TimerMode::LongBreak => "* Long break over. Ready to focus?",
        }
    }

    fn status_label(status: TimerStatus) -> &'static str {
        match status {
            TimerStatus::Idle => "Idle",
            TimerStatus::Running => "Running",
            TimerStatus::Paused => "Paused",
        }
    }

    fn on_off(value: bool) -> &'static str {
        if value {
            "on"
        } else {
            "off"
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_state() -> TimerState {
        TimerState {
            mode: TimerMode::Focus,
            status: TimerStatus::Running,
            time_remaining: 1499,
            completed_sessions: 7,
            today_sessions: 2,
        }
    }

    #[test]
    fn test_state_line() {
        assert_eq!(
            Display::state_line(&create_state()),
            "[Focus] running 24:59 (today: 2)"
        );
    }

    #[test]
    fn test_state_line_long_break() {
        let state = TimerState {
            mode: TimerMode::LongBreak,
            status: TimerStatus::Idle,
            time_remaining: 900,
            ..create_state()
        };
        assert_eq!(Display::state_line(&state), "[Long Break] idle 15:00 (today: 2)");
    }

    #[test]
    fn test_completion_messages() {
        assert!(Display::completion_message(TimerMode::Focus).contains("break"));
        assert!(Display::completion_message(TimerMode::ShortBreak).contains("focus"));
        assert!(Display::completion_message(TimerMode::LongBreak).contains("Long break"));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(Display::status_label(TimerStatus::Idle), "Idle");
        assert_eq!(Display::status_label(TimerStatus::Paused), "Paused");
    }

    #[test]
    fn test_show_functions_no_panic() {
        Display::show_status(&create_state());
        Display::show_settings(&Settings::default());
        Display::show_state_line(&create_state());
        Display::show_completion(TimerMode::Focus);
        Display::show_reset();
        Display::show_help();
        Display::show_error("test");
    }
}
