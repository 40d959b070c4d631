//! Command definitions for the Pomodoro engine CLI.
//!
//! Uses clap derive macro for argument parsing. Interactive commands typed
//! while `run` is active are parsed by [`parse_line`].

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::types::SettingsPatch;

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomodoro Engine CLI - a terminal Pomodoro timer
#[derive(Parser, Debug)]
#[command(
    name = "pomodoro-engine",
    version,
    about = "Pomodoro timer with persisted progress and daily session counts",
    long_about = "A Pomodoro timer for the terminal.\n\
                  Focus and break countdowns, automatic mode cycling, settings and \
                  progress persisted between runs.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding persisted timer data
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the timer interactively, reading commands from stdin
    Run,

    /// Show the saved timer status
    Status,

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },

    /// Delete all saved timer data
    Reset,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Print current settings
    Show,

    /// Change one or more settings (out-of-range values are clamped)
    Set(SetArgs),
}

// ============================================================================
// Settings Arguments
// ============================================================================

/// Arguments for `settings set`
#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Focus duration in minutes (1-60)
    #[arg(long, value_name = "MINUTES")]
    pub focus: Option<u32>,

    /// Short break duration in minutes (1-30)
    #[arg(long, value_name = "MINUTES")]
    pub short_break: Option<u32>,

    /// Long break duration in minutes (1-60)
    #[arg(long, value_name = "MINUTES")]
    pub long_break: Option<u32>,

    /// Focus sessions before a long break (2-10)
    #[arg(long, value_name = "SESSIONS")]
    pub interval: Option<u32>,

    /// Start the next mode automatically when a countdown ends
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    pub auto_start: Option<bool>,

    /// Play a chime on completion
    #[arg(long, action = ArgAction::Set, value_name = "BOOL")]
    pub sound: Option<bool>,
}

impl SetArgs {
    /// Converts the arguments into a settings patch.
    pub fn to_patch(&self) -> SettingsPatch {
        SettingsPatch {
            focus_duration: self.focus.map(f64::from),
            short_break_duration: self.short_break.map(f64::from),
            long_break_duration: self.long_break.map(f64::from),
            long_break_interval: self.interval.map(f64::from),
            auto_start_next: self.auto_start,
            sound_enabled: self.sound,
        }
    }
}

// ============================================================================
// Interactive Commands
// ============================================================================

/// A command typed while the timer runs interactively.
#[derive(Debug, Clone, PartialEq)]
pub enum LineCommand {
    Start,
    Pause,
    Complete,
    Status,
    Settings,
    Set(SettingsPatch),
    Reset,
    Help,
    Quit,
}

/// Parses one line of interactive input.
///
/// Returns `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<LineCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let parsed = match command.to_ascii_lowercase().as_str() {
        "start" | "resume" | "s" => LineCommand::Start,
        "pause" | "p" => LineCommand::Pause,
        "complete" | "skip" | "c" => LineCommand::Complete,
        "status" | "st" => LineCommand::Status,
        "settings" => LineCommand::Settings,
        "reset" => LineCommand::Reset,
        "help" | "?" => LineCommand::Help,
        "quit" | "exit" | "q" => LineCommand::Quit,
        "set" => {
            let field = words.next().ok_or("usage: set <field> <value>")?;
            let value = words.next().ok_or("usage: set <field> <value>")?;
            LineCommand::Set(parse_setting(field, value)?)
        }
        other => return Err(format!("unknown command '{}' (type 'help')", other)),
    };

    Ok(Some(parsed))
}

fn parse_setting(field: &str, value: &str) -> Result<SettingsPatch, String> {
    let number = || {
        value
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", value))
    };
    let flag = || match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(format!("'{}' is not on/off", value)),
    };

    let patch = SettingsPatch::new();
    let patch = match field {
        "focus" => patch.with_focus_duration(number()?),
        "short-break" | "short" => patch.with_short_break_duration(number()?),
        "long-break" | "long" => patch.with_long_break_duration(number()?),
        "interval" => patch.with_long_break_interval(number()?),
        "auto-start" | "auto" => patch.with_auto_start_next(flag()?),
        "sound" => patch.with_sound_enabled(flag()?),
        other => return Err(format!("unknown setting '{}'", other)),
    };
    Ok(patch)
}

// ============================================================================
// Tests
// ============================================================================
