//! CLI module for the Pomodoro engine.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic

pub mod commands;
pub mod display;

pub use commands::{parse_line, Cli, Commands, LineCommand, SetArgs, SettingsCommand};
pub use display::Display;
