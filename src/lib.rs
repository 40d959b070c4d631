//! Pomodoro Engine Library
//!
//! This library provides a countdown state engine for the Pomodoro technique.
//! It includes:
//! - Timer engine with Focus / Short Break / Long Break cycling
//! - End-timestamp anchored countdown that does not drift under slow polling
//! - Validated, clamped user settings
//! - Best-effort persistence through a key-value storage trait
//! - Daily session counting with midnight rollover
//! - An async service that owns the engine and drives its tick loop
//! - CLI command parsing and display utilities

pub mod cli;
pub mod clock;
pub mod engine;
pub mod settings;
pub mod sound;
pub mod storage;
pub mod types;

// Re-export commonly used types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{
    CompletionListener, ServiceError, TickOutcome, TimerEngine, TimerHandle, TimerService,
    TICK_INTERVAL,
};
pub use settings::{validate, SettingsStore};
pub use sound::{MockSoundPlayer, SoundError, SoundPlayer, TerminalBell};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use types::{Settings, SettingsPatch, TimerMode, TimerState, TimerStatus};
