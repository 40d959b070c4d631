//! Completion chime playback.
//!
//! The engine only needs "play the chime now"; how that sounds is up to the
//! [`SoundPlayer`] implementation. Failures stay inside this module's error
//! type and the engine logs them without affecting the timer.

mod error;

pub use error::SoundError;

use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Trait for chime playback implementations.
pub trait SoundPlayer: Send + Sync {
    /// Plays the completion chime. Should not block for the length of the
    /// sound.
    ///
    /// # Errors
    ///
    /// Returns an error if playback fails.
    fn play_chime(&self) -> Result<(), SoundError>;
}

/// Rings the terminal bell on stderr.
///
/// Reports [`SoundError::DeviceNotAvailable`] when stderr is not a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl SoundPlayer for TerminalBell {
    fn play_chime(&self) -> Result<(), SoundError> {
        let mut stderr = io::stderr().lock();
        if !stderr.is_terminal() {
            return Err(SoundError::DeviceNotAvailable(
                "stderr is not a terminal".to_string(),
            ));
        }
        stderr
            .write_all(b"\x07")
            .and_then(|()| stderr.flush())
            .map_err(|e| SoundError::PlaybackError(e.to_string()))
    }
}

/// Mock sound player for testing.
#[derive(Debug, Default)]
pub struct MockSoundPlayer {
    play_count: AtomicUsize,
    should_fail: AtomicBool,
}

impl MockSoundPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Number of chimes requested, including failed ones.
    #[must_use]
    pub fn play_count(&self) -> usize {
        self.play_count.load(Ordering::SeqCst)
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play_chime(&self) -> Result<(), SoundError> {
        self.play_count.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        Ok(())
    }
}

impl<T: SoundPlayer + ?Sized> SoundPlayer for std::sync::Arc<T> {
    fn play_chime(&self) -> Result<(), SoundError> {
        (**self).play_chime()
    }
}
