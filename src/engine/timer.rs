//! Timer engine for the Pomodoro engine.
//!
//! This module provides the countdown state machine:
//! - Status transitions (Idle → Running ⇄ Paused, completion → Idle or Running)
//! - End-timestamp anchored countdown, polled by a tick loop
//! - Mode completion with session counting and break scheduling
//! - Best-effort persistence of timer state
//! - Change subscriptions and completion listeners
//!
//! The engine is synchronous. Something outside it (see
//! [`super::service::TimerService`]) calls [`TimerEngine::tick`] on a short
//! interval while a countdown is active.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::watch;

use crate::clock::Clock;
use crate::settings::SettingsStore;
use crate::sound::SoundPlayer;
use crate::storage::{self, Storage, STATE_KEY};
use crate::types::{
    PersistedTimerState, Settings, SettingsPatch, TimerMode, TimerState, TimerStatus,
};

use super::session;

/// How often an active countdown is polled.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

// ============================================================================
// CompletionListener
// ============================================================================

/// Receives each completed mode, exactly once per completion.
pub trait CompletionListener: Send {
    fn on_complete(&self, mode: TimerMode);
}

impl<F> CompletionListener for F
where
    F: Fn(TimerMode) + Send,
{
    fn on_complete(&self, mode: TimerMode) {
        self(mode)
    }
}

// ============================================================================
// TickOutcome
// ============================================================================

/// Result of polling the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No countdown is active
    Inactive,
    /// The tick belongs to a countdown that has since been cancelled
    Stale,
    /// The remaining time has not changed since the last tick
    Unchanged,
    /// The remaining time moved to a new value
    Updated {
        /// Remaining seconds
        remaining: u32,
    },
    /// The countdown reached zero and the mode was completed
    Completed {
        /// The mode that just completed
        mode: TimerMode,
    },
}

/// What caused a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionTrigger {
    Expired,
    Manual,
}

/// An active countdown, anchored to an absolute end time.
#[derive(Debug, Clone, Copy)]
struct Countdown {
    ends_at_ms: i64,
    generation: u64,
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Owns the timer state machine and its settings.
pub struct TimerEngine {
    state: TimerState,
    settings: SettingsStore,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    /// Active countdown; `Some` exactly while status is Running
    countdown: Option<Countdown>,
    /// Bumped every time a countdown is armed
    generation: u64,
    /// Day that `state.today_sessions` counts
    session_day: NaiveDate,
    listeners: Vec<Box<dyn CompletionListener>>,
    sound: Option<Box<dyn SoundPlayer>>,
    state_tx: watch::Sender<TimerState>,
    settings_tx: watch::Sender<Settings>,
    last_persisted: Option<PersistedTimerState>,
}

impl TimerEngine {
    /// Creates an engine from whatever is in `storage`.
    ///
    /// The restored status is always Idle; a running countdown cannot
    /// survive a reload.
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        let settings = SettingsStore::load(Arc::clone(&storage));
        let session_day = clock.today();
        let state = restore_state(storage.as_ref(), settings.current(), session_day);
        tracing::debug!("Restored timer state: {:?}", state);

        let (state_tx, _) = watch::channel(state.clone());
        let (settings_tx, _) = watch::channel(settings.current().clone());

        Self {
            state,
            settings,
            storage,
            clock,
            countdown: None,
            generation: 0,
            session_day,
            listeners: Vec::new(),
            sound: None,
            state_tx,
            settings_tx,
            last_persisted: None,
        }
    }

    /// Attaches the player used for the completion chime.
    pub fn with_sound(mut self, player: impl SoundPlayer + 'static) -> Self {
        self.sound = Some(Box::new(player));
        self
    }

    /// Registers a completion listener. Listeners run in registration order.
    pub fn add_listener(&mut self, listener: impl CompletionListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Returns the current timer state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }

    /// Returns the current settings.
    pub fn settings(&self) -> &Settings {
        self.settings.current()
    }

    /// Subscribes to timer state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<TimerState> {
        self.state_tx.subscribe()
    }

    /// Subscribes to settings changes.
    pub fn subscribe_settings(&self) -> watch::Receiver<Settings> {
        self.settings_tx.subscribe()
    }

    /// Returns the generation of the active countdown, if any.
    pub fn countdown_generation(&self) -> Option<u64> {
        self.countdown.map(|countdown| countdown.generation)
    }

    /// Starts or resumes the countdown from the current remaining time.
    ///
    /// Does nothing if already running.
    pub fn start(&mut self) {
        if self.state.is_running() {
            tracing::debug!("Start ignored: already running");
            return;
        }

        self.state.status = TimerStatus::Running;
        self.arm_countdown();
        tracing::debug!(
            "{} started with {}s remaining",
            self.state.mode.label(),
            self.state.time_remaining
        );
        self.commit();
    }

    /// Pauses a running countdown, freezing the remaining time.
    ///
    /// Does nothing unless running.
    pub fn pause(&mut self) {
        if !self.state.is_running() {
            tracing::debug!("Pause ignored: not running");
            return;
        }

        // Bring the remaining time up to date before freezing it.
        self.poll();
        if !self.state.is_running() {
            return;
        }

        self.cancel_countdown();
        self.state.status = TimerStatus::Paused;
        tracing::debug!("Paused with {}s remaining", self.state.time_remaining);
        self.commit();
    }

    /// Completes the current mode immediately, whatever the status.
    ///
    /// The timer is left idle regardless of `auto_start_next`.
    pub fn complete(&mut self) -> TimerMode {
        self.cancel_countdown();
        self.finish(CompletionTrigger::Manual)
    }

    /// Applies a settings update.
    ///
    /// An idle countdown is resynced to the new duration of its mode; a
    /// running or paused one is left alone.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Settings {
        let updated = self.settings.update(patch);

        if self.state.is_idle() {
            self.state.time_remaining = updated.duration_for_mode(self.state.mode);
        }

        self.settings_tx.send_if_modified(|current| {
            if *current == updated {
                return false;
            }
            *current = updated.clone();
            true
        });
        self.commit();
        updated
    }

    /// Polls the active countdown, whatever its generation.
    pub fn poll(&mut self) -> TickOutcome {
        match self.countdown {
            Some(countdown) => self.tick(countdown.generation),
            None => TickOutcome::Inactive,
        }
    }

    /// Polls the countdown armed as `generation`.
    ///
    /// Ticks from a cancelled countdown are ignored, so a late tick can never
    /// complete a mode twice.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        let Some(countdown) = self.countdown else {
            return TickOutcome::Inactive;
        };
        if countdown.generation != generation {
            return TickOutcome::Stale;
        }

        let remaining = remaining_seconds(countdown.ends_at_ms, self.clock.now_millis());
        if remaining == 0 {
            // Stop polling before completing: at most one completion per countdown.
            self.cancel_countdown();
            let mode = self.finish(CompletionTrigger::Expired);
            return TickOutcome::Completed { mode };
        }

        if remaining == self.state.time_remaining {
            return TickOutcome::Unchanged;
        }

        self.state.time_remaining = remaining;
        self.publish_state();
        TickOutcome::Updated { remaining }
    }

    /// Wipes every persisted key and starts over from defaults.
    pub fn reset(&mut self) {
        self.cancel_countdown();
        storage::clear_all(self.storage.as_ref());

        self.settings.reset();
        self.state = TimerState::new(self.settings.current());
        self.session_day = self.clock.today();
        self.last_persisted = None;

        let defaults = self.settings.current().clone();
        self.settings_tx.send_if_modified(|current| {
            if *current == defaults {
                return false;
            }
            *current = defaults;
            true
        });
        self.publish_state();
        tracing::info!("Timer data reset");
    }

    /// Stops the tick loop for teardown, freezing a running countdown.
    pub fn shutdown(&mut self) {
        self.pause();
        self.cancel_countdown();
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn arm_countdown(&mut self) {
        self.generation += 1;
        let ends_at_ms = self.clock.now_millis() + i64::from(self.state.time_remaining) * 1000;
        self.countdown = Some(Countdown {
            ends_at_ms,
            generation: self.generation,
        });
    }

    fn cancel_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            tracing::debug!("Cancelled countdown #{}", countdown.generation);
        }
    }

    fn finish(&mut self, trigger: CompletionTrigger) -> TimerMode {
        let completed = self.state.mode;
        let settings = self.settings.current().clone();

        if completed == TimerMode::Focus {
            self.state.completed_sessions = self.state.completed_sessions.saturating_add(1);

            let today = self.clock.today();
            self.state.today_sessions = session::record_focus_session(
                self.storage.as_ref(),
                today,
                self.state.today_sessions,
                self.session_day,
            );
            self.session_day = today;
        }

        let next = session::next_mode(
            completed,
            self.state.completed_sessions,
            settings.long_break_interval,
        );
        tracing::info!(
            "{} completed (sessions: {}, today: {}), next: {}",
            completed.label(),
            self.state.completed_sessions,
            self.state.today_sessions,
            next.label()
        );

        self.notify_completion(completed, &settings);

        self.state.mode = next;
        self.state.time_remaining = settings.duration_for_mode(next);

        if trigger == CompletionTrigger::Expired && settings.auto_start_next {
            self.state.status = TimerStatus::Running;
            self.arm_countdown();
        } else {
            self.state.status = TimerStatus::Idle;
        }

        self.commit();
        completed
    }

    fn notify_completion(&self, mode: TimerMode, settings: &Settings) {
        if settings.sound_enabled {
            if let Some(player) = &self.sound {
                if let Err(e) = player.play_chime() {
                    tracing::warn!("Failed to play completion chime: {}", e);
                }
            }
        }

        for listener in &self.listeners {
            listener.on_complete(mode);
        }
    }

    /// Publishes the state and writes it back to storage if the persisted
    /// record changed.
    fn commit(&mut self) {
        self.publish_state();

        let record = PersistedTimerState::from_state(&self.state);
        if self.last_persisted.as_ref() == Some(&record) {
            return;
        }
        if storage::write_json(self.storage.as_ref(), STATE_KEY, &record).is_some() {
            self.last_persisted = Some(record);
        }
    }

    fn publish_state(&self) {
        self.state_tx.send_if_modified(|current| {
            if *current == self.state {
                return false;
            }
            *current = self.state.clone();
            true
        });
    }
}

/// Whole seconds left until `ends_at_ms`, rounded to nearest, never negative.
fn remaining_seconds(ends_at_ms: i64, now_ms: i64) -> u32 {
    let left = ends_at_ms - now_ms;
    if left <= 0 {
        return 0;
    }
    u32::try_from((left + 500) / 1000).unwrap_or(u32::MAX)
}

/// Rebuilds the timer state from storage, always idle.
fn restore_state(storage: &dyn Storage, settings: &Settings, today: NaiveDate) -> TimerState {
    let mut state = TimerState::new(settings);

    if let Some(value) = storage::read_json(storage, STATE_KEY) {
        let record = PersistedTimerState::from_json(&value);
        let full = settings.duration_for_mode(record.mode);

        state.mode = record.mode;
        state.completed_sessions = record.completed_sessions;
        state.time_remaining = record.time_remaining.map_or(full, |seconds| seconds.min(full));
    }

    state.today_sessions = session::sessions_on(session::load_today(storage).as_ref(), today);
    state
}

// ============================================================================
// Tests
// ============================================================================
