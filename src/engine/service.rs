//! Async driver for the timer engine.
//!
//! A single tokio task owns the [`TimerEngine`], so no locking is needed:
//! commands and ticks are handled one at a time.
//!
//! ```text
//! TimerHandle ──Command──▶ ┌───────────────────┐ ──watch──▶ TimerState
//!             ◀─oneshot─── │   TimerService    │ ──watch──▶ Settings
//!                          │  (owns engine)    │
//!                          │  interval ticker  │
//!                          └───────────────────┘
//! ```
//!
//! The tick interval only exists while the engine has an active countdown.
//! It is tagged with the countdown generation and replaced whenever the
//! engine arms a new one, so ticks from a cancelled countdown never reach it.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::types::{Settings, SettingsPatch, TimerMode, TimerState};

use super::timer::{TickOutcome, TimerEngine, TICK_INTERVAL};

// ============================================================================
// ServiceError
// ============================================================================

/// Errors returned by [`TimerHandle`] commands.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The service task is no longer running.
    #[error("Timer service has stopped")]
    Stopped,
}

// ============================================================================
// Command
// ============================================================================

enum Command {
    Start(oneshot::Sender<TimerState>),
    Pause(oneshot::Sender<TimerState>),
    Complete(oneshot::Sender<(TimerMode, TimerState)>),
    UpdateSettings(SettingsPatch, oneshot::Sender<Settings>),
    Reset(oneshot::Sender<TimerState>),
    Shutdown(oneshot::Sender<()>),
}

// ============================================================================
// TimerHandle
// ============================================================================

/// Cloneable handle for commanding and observing a running service.
#[derive(Clone)]
pub struct TimerHandle {
    commands: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<TimerState>,
    settings_rx: watch::Receiver<Settings>,
}

impl TimerHandle {
    /// Starts or resumes the countdown.
    pub async fn start(&self) -> Result<TimerState, ServiceError> {
        self.request(Command::Start).await
    }

    /// Pauses the countdown.
    pub async fn pause(&self) -> Result<TimerState, ServiceError> {
        self.request(Command::Pause).await
    }

    /// Completes the current mode, returning it with the resulting state.
    pub async fn complete(&self) -> Result<(TimerMode, TimerState), ServiceError> {
        self.request(Command::Complete).await
    }

    /// Applies a settings update.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<Settings, ServiceError> {
        self.request(|reply| Command::UpdateSettings(patch, reply)).await
    }

    /// Wipes persisted data and restarts from defaults.
    pub async fn reset(&self) -> Result<TimerState, ServiceError> {
        self.request(Command::Reset).await
    }

    /// Stops the service, freezing a running countdown.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.request(Command::Shutdown).await
    }

    /// Returns the latest state snapshot.
    pub fn state(&self) -> TimerState {
        self.state_rx.borrow().clone()
    }

    /// Returns the latest settings snapshot.
    pub fn settings(&self) -> Settings {
        self.settings_rx.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<TimerState> {
        self.state_rx.clone()
    }

    /// Subscribes to settings changes.
    pub fn subscribe_settings(&self) -> watch::Receiver<Settings> {
        self.settings_rx.clone()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| ServiceError::Stopped)?;
        response.await.map_err(|_| ServiceError::Stopped)
    }
}

// ============================================================================
// TimerService
// ============================================================================

/// Runs a [`TimerEngine`] on its own task.
pub struct TimerService {
    engine: TimerEngine,
    commands: mpsc::UnboundedReceiver<Command>,
    tick_interval: Duration,
    /// Interval for the active countdown, tagged with its generation
    ticker: Option<(u64, Interval)>,
}

impl TimerService {
    /// Spawns the service with the default tick interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(engine: TimerEngine) -> (TimerHandle, JoinHandle<()>) {
        Self::spawn_with_interval(engine, TICK_INTERVAL)
    }

    /// Spawns the service polling every `tick_interval`.
    pub fn spawn_with_interval(
        engine: TimerEngine,
        tick_interval: Duration,
    ) -> (TimerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = TimerHandle {
            commands: tx,
            state_rx: engine.subscribe_state(),
            settings_rx: engine.subscribe_settings(),
        };

        let service = Self {
            engine,
            commands: rx,
            tick_interval,
            ticker: None,
        };
        let task = tokio::spawn(service.run());

        (handle, task)
    }

    async fn run(mut self) {
        tracing::debug!("Timer service started");

        loop {
            self.sync_ticker();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown(reply)) => {
                        self.engine.shutdown();
                        self.ticker = None;
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.dispatch(command),
                    None => {
                        // Every handle is gone.
                        self.engine.shutdown();
                        break;
                    }
                },
                generation = next_tick(&mut self.ticker) => {
                    if let TickOutcome::Stale = self.engine.tick(generation) {
                        tracing::debug!("Dropped tick from countdown #{}", generation);
                    }
                }
            }
        }

        tracing::debug!("Timer service stopped");
    }

    fn dispatch(&mut self, command: Command) {
        // A dropped receiver only means the caller stopped waiting.
        match command {
            Command::Start(reply) => {
                self.engine.start();
                let _ = reply.send(self.engine.state().clone());
            }
            Command::Pause(reply) => {
                self.engine.pause();
                let _ = reply.send(self.engine.state().clone());
            }
            Command::Complete(reply) => {
                let mode = self.engine.complete();
                let _ = reply.send((mode, self.engine.state().clone()));
            }
            Command::UpdateSettings(patch, reply) => {
                let settings = self.engine.update_settings(&patch);
                let _ = reply.send(settings);
            }
            Command::Reset(reply) => {
                self.engine.reset();
                let _ = reply.send(self.engine.state().clone());
            }
            Command::Shutdown(reply) => {
                self.engine.shutdown();
                let _ = reply.send(());
            }
        }
    }

    /// Makes the ticker match the engine's active countdown.
    fn sync_ticker(&mut self) {
        match self.engine.countdown_generation() {
            Some(generation) if self.ticker.as_ref().map(|(g, _)| *g) == Some(generation) => {}
            Some(generation) => {
                let mut ticker = interval(self.tick_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.ticker = Some((generation, ticker));
            }
            None => self.ticker = None,
        }
    }
}

/// Waits for the next tick of the active countdown, or forever if none.
async fn next_tick(ticker: &mut Option<(u64, Interval)>) -> u64 {
    match ticker {
        Some((generation, interval)) => {
            interval.tick().await;
            *generation
        }
        None => std::future::pending().await,
    }
}
