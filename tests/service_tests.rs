//! Integration tests for the async timer service.
//!
//! The service runs on a paused tokio clock so its tick interval fires
//! deterministically; the engine's wall clock is a [`ManualClock`] moved by
//! hand before letting ticks run.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use pomodoro_engine::{
    ManualClock, MemoryStorage, ServiceError, SettingsPatch, TimerEngine, TimerHandle, TimerMode,
    TimerService, TimerStatus, TICK_INTERVAL,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct Harness {
    handle: TimerHandle,
    task: JoinHandle<()>,
    clock: ManualClock,
    storage: MemoryStorage,
    completions: Arc<Mutex<Vec<TimerMode>>>,
}

/// Spawns a service over fresh in-memory storage.
fn spawn_service() -> Harness {
    let storage = MemoryStorage::new();
    let clock = ManualClock::at(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(), 9, 0);
    let mut engine = TimerEngine::new(Arc::new(storage.clone()), Arc::new(clock.clone()));

    let completions = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&completions);
    engine.add_listener(move |mode: TimerMode| sink.lock().unwrap().push(mode));

    let (handle, task) = TimerService::spawn(engine);
    Harness {
        handle,
        task,
        clock,
        storage,
        completions,
    }
}

/// Lets the service run a few ticks.
async fn let_ticks_run() {
    tokio::time::sleep(TICK_INTERVAL * 3).await;
}

// ============================================================================
// Command Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_and_pause_through_handle() {
    let h = spawn_service();

    let state = h.handle.start().await.unwrap();
    assert_eq!(state.status, TimerStatus::Running);

    h.clock.advance(Duration::from_secs(60));
    let_ticks_run().await;
    assert_eq!(h.handle.state().time_remaining, 1440);

    let state = h.handle.pause().await.unwrap();
    assert_eq!(state.status, TimerStatus::Paused);
    assert_eq!(state.time_remaining, 1440);

    // No ticks reach a paused timer.
    h.clock.advance(Duration::from_secs(60));
    let_ticks_run().await;
    assert_eq!(h.handle.state().time_remaining, 1440);
}

#[tokio::test(start_paused = true)]
async fn test_expiry_completes_mode_once() {
    let h = spawn_service();

    h.handle.start().await.unwrap();
    h.clock.advance(Duration::from_secs(1500));
    let_ticks_run().await;
    let_ticks_run().await;

    let state = h.handle.state();
    assert_eq!(state.mode, TimerMode::ShortBreak);
    assert_eq!(state.status, TimerStatus::Idle);
    assert_eq!(state.time_remaining, 300);
    assert_eq!(state.today_sessions, 1);
    assert_eq!(*h.completions.lock().unwrap(), vec![TimerMode::Focus]);
}

#[tokio::test(start_paused = true)]
async fn test_auto_start_keeps_ticking_next_mode() {
    let h = spawn_service();
    h.handle
        .update_settings(SettingsPatch::new().with_auto_start_next(true))
        .await
        .unwrap();

    h.handle.start().await.unwrap();
    h.clock.advance(Duration::from_secs(1500));
    let_ticks_run().await;
    assert_eq!(h.handle.state().mode, TimerMode::ShortBreak);
    assert_eq!(h.handle.state().status, TimerStatus::Running);

    h.clock.advance(Duration::from_secs(120));
    let_ticks_run().await;
    assert_eq!(h.handle.state().time_remaining, 180);

    h.clock.advance(Duration::from_secs(180));
    let_ticks_run().await;
    assert_eq!(h.handle.state().mode, TimerMode::Focus);
    assert_eq!(
        *h.completions.lock().unwrap(),
        vec![TimerMode::Focus, TimerMode::ShortBreak]
    );
}

#[tokio::test(start_paused = true)]
async fn test_complete_returns_completed_mode() {
    let h = spawn_service();

    let (mode, state) = h.handle.complete().await.unwrap();
    assert_eq!(mode, TimerMode::Focus);
    assert_eq!(state.mode, TimerMode::ShortBreak);
    assert_eq!(state.status, TimerStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_reset_through_handle() {
    let h = spawn_service();
    h.handle.complete().await.unwrap();
    assert!(!h.storage.is_empty());

    let state = h.handle.reset().await.unwrap();
    assert_eq!(state.mode, TimerMode::Focus);
    assert_eq!(state.completed_sessions, 0);
    assert!(h.storage.is_empty());
}

// ============================================================================
// Subscription Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_state_subscribers_see_countdown() {
    let h = spawn_service();
    let mut state_rx = h.handle.subscribe_state();
    state_rx.borrow_and_update();

    h.handle.start().await.unwrap();
    timeout(Duration::from_secs(1), state_rx.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state_rx.borrow_and_update().status, TimerStatus::Running);

    h.clock.advance(Duration::from_secs(5));
    timeout(Duration::from_secs(1), state_rx.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state_rx.borrow_and_update().time_remaining, 1495);
}

#[tokio::test(start_paused = true)]
async fn test_settings_subscribers_see_updates() {
    let h = spawn_service();
    let mut settings_rx = h.handle.subscribe_settings();
    settings_rx.borrow_and_update();

    let settings = h
        .handle
        .update_settings(SettingsPatch::new().with_long_break_duration(20.0))
        .await
        .unwrap();
    assert_eq!(settings.long_break_duration, 20);
    assert!(settings_rx.has_changed().unwrap());
    assert_eq!(settings_rx.borrow_and_update().long_break_duration, 20);
    assert_eq!(h.handle.settings(), settings);

    // Applying the same values again is not a change.
    h.handle
        .update_settings(SettingsPatch::new().with_long_break_duration(20.0))
        .await
        .unwrap();
    assert!(!settings_rx.has_changed().unwrap());
}

// ============================================================================
// Shutdown Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_freezes_countdown_and_stops_service() {
    let h = spawn_service();

    h.handle.start().await.unwrap();
    h.clock.advance(Duration::from_secs(30));
    h.handle.shutdown().await.unwrap();
    h.task.await.unwrap();

    let state = h.handle.state();
    assert_eq!(state.status, TimerStatus::Paused);
    assert_eq!(state.time_remaining, 1470);

    assert_eq!(h.handle.start().await, Err(ServiceError::Stopped));
    assert_eq!(h.handle.complete().await, Err(ServiceError::Stopped));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handles_stops_service() {
    let h = spawn_service();
    let handle = h.handle.clone();
    drop(h.handle);
    assert!(!h.task.is_finished());

    drop(handle);
    timeout(Duration::from_secs(1), h.task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_no_completion_after_shutdown() {
    let h = spawn_service();

    h.handle.start().await.unwrap();
    h.handle.shutdown().await.unwrap();
    h.clock.advance(Duration::from_secs(3600));
    let_ticks_run().await;

    assert!(h.completions.lock().unwrap().is_empty());
}
