//! Session counting shared by the engine: break scheduling and the daily
//! counter with midnight rollover.

use chrono::NaiveDate;

use crate::storage::{self, Storage, TODAY_KEY};
use crate::types::{TimerMode, TodaySessions};

/// Returns the mode that follows a completed `completed` countdown.
///
/// `completed_sessions` is the focus count after incrementing, so with an
/// interval of 4 the 4th, 8th, 12th... focus session is followed by a long
/// break.
pub fn next_mode(completed: TimerMode, completed_sessions: u32, long_break_interval: u32) -> TimerMode {
    match completed {
        TimerMode::Focus if completed_sessions % long_break_interval.max(1) == 0 => {
            TimerMode::LongBreak
        }
        TimerMode::Focus => TimerMode::ShortBreak,
        TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Focus,
    }
}

/// Returns the count recorded for `today`, or 0 if the record belongs to
/// another day.
pub fn sessions_on(record: Option<&TodaySessions>, today: NaiveDate) -> u32 {
    record
        .filter(|record| record.date == today)
        .map_or(0, |record| record.sessions)
}

/// Reads the daily counter from storage.
pub fn load_today(storage: &dyn Storage) -> Option<TodaySessions> {
    storage::read_json(storage, TODAY_KEY).and_then(|value| TodaySessions::from_json(&value))
}

/// Persists the daily counter.
pub fn save_today(storage: &dyn Storage, record: &TodaySessions) {
    storage::write_json(storage, TODAY_KEY, record);
}

/// Records one more focus session for `today` and returns the new count.
///
/// The stored counter is re-read first, so a process left open across
/// midnight starts the new day from zero. `in_memory` is the count held by
/// the engine for `in_memory_day`; it covers writes that never reached
/// storage.
pub fn record_focus_session(
    storage: &dyn Storage,
    today: NaiveDate,
    in_memory: u32,
    in_memory_day: NaiveDate,
) -> u32 {
    let stored = sessions_on(load_today(storage).as_ref(), today);
    let held = if in_memory_day == today { in_memory } else { 0 };
    let count = stored.max(held).saturating_add(1);

    save_today(storage, &TodaySessions::new(today, count));
    count
}
