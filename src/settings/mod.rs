//! Settings validation and persistence.
//!
//! All settings, whether typed by the user or read back from storage, pass
//! through [`validate`]. It never fails: non-finite numbers and wrong types
//! fall back to the defaults, fractional values are rounded, and everything
//! is clamped into its bound.

use std::sync::Arc;

use crate::storage::{self, Storage, SETTINGS_KEY};
use crate::types::{
    SettingBounds, Settings, SettingsPatch, FOCUS_DURATION_BOUNDS, LONG_BREAK_DURATION_BOUNDS,
    LONG_BREAK_INTERVAL_BOUNDS, SHORT_BREAK_DURATION_BOUNDS,
};

/// Produces fully valid settings from a partial, unvalidated patch.
pub fn validate(patch: &SettingsPatch) -> Settings {
    let defaults = Settings::default();

    Settings {
        focus_duration: clamp_setting(
            patch.focus_duration,
            FOCUS_DURATION_BOUNDS,
            defaults.focus_duration,
        ),
        short_break_duration: clamp_setting(
            patch.short_break_duration,
            SHORT_BREAK_DURATION_BOUNDS,
            defaults.short_break_duration,
        ),
        long_break_duration: clamp_setting(
            patch.long_break_duration,
            LONG_BREAK_DURATION_BOUNDS,
            defaults.long_break_duration,
        ),
        long_break_interval: clamp_setting(
            patch.long_break_interval,
            LONG_BREAK_INTERVAL_BOUNDS,
            defaults.long_break_interval,
        ),
        auto_start_next: patch.auto_start_next.unwrap_or(defaults.auto_start_next),
        sound_enabled: patch.sound_enabled.unwrap_or(defaults.sound_enabled),
    }
}

fn clamp_setting(value: Option<f64>, bounds: SettingBounds, fallback: u32) -> u32 {
    match value {
        Some(v) if v.is_finite() => v
            .round()
            .clamp(f64::from(bounds.min), f64::from(bounds.max)) as u32,
        _ => fallback,
    }
}

// ============================================================================
// SettingsStore
// ============================================================================

/// Holds the current settings and writes every change back to storage.
pub struct SettingsStore {
    current: Settings,
    storage: Arc<dyn Storage>,
}

impl SettingsStore {
    /// Loads settings from storage, or defaults if none are stored.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let current = match storage::read_json(storage.as_ref(), SETTINGS_KEY) {
            Some(value) => validate(&SettingsPatch::from_json(&value)),
            None => Settings::default(),
        };
        tracing::debug!("Loaded settings: {:?}", current);

        Self { current, storage }
    }

    /// Returns the current settings.
    pub fn current(&self) -> &Settings {
        &self.current
    }

    /// Merges `patch` into the current settings, validates the result and
    /// persists it.
    pub fn update(&mut self, patch: &SettingsPatch) -> Settings {
        self.current = validate(&patch.merged_onto(&self.current));
        storage::write_json(self.storage.as_ref(), SETTINGS_KEY, &self.current);
        tracing::debug!("Updated settings: {:?}", self.current);
        self.current.clone()
    }

    /// Restores defaults in memory without writing them.
    pub fn reset(&mut self) {
        self.current = Settings::default();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    mod validate_tests {
        use super::*;

        #[test]
        fn test_empty_patch_gives_defaults() {
            assert_eq!(validate(&SettingsPatch::new()), Settings::default());
        }

        #[test]
        fn test_values_in_range_are_kept() {
            let settings = validate(
                &SettingsPatch::new()
                    .with_focus_duration(50.0)
                    .with_short_break_duration(10.0)
                    .with_long_break_duration(20.0)
                    .with_long_break_interval(6.0)
                    .with_auto_start_next(true)
                    .with_sound_enabled(false),
            );

            assert_eq!(
                settings,
                Settings {
                    focus_duration: 50,
                    short_break_duration: 10,
                    long_break_duration: 20,
                    long_break_interval: 6,
                    auto_start_next: true,
                    sound_enabled: false,
                }
            );
        }

        #[test]
        fn test_clamps_below_minimum() {
            let settings = validate(
                &SettingsPatch::new()
                    .with_focus_duration(0.0)
                    .with_short_break_duration(-5.0)
                    .with_long_break_duration(0.2)
                    .with_long_break_interval(1.0),
            );

            assert_eq!(settings.focus_duration, 1);
            assert_eq!(settings.short_break_duration, 1);
            assert_eq!(settings.long_break_duration, 1);
            assert_eq!(settings.long_break_interval, 2);
        }

        #[test]
        fn test_clamps_above_maximum() {
            let settings = validate(
                &SettingsPatch::new()
                    .with_focus_duration(61.0)
                    .with_short_break_duration(31.0)
                    .with_long_break_duration(1e9)
                    .with_long_break_interval(11.0),
            );

            assert_eq!(settings.focus_duration, 60);
            assert_eq!(settings.short_break_duration, 30);
            assert_eq!(settings.long_break_duration, 60);
            assert_eq!(settings.long_break_interval, 10);
        }

        #[test]
        fn test_rounds_fractions() {
            let settings = validate(
                &SettingsPatch::new()
                    .with_focus_duration(24.5)
                    .with_short_break_duration(4.4),
            );
            assert_eq!(settings.focus_duration, 25);
            assert_eq!(settings.short_break_duration, 4);
        }

        #[test]
        fn test_non_finite_falls_back_to_default() {
            let settings = validate(
                &SettingsPatch::new()
                    .with_focus_duration(f64::NAN)
                    .with_short_break_duration(f64::INFINITY)
                    .with_long_break_duration(f64::NEG_INFINITY)
                    .with_long_break_interval(f64::NAN),
            );
            assert_eq!(settings, Settings::default());
        }

        #[test]
        fn test_any_input_is_within_bounds() {
            let samples = [
                f64::NAN,
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::MIN,
                f64::MAX,
                -1.0,
                0.0,
                0.49,
                1.5,
                29.5,
                30.5,
                59.5,
                60.5,
                1e12,
            ];
            for value in samples {
                let patch = SettingsPatch::new()
                    .with_focus_duration(value)
                    .with_short_break_duration(value)
                    .with_long_break_duration(value)
                    .with_long_break_interval(value);
                let settings = validate(&patch);

                assert!(FOCUS_DURATION_BOUNDS.contains(settings.focus_duration), "{value}");
                assert!(SHORT_BREAK_DURATION_BOUNDS.contains(settings.short_break_duration), "{value}");
                assert!(LONG_BREAK_DURATION_BOUNDS.contains(settings.long_break_duration), "{value}");
                assert!(LONG_BREAK_INTERVAL_BOUNDS.contains(settings.long_break_interval), "{value}");
            }
        }
    }

    mod store_tests {
        use super::*;
        use serde_json::json;

        fn shared(storage: &MemoryStorage) -> Arc<dyn Storage> {
            Arc::new(storage.clone())
        }

        #[test]
        fn test_load_defaults_when_absent() {
            let storage = MemoryStorage::new();
            let store = SettingsStore::load(shared(&storage));
            assert_eq!(store.current(), &Settings::default());
            assert!(storage.is_empty());
        }

        #[test]
        fn test_load_validates_stored_record() {
            let storage = MemoryStorage::new();
            storage
                .set(
                    SETTINGS_KEY,
                    &json!({
                        "focusDuration": 90,
                        "shortBreakDuration": "five",
                        "longBreakInterval": 3,
                        "autoStartNext": true
                    })
                    .to_string(),
                )
                .unwrap();

            let store = SettingsStore::load(shared(&storage));
            let settings = store.current();

            assert_eq!(settings.focus_duration, 60);
            assert_eq!(settings.short_break_duration, 5);
            assert_eq!(settings.long_break_duration, 15);
            assert_eq!(settings.long_break_interval, 3);
            assert!(settings.auto_start_next);
            assert!(settings.sound_enabled);
        }

        #[test]
        fn test_load_malformed_record_gives_defaults() {
            let storage = MemoryStorage::new();
            storage.set(SETTINGS_KEY, "not json at all").unwrap();

            let store = SettingsStore::load(shared(&storage));
            assert_eq!(store.current(), &Settings::default());
        }

        #[test]
        fn test_update_merges_and_persists() {
            let storage = MemoryStorage::new();
            let mut store = SettingsStore::load(shared(&storage));

            let updated = store.update(&SettingsPatch::new().with_focus_duration(10.0));
            assert_eq!(updated.focus_duration, 10);
            assert_eq!(updated.short_break_duration, 5);

            let updated = store.update(&SettingsPatch::new().with_sound_enabled(false));
            assert_eq!(updated.focus_duration, 10);
            assert!(!updated.sound_enabled);

            let reloaded = SettingsStore::load(shared(&storage));
            assert_eq!(reloaded.current(), &updated);
        }

        #[test]
        fn test_update_clamps() {
            let storage = MemoryStorage::new();
            let mut store = SettingsStore::load(shared(&storage));

            let updated = store.update(&SettingsPatch::new().with_short_break_duration(45.0));
            assert_eq!(updated.short_break_duration, 30);
        }

        #[test]
        fn test_update_survives_write_failure() {
            let storage = MemoryStorage::new();
            storage.set_fail_writes(true);
            let mut store = SettingsStore::load(shared(&storage));

            let updated = store.update(&SettingsPatch::new().with_long_break_interval(5.0));
            assert_eq!(updated.long_break_interval, 5);
            assert_eq!(store.current().long_break_interval, 5);
            assert!(storage.is_empty());
        }

        #[test]
        fn test_reset_restores_defaults() {
            let storage = MemoryStorage::new();
            let mut store = SettingsStore::load(shared(&storage));
            store.update(&SettingsPatch::new().with_focus_duration(42.0));

            store.reset();
            assert_eq!(store.current(), &Settings::default());
        }
    }
}
