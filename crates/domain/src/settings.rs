use chrono::Duration;
use log::warn;

use crate::{CacheError, WeightUnit};

pub trait SettingsRepository {
    fn read_settings(&self) -> Result<Option<Settings>, CacheError>;
    fn write_settings(&self, settings: &Settings) -> Result<(), CacheError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub default_weight_unit: WeightUnit,
    pub tick_interval_ms: u32,
    /// Whether a cached session of another user is dropped instead of resumed.
    pub discard_foreign_sessions: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_weight_unit: WeightUnit::Pounds,
            tick_interval_ms: 1000,
            discard_foreign_sessions: true,
        }
    }
}

impl Settings {
    /// Stored settings, or the defaults if none are stored or they cannot be read.
    pub fn load(repository: &impl SettingsRepository) -> Self {
        match repository.read_settings() {
            Ok(settings) => settings.unwrap_or_default(),
            Err(err) => {
                warn!("failed to read settings: {err}");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::milliseconds(i64::from(self.tick_interval_ms.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    struct FakeSettings(RefCell<Result<Option<Settings>, CacheError>>);

    impl SettingsRepository for FakeSettings {
        fn read_settings(&self) -> Result<Option<Settings>, CacheError> {
            self.0.borrow().clone()
        }

        fn write_settings(&self, settings: &Settings) -> Result<(), CacheError> {
            *self.0.borrow_mut() = Ok(Some(*settings));
            Ok(())
        }
    }

    static KILOGRAMS: Settings = Settings {
        default_weight_unit: WeightUnit::Kilograms,
        tick_interval_ms: 250,
        discard_foreign_sessions: false,
    };

    #[rstest]
    #[case::stored(Ok(Some(KILOGRAMS)), KILOGRAMS)]
    #[case::missing(Ok(None), Settings::default())]
    #[case::corrupt(
        Err(CacheError::Corrupt { key: "settings".to_string(), reason: "eof".to_string() }),
        Settings::default()
    )]
    fn test_settings_load(
        #[case] stored: Result<Option<Settings>, CacheError>,
        #[case] expected: Settings,
    ) {
        assert_eq!(
            Settings::load(&FakeSettings(RefCell::new(stored))),
            expected
        );
    }

    #[test]
    fn test_settings_write() {
        let repository = FakeSettings(RefCell::new(Ok(None)));
        repository.write_settings(&KILOGRAMS).unwrap();
        assert_eq!(Settings::load(&repository), KILOGRAMS);
    }

    #[rstest]
    #[case(1000, Duration::seconds(1))]
    #[case(250, Duration::milliseconds(250))]
    #[case(0, Duration::milliseconds(1))]
    fn test_settings_tick_interval(#[case] tick_interval_ms: u32, #[case] expected: Duration) {
        let settings = Settings {
            tick_interval_ms,
            ..Settings::default()
        };
        assert_eq!(settings.tick_interval(), expected);
    }
}
