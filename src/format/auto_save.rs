//! Auto-save timing with debouncing.
//!
//! Two rules keep saves from piling up while the user is drawing:
//! 1. **Debounce**: after a change, wait until edits have been quiet for a
//!    while before saving.
//! 2. **Minimum interval**: never save more often than the configured
//!    interval, even under a steady stream of edits.

use std::time::Duration;
use web_time::Instant;

use crate::config::AutoSaveConfig;

/// Decides when a session with unsaved changes should be written out.
#[derive(Debug)]
pub struct AutoSaveManager {
    save_interval: Duration,
    debounce_delay: Duration,
    last_save: Option<Instant>,
    last_change: Option<Instant>,
    enabled: bool,
    dirty: bool,
}

impl AutoSaveManager {
    /// Default minimum interval between saves (30 seconds).
    pub const DEFAULT_SAVE_INTERVAL: Duration = Duration::from_secs(30);

    /// Default debounce delay (3 seconds).
    pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_secs(3);

    pub fn new() -> Self {
        Self {
            save_interval: Self::DEFAULT_SAVE_INTERVAL,
            debounce_delay: Self::DEFAULT_DEBOUNCE_DELAY,
            last_save: None,
            last_change: None,
            enabled: true,
            dirty: false,
        }
    }

    /// A manager that tracks dirtiness but never asks for a save.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Build a manager from the `auto_save` section of the configuration.
    pub fn from_config(config: &AutoSaveConfig) -> Self {
        Self {
            enabled: config.enabled,
            ..Self::new()
        }
        .with_debounce_delay(Duration::from_secs(config.debounce_secs))
        .with_save_interval(Duration::from_secs(config.interval_secs))
    }

    pub fn with_save_interval(mut self, interval: Duration) -> Self {
        self.save_interval = interval;
        self
    }

    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    /// Record a change that needs saving.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.last_change = Some(Instant::now());
        log::trace!("Auto-save: marked dirty");
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True when enabled, dirty, quiet for the debounce delay, and at least
    /// one interval past the previous save.
    pub fn should_save(&self) -> bool {
        if !self.enabled || !self.dirty {
            return false;
        }
        let Some(last_change) = self.last_change else {
            return false;
        };
        if last_change.elapsed() < self.debounce_delay {
            return false;
        }
        self.last_save
            .is_none_or(|last_save| last_save.elapsed() >= self.save_interval)
    }

    /// Record a successful save.
    pub fn mark_saved(&mut self) {
        self.last_save = Some(Instant::now());
        self.dirty = false;
        self.last_change = None;
        log::trace!("Auto-save: marked saved");
    }

    /// Record a failed save. Changes stay dirty; the interval still applies
    /// before the next attempt.
    pub fn mark_save_failed(&mut self) {
        self.last_save = Some(Instant::now());
        log::trace!("Auto-save: save failed, will retry");
    }
}

impl Default for AutoSaveManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn immediate() -> AutoSaveManager {
        AutoSaveManager::new()
            .with_debounce_delay(Duration::ZERO)
            .with_save_interval(Duration::ZERO)
    }

    #[test]
    fn test_initial_state() {
        let manager = AutoSaveManager::new();
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
        assert!(manager.is_enabled());
    }

    #[test]
    fn test_dirty_then_saved() {
        let mut manager = immediate();
        manager.mark_dirty();
        assert!(manager.should_save());

        manager.mark_saved();
        assert!(!manager.is_dirty());
        assert!(!manager.should_save());
    }

    #[test]
    fn test_disabled_never_saves() {
        let mut manager = AutoSaveManager::disabled()
            .with_debounce_delay(Duration::ZERO)
            .with_save_interval(Duration::ZERO);
        manager.mark_dirty();
        assert!(manager.is_dirty());
        assert!(!manager.should_save());
    }

    #[test]
    fn test_debounce_prevents_immediate_save() {
        let mut manager = AutoSaveManager::new()
            .with_debounce_delay(Duration::from_secs(10))
            .with_save_interval(Duration::ZERO);
        manager.mark_dirty();
        assert!(!manager.should_save());
    }

    #[test]
    fn test_interval_blocks_retry_after_failure() {
        let mut manager = AutoSaveManager::new()
            .with_debounce_delay(Duration::ZERO)
            .with_save_interval(Duration::from_secs(60));
        manager.mark_dirty();
        assert!(manager.should_save());

        manager.mark_save_failed();
        assert!(manager.is_dirty());
        assert!(!manager.should_save());
    }

    #[test]
    fn test_from_config() {
        let config = AutoSaveConfig {
            enabled: false,
            debounce_secs: 1,
            interval_secs: 2,
        };
        let manager = AutoSaveManager::from_config(&config);
        assert!(!manager.is_enabled());
    }
}
