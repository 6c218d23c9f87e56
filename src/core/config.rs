//! # Guardian configuration.
//!
//! Provides [`GuardianConfig`] centralized settings for the safeguard runtime.
//!
//! ## Sentinel values
//! - `drain_warning = 0s` → never warn while `terminate` waits for safeguards
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Global configuration for the guardian.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `drain_warning`: How long `terminate` waits before reporting the safeguards
///   still running (`0s` = never). `terminate` keeps waiting either way; a probe
///   that never returns holds shutdown back.
/// - `honor_pauses`: Observe `pauses.before/after` around each execution
/// - `log_events`: Attach the built-in [`LogWriter`](crate::LogWriter)
#[derive(Clone, Debug)]
pub struct GuardianConfig {
    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Delay after which a slow drain is reported with the safeguards still running.
    pub drain_warning: Duration,

    /// Whether activity pauses are observed. Pauses end early on terminate.
    pub honor_pauses: bool,

    /// Whether guardian events are logged through `tracing`.
    pub log_events: bool,
}

impl GuardianConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the drain warning delay as an `Option`.
    ///
    /// - `None` → never warn
    /// - `Some(d)` → warn once after `d`
    #[inline]
    pub fn drain_warning(&self) -> Option<Duration> {
        if self.drain_warning == Duration::ZERO {
            None
        } else {
            Some(self.drain_warning)
        }
    }
}

impl Default for GuardianConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `drain_warning = 30s`
    /// - `honor_pauses = true`
    /// - `log_events = true`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            drain_warning: Duration::from_secs(30),
            honor_pauses: true,
            log_events: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_are_sentinels() {
        let cfg = GuardianConfig {
            bus_capacity: 0,
            drain_warning: Duration::ZERO,
            ..GuardianConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
        assert_eq!(cfg.drain_warning(), None);
        assert_eq!(
            GuardianConfig::default().drain_warning(),
            Some(Duration::from_secs(30))
        );
    }
}
