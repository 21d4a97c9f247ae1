// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::time::Duration;

/// Inactivity timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1500);

/// Static configuration of a [`SafeZone`](crate::SafeZone).
///
/// ```
/// use core::time::Duration;
/// use understory_safe_zone::SafeZoneConfig;
///
/// let config = SafeZoneConfig::default()
///     .with_debug(true)
///     .with_timeout(Duration::from_millis(600));
/// assert!(config.debug);
/// assert!(!config.disabled);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SafeZoneConfig {
    /// Render the zone shape visibly instead of transparently.
    pub debug: bool,
    /// Make the whole tracker inert: no listeners, no shape.
    pub disabled: bool,
    /// How long the zone may stay open after the pointer entered the shape
    /// without reaching the container.
    pub timeout: Duration,
}

impl Default for SafeZoneConfig {
    fn default() -> Self {
        Self {
            debug: false,
            disabled: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SafeZoneConfig {
    /// Returns a copy with `debug` set.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Returns a copy with `disabled` set.
    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Returns a copy with the inactivity timeout replaced.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
