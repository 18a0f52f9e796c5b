//! Epoch-aligned windows and the counters that live in them.
//!
//! DESIGN
//! ======
//! Windows are fixed, not sliding: an hourly window starts at a multiple of
//! 3600 seconds and a daily window at UTC midnight. A bucket notices that its
//! window is over only when it is next touched, so a bucket idle for several
//! windows resets once, straight to the current one.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub const HOUR_SECS: u64 = 3600;
pub const DAY_SECS: u64 = 86_400;

// =============================================================================
// WINDOW KIND
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Hourly,
    Daily,
}

impl WindowKind {
    #[must_use]
    pub const fn size_secs(self) -> u64 {
        match self {
            Self::Hourly => HOUR_SECS,
            Self::Daily => DAY_SECS,
        }
    }

    /// Start of the window of this kind that contains `now`.
    #[must_use]
    pub const fn start_of(self, now: u64) -> u64 {
        let size = self.size_secs();
        now / size * size
    }

    /// Human-readable span, as reported in rejection bodies.
    #[must_use]
    pub const fn span_label(self) -> &'static str {
        match self {
            Self::Hourly => "1 hour",
            Self::Daily => "24 hours",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hourly => f.write_str("hourly"),
            Self::Daily => f.write_str("daily"),
        }
    }
}

#[must_use]
pub const fn hour_start(now: u64) -> u64 {
    WindowKind::Hourly.start_of(now)
}

/// UTC midnight of the day containing `now`.
#[must_use]
pub const fn day_start(now: u64) -> u64 {
    WindowKind::Daily.start_of(now)
}

// =============================================================================
// CLOCK
// =============================================================================

/// Source of wall-clock time in epoch seconds. Injected so tests can move time.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }
}

// =============================================================================
// COUNTER BUCKET
// =============================================================================

/// Requests accumulated within one active window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterBucket {
    count: u64,
    window_start: u64,
}

impl CounterBucket {
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub const fn window_start(&self) -> u64 {
        self.window_start
    }

    /// Move the bucket to `window_start_now` if it still belongs to another
    /// window. Returns `true` when a reset happened.
    pub fn reset_if_stale(&mut self, window_start_now: u64) -> bool {
        if self.window_start == window_start_now {
            return false;
        }
        self.count = 0;
        self.window_start = window_start_now;
        true
    }

    #[must_use]
    pub const fn at_limit(&self, limit: u64) -> bool {
        self.count >= limit
    }

    pub fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Count as seen from `window_start_now`, without resetting: a stale
    /// bucket reads as empty.
    #[must_use]
    pub const fn count_in(&self, window_start_now: u64) -> u64 {
        if self.window_start == window_start_now { self.count } else { 0 }
    }
}

#[cfg(test)]
#[path = "window_test.rs"]
mod tests;
