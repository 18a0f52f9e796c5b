//! In-memory request quotas for the chat gateway.
//!
//! DESIGN
//! ======
//! Fixed-window counters, two tiers by two windows:
//! - Per-client: 100 requests/hour, 200 requests/day
//! - Global: 100 requests/hour, 500 requests/day
//!
//! Hourly windows align to the hour and daily windows to UTC midnight.
//! A request is checked with [`Ledger::evaluate`] before it is handled and
//! charged with [`Ledger::commit`] only after the LLM answered, so rejected
//! and failed requests never consume quota.
//!
//! TRADE-OFFS
//! ==========
//! `evaluate` and `commit` take the lock separately because the LLM call
//! between them can take seconds. Requests that pass `evaluate` together just
//! under a limit can therefore all be charged, overshooting it by the number
//! in flight. The next `evaluate` sees the overshoot and rejects.
//!
//! The per-client map is dropped wholesale when the UTC day rolls over. Every
//! entry is stale in both windows at that point, so this only bounds memory
//! to one day's distinct clients.

pub mod window;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use window::{CounterBucket, WindowKind, day_start, hour_start};

pub const GLOBAL_HOURLY_LIMIT: u64 = 100;
pub const GLOBAL_DAILY_LIMIT: u64 = 500;
pub const CLIENT_HOURLY_LIMIT: u64 = 100;
pub const CLIENT_DAILY_LIMIT: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub global_hourly: u64,
    pub global_daily: u64,
    pub client_hourly: u64,
    pub client_daily: u64,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            global_hourly: GLOBAL_HOURLY_LIMIT,
            global_daily: GLOBAL_DAILY_LIMIT,
            client_hourly: CLIENT_HOURLY_LIMIT,
            client_daily: CLIENT_DAILY_LIMIT,
        }
    }
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Client,
    Global,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => f.write_str("client"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// The first limit a request ran into, with the state of its tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{tier} {window} request limit exceeded ({count}/{limit})")]
pub struct QuotaExceeded {
    pub tier: Tier,
    pub window: WindowKind,
    pub limit: u64,
    /// Limit of the other window in the same tier.
    pub sibling_limit: u64,
    pub count: u64,
    /// Count of the other window in the same tier.
    pub sibling_count: u64,
    /// Epoch second at which the violated window ends.
    pub reset_at: u64,
}

impl QuotaExceeded {
    /// `(hourly, daily)` limits of the violated tier.
    #[must_use]
    pub fn limits(&self) -> (u64, u64) {
        match self.window {
            WindowKind::Hourly => (self.limit, self.sibling_limit),
            WindowKind::Daily => (self.sibling_limit, self.limit),
        }
    }

    /// `(hourly, daily)` counts of the violated tier.
    #[must_use]
    pub fn counts(&self) -> (u64, u64) {
        match self.window {
            WindowKind::Hourly => (self.count, self.sibling_count),
            WindowKind::Daily => (self.sibling_count, self.count),
        }
    }
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowUsage {
    pub limit: u64,
    pub used: u64,
    pub reset_at: u64,
}

impl WindowUsage {
    fn of(bucket: CounterBucket, limit: u64, window: WindowKind, now: u64) -> Self {
        let start = window.start_of(now);
        Self { limit, used: bucket.count_in(start), reset_at: start + window.size_secs() }
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierUsage {
    pub hourly: WindowUsage,
    pub daily: WindowUsage,
}

/// All four counters of one client, with their limits and reset times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub global: TierUsage,
    pub client: TierUsage,
}

// =============================================================================
// LEDGER
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct ClientBuckets {
    hourly: CounterBucket,
    daily: CounterBucket,
}

#[derive(Default)]
struct LedgerInner {
    global_hourly: CounterBucket,
    global_daily: CounterBucket,
    clients: HashMap<String, ClientBuckets>,
    /// Latest daily window start seen; the client map belongs to this day.
    latest_day: u64,
}

impl LedgerInner {
    /// Bring every bucket `client_key` depends on into the windows of `now`,
    /// creating the client's buckets on first sight.
    ///
    /// The client map is only dropped when the day moves forward. A commit
    /// stamped before midnight that takes the lock after later traffic must
    /// not wipe the new day's entries.
    fn roll_windows(&mut self, client_key: &str, now: u64) -> &mut ClientBuckets {
        let hourly = hour_start(now);
        let daily = day_start(now);

        if daily > self.latest_day {
            self.latest_day = daily;
            let dropped = self.clients.len();
            self.clients.clear();
            info!(window_start = daily, dropped_clients = dropped, "daily quota window reset");
        }
        self.global_daily.reset_if_stale(daily);
        if self.global_hourly.reset_if_stale(hourly) {
            info!(window_start = hourly, "hourly quota window reset");
        }

        let client = self.clients.entry(client_key.to_owned()).or_default();
        client.hourly.reset_if_stale(hourly);
        client.daily.reset_if_stale(daily);
        client
    }

    fn snapshot(&self, client: ClientBuckets, policy: QuotaPolicy, now: u64) -> QuotaSnapshot {
        QuotaSnapshot {
            global: TierUsage {
                hourly: WindowUsage::of(self.global_hourly, policy.global_hourly, WindowKind::Hourly, now),
                daily: WindowUsage::of(self.global_daily, policy.global_daily, WindowKind::Daily, now),
            },
            client: TierUsage {
                hourly: WindowUsage::of(client.hourly, policy.client_hourly, WindowKind::Hourly, now),
                daily: WindowUsage::of(client.daily, policy.client_daily, WindowKind::Daily, now),
            },
        }
    }
}

/// Process-wide quota ledger. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Ledger {
    inner: Arc<Mutex<LedgerInner>>,
    policy: QuotaPolicy,
}

impl Ledger {
    #[must_use]
    pub fn new(policy: QuotaPolicy) -> Self {
        Self { inner: Arc::new(Mutex::new(LedgerInner::default())), policy }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide whether `client_key` may make a request at `now`.
    ///
    /// Limits are checked most specific first: client hourly, client daily,
    /// global hourly, global daily. Counts are never incremented here.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaExceeded`] for the first limit already reached.
    pub fn evaluate(&self, client_key: &str, now: u64) -> Result<QuotaSnapshot, QuotaExceeded> {
        let mut inner = self.lock();
        let client = *inner.roll_windows(client_key, now);
        let policy = self.policy;

        check(
            Tier::Client,
            WindowKind::Hourly,
            (client.hourly, policy.client_hourly),
            (client.daily, policy.client_daily),
        )?;
        check(
            Tier::Client,
            WindowKind::Daily,
            (client.daily, policy.client_daily),
            (client.hourly, policy.client_hourly),
        )?;
        check(
            Tier::Global,
            WindowKind::Hourly,
            (inner.global_hourly, policy.global_hourly),
            (inner.global_daily, policy.global_daily),
        )?;
        check(
            Tier::Global,
            WindowKind::Daily,
            (inner.global_daily, policy.global_daily),
            (inner.global_hourly, policy.global_hourly),
        )?;

        Ok(inner.snapshot(client, policy, now))
    }

    /// Charge one request to `client_key` and to the global tier.
    ///
    /// Windows are rolled for `now` first, so a request that straddles a
    /// window boundary is charged to the window it finished in.
    pub fn commit(&self, client_key: &str, now: u64) -> QuotaSnapshot {
        let mut inner = self.lock();
        let entry = inner.roll_windows(client_key, now);
        entry.hourly.increment();
        entry.daily.increment();
        let client = *entry;

        inner.global_hourly.increment();
        inner.global_daily.increment();
        inner.snapshot(client, self.policy, now)
    }

    /// Read-only view of the counters at `now`. Stale windows read as empty
    /// and unknown clients as fresh.
    #[must_use]
    pub fn snapshot(&self, client_key: Option<&str>, now: u64) -> QuotaSnapshot {
        let inner = self.lock();
        let client = client_key
            .and_then(|key| inner.clients.get(key))
            .copied()
            .unwrap_or_default();
        inner.snapshot(client, self.policy, now)
    }

    /// Number of client keys currently held.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.lock().clients.len()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(QuotaPolicy::default())
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn check(
    tier: Tier,
    window: WindowKind,
    (bucket, limit): (CounterBucket, u64),
    (sibling, sibling_limit): (CounterBucket, u64),
) -> Result<(), QuotaExceeded> {
    if !bucket.at_limit(limit) {
        return Ok(());
    }
    Err(QuotaExceeded {
        tier,
        window,
        limit,
        sibling_limit,
        count: bucket.count(),
        sibling_count: sibling.count(),
        reset_at: bucket.window_start() + window.size_secs(),
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
