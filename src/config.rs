//! Cache configuration.
//!
//! Controls revalidation policy, eviction grace, and the reaper cadence. The
//! embedding application owns file/env layering; this is the typed section it
//! deserializes into.

use std::time::Duration;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_KEEP_UNUSED_FOR_MS: u64 = 5000;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1000;

/// Cache behavior knobs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Force background revalidation of fresh entries on every new subscriber.
    /// Stale and rejected entries always revalidate on subscribe.
    pub refetch_on_subscribe: bool,
    /// Grace period (ms) an entry survives after its last subscriber leaves.
    pub keep_unused_for_ms: u64,
    /// Reaper cadence (ms) for evicting entries past the grace period.
    pub sweep_interval_ms: u64,
    /// Revalidate active entries when the app regains focus.
    pub refetch_on_focus: bool,
    /// Revalidate active entries when connectivity returns.
    pub refetch_on_reconnect: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refetch_on_subscribe: false,
            keep_unused_for_ms: DEFAULT_KEEP_UNUSED_FOR_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            refetch_on_focus: false,
            refetch_on_reconnect: false,
        }
    }
}

impl CacheConfig {
    /// Grace period as a duration. Zero means idle entries are evicted by the
    /// next sweep.
    pub fn keep_unused(&self) -> Duration {
        Duration::from_millis(self.keep_unused_for_ms)
    }

    /// Reaper cadence as a duration, zero clamped to one millisecond.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}
