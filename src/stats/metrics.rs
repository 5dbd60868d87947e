//! Relay counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Relay-wide counters
///
/// Updated with relaxed atomics on the hot paths; read via `snapshot`.
#[derive(Debug, Default)]
pub struct RelayStats {
    /// Records pulled off the durable log
    pub records_consumed: AtomicU64,

    /// Records skipped because they failed to decode
    pub decode_failures: AtomicU64,

    /// Events handed to the dispatcher and fanned out
    pub events_dispatched: AtomicU64,

    /// Individual push attempts to live connections
    pub pushes_attempted: AtomicU64,

    /// Push attempts that found the connection gone or unsendable
    pub push_failures: AtomicU64,

    /// Total live connections ever accepted
    pub connections_accepted: AtomicU64,

    /// Currently connected clients
    pub active_connections: AtomicU64,
}

impl RelayStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> RelayStatsSnapshot {
        RelayStatsSnapshot {
            records_consumed: self.records_consumed.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            events_dispatched: self.events_dispatched.load(Ordering::Relaxed),
            pushes_attempted: self.pushes_attempted.load(Ordering::Relaxed),
            push_failures: self.push_failures.load(Ordering::Relaxed),
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of [`RelayStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStatsSnapshot {
    /// Records pulled off the durable log
    pub records_consumed: u64,
    /// Records skipped because they failed to decode
    pub decode_failures: u64,
    /// Events handed to the dispatcher and fanned out
    pub events_dispatched: u64,
    /// Individual push attempts to live connections
    pub pushes_attempted: u64,
    /// Push attempts that found the connection gone or unsendable
    pub push_failures: u64,
    /// Total live connections ever accepted
    pub connections_accepted: u64,
    /// Currently connected clients
    pub active_connections: u64,
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = RelayStats::new();
        let snapshot = stats.snapshot();

        assert_eq!(snapshot.records_consumed, 0);
        assert_eq!(snapshot.decode_failures, 0);
        assert_eq!(snapshot.events_dispatched, 0);
        assert_eq!(snapshot.pushes_attempted, 0);
        assert_eq!(snapshot.push_failures, 0);
        assert_eq!(snapshot.connections_accepted, 0);
        assert_eq!(snapshot.active_connections, 0);
    }

    #[test]
    fn test_snapshot_reflects_counters() {
        let stats = RelayStats::new();

        stats.records_consumed.fetch_add(3, Ordering::Relaxed);
        stats.decode_failures.fetch_add(1, Ordering::Relaxed);
        stats.events_dispatched.fetch_add(2, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.records_consumed, 3);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.events_dispatched, 2);
    }
}
