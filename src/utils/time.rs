//! Timestamp helpers for registry bookkeeping.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as whole seconds since the Unix epoch.
///
/// Registry `last_seen` stamps and TTL math are all in this unit. A clock
/// set before 1970 collapses to 0 rather than panicking.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_past_2020() {
        // 2020-01-01T00:00:00Z
        assert!(now_secs() > 1_577_836_800);
    }
}
