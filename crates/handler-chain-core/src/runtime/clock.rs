// crates/handler-chain-core/src/runtime/clock.rs
// ============================================================================
// Module: System Clock
// Description: Wall-clock implementation of the clock interface.
// Purpose: Stamp stage outcomes with unix milliseconds in production runs.
// Dependencies: time
// ============================================================================

use time::OffsetDateTime;

use crate::core::Timestamp;
use crate::interfaces::Clock;

/// Clock backed by the system UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        Timestamp::from_unix_millis(i64::try_from(millis).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_reports_post_epoch_time() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now().as_unix_millis() > 1_577_836_800_000);
    }
}
