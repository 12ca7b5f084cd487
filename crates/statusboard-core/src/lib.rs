pub mod aggregate;
pub mod events;
pub mod time;

pub use aggregate::{
    AgentStatus, AggregateState, CHART_HORIZON_SECS, ConcurrencyPoint, ConcurrencySeries,
    compute_concurrency_series, compute_current_status,
};
pub use events::StatusEvent;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    use crate::events::StatusEvent;
    use crate::time::format_timestamp;

    /// Fixed reference instant for tests: 2026-01-01T00:00:00Z.
    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default()
    }

    /// `t0()` plus `secs` seconds.
    pub fn at(secs: i64) -> DateTime<Utc> {
        t0() + TimeDelta::seconds(secs)
    }

    /// A well-formed log row `secs` seconds after `t0()`.
    pub fn event_at(secs: i64, agent: &str, status: &str) -> StatusEvent {
        StatusEvent::new(format_timestamp(at(secs)), agent, status)
    }
}
