//! Derived views over the status log.
//!
//! Both views are recomputed from the full log on every query. Each agent is
//! a two-state machine (`working` / not working): a `"working"` row opens an
//! interval unless one is already open, any other status closes it.
//! Malformed timestamps never cause an error; the affected row is left out
//! of duration and series accounting.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::serde::ts_seconds;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::events::{IDLE, NEVER, StatusEvent};
use crate::time::parse_timestamp;

/// Look-ahead past "now" given to chart renderers so the current value of
/// the step function has room to be drawn.
pub const CHART_HORIZON_SECS: i64 = 300;

/// Current status of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStatus {
    /// Last observed status label, or `"idle"` if never seen.
    pub status: String,
    /// Raw timestamp string of the last row, or `"never"`.
    pub timestamp: String,
    /// Total time spent working, rounded to whole seconds.
    pub working_seconds: i64,
}

impl AgentStatus {
    fn unseen() -> Self {
        Self {
            status: IDLE.to_string(),
            timestamp: NEVER.to_string(),
            working_seconds: 0,
        }
    }
}

/// Status of every known agent, serialised as a JSON object keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AggregateState(BTreeMap<String, AgentStatus>);

impl AggregateState {
    pub fn get(&self, agent: &str) -> Option<&AgentStatus> {
        self.0.get(agent)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AgentStatus)> {
        self.0.iter()
    }

    /// Number of agents whose last status is `"working"`.
    pub fn working_count(&self) -> usize {
        self.0
            .values()
            .filter(|s| s.status == crate::events::WORKING)
            .count()
    }
}

/// One knot of the concurrency step function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConcurrencyPoint {
    #[serde(with = "ts_seconds")]
    pub t: DateTime<Utc>,
    pub count: usize,
}

/// Run-length compressed series of concurrently working agents.
///
/// Instants serialise as Unix epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConcurrencySeries {
    pub points: Vec<ConcurrencyPoint>,
    /// Number of known agents; the vertical bound for charts.
    pub max_agents: usize,
    #[serde(with = "ts_seconds")]
    pub t_min: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub t_max: DateTime<Utc>,
    #[serde(with = "ts_seconds")]
    pub t_now: DateTime<Utc>,
}

/// Length of a working interval. Out-of-order rows would give a negative
/// span; those count as zero.
fn interval(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeDelta {
    (end - start).max(TimeDelta::zero())
}

/// Interval length in whole milliseconds, for saturating accumulation.
fn interval_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    interval(start, end).num_milliseconds()
}

fn round_to_seconds(total_ms: i64) -> i64 {
    total_ms.saturating_add(500).div_euclid(1000)
}

/// Compute the last status and cumulative working time of every known agent.
///
/// Rows for agents outside `known_agents` are ignored. A row with an
/// unparsable timestamp still updates the displayed status and timestamp
/// but does not open or close an interval. Intervals still open after the
/// scan run up to `now`.
pub fn compute_current_status<S: AsRef<str>>(
    events: &[StatusEvent],
    known_agents: &[S],
    now: DateTime<Utc>,
) -> AggregateState {
    let mut current: BTreeMap<String, AgentStatus> = known_agents
        .iter()
        .map(|name| (name.as_ref().to_string(), AgentStatus::unseen()))
        .collect();

    let mut open: HashMap<&str, DateTime<Utc>> = HashMap::new();
    // Milliseconds; extreme but parsable timestamps must not overflow.
    let mut totals: HashMap<&str, i64> = HashMap::new();
    let mut skipped = 0usize;

    for event in events {
        let agent = event.agent_name.as_str();
        let Some(entry) = current.get_mut(agent) else {
            continue;
        };

        match parse_timestamp(&event.timestamp) {
            Some(ts) if event.is_working() => {
                open.entry(agent).or_insert(ts);
            },
            Some(ts) => {
                if let Some(start) = open.remove(agent) {
                    let total = totals.entry(agent).or_default();
                    *total = total.saturating_add(interval_ms(start, ts));
                }
            },
            None => skipped += 1,
        }

        entry.status.clone_from(&event.status);
        entry.timestamp.clone_from(&event.timestamp);
    }

    for (agent, start) in open {
        let total = totals.entry(agent).or_default();
        *total = total.saturating_add(interval_ms(start, now));
    }

    for (name, entry) in current.iter_mut() {
        entry.working_seconds = totals
            .get(name.as_str())
            .copied()
            .map(round_to_seconds)
            .unwrap_or(0);
    }

    if skipped > 0 {
        tracing::debug!(skipped, "rows with malformed timestamps left out of durations");
    }

    AggregateState(current)
}

/// Compute the step function of concurrently working agents.
///
/// Rows with unparsable timestamps or unknown agents are dropped entirely.
/// A knot is emitted only when the working count changes, so the series
/// grows with the number of state changes rather than the number of rows.
pub fn compute_concurrency_series<S: AsRef<str>>(
    events: &[StatusEvent],
    known_agents: &[S],
    now: DateTime<Utc>,
) -> ConcurrencySeries {
    let known: HashSet<&str> = known_agents.iter().map(|name| name.as_ref()).collect();
    let horizon = TimeDelta::seconds(CHART_HORIZON_SECS);

    let mut working: HashMap<&str, bool> = HashMap::new();
    let mut count = 0usize;
    let mut points: Vec<ConcurrencyPoint> = Vec::new();
    let mut t_min = None;

    for event in events {
        let agent = event.agent_name.as_str();
        if !known.contains(agent) {
            continue;
        }
        let Some(ts) = parse_timestamp(&event.timestamp) else {
            continue;
        };
        t_min.get_or_insert(ts);

        let is_working = event.is_working();
        let was_working = working.insert(agent, is_working).unwrap_or(false);
        match (was_working, is_working) {
            (false, true) => count += 1,
            (true, false) => count -= 1,
            _ => {},
        }

        if points.last().map(|p| p.count) != Some(count) {
            points.push(ConcurrencyPoint { t: ts, count });
        }
    }

    ConcurrencySeries {
        points,
        max_agents: known.len(),
        t_min: t_min.unwrap_or(now),
        t_max: now + horizon,
        t_now: now,
    }
}
