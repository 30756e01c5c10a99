//! Repository timings and pool gauges.
//!
//! Every repository query is wrapped in a [`QueryTimer`] named after the
//! query, so `database_query_duration_seconds` breaks down per play lookup.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

const QUERY_DURATION: &str = "database_query_duration_seconds";

/// Times one repository query.
///
/// ```ignore
/// let timer = QueryTimer::new("lock_reaction");
/// let row = sqlx::query_as::<_, ReactionEntity>(&sql).fetch_optional(conn).await;
/// timer.record();
/// row
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Records the elapsed time under the query label and returns it in seconds.
    pub fn record(self) -> f64 {
        let elapsed = self.start.elapsed().as_secs_f64();
        histogram!(QUERY_DURATION, "query" => self.query).record(elapsed);
        elapsed
    }
}

/// Connection counts of a pool at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub total: usize,
    pub idle: usize,
    pub active: usize,
}

impl PoolStats {
    fn new(total: usize, idle: usize) -> Self {
        Self {
            total,
            idle,
            active: total.saturating_sub(idle),
        }
    }

    pub fn of(pool: &PgPool) -> Self {
        Self::new(pool.size() as usize, pool.num_idle())
    }
}

/// Publishes the pool gauges; called on every `/metrics` scrape.
pub fn record_pool_metrics(pool: &PgPool) -> PoolStats {
    let stats = PoolStats::of(pool);
    gauge!("database_connections_active").set(stats.active as f64);
    gauge!("database_connections_idle").set(stats.idle as f64);
    gauge!("database_connections_total").set(stats.total as f64);
    stats
}
