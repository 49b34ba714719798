// Metrics hooks for lookup operations.
//
// Callers install a global `LookupMetrics` implementation via
// [`set_lookup_metrics`]; every `IndustryMatcher` then reports per-lookup
// latency and hit counts. This keeps instrumentation decoupled from any
// specific metrics backend.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::types::SearchField;

/// Metrics observer for lookup operations.
pub trait LookupMetrics: Send + Sync {
    /// Record the outcome of one lookup. `field` is the scored search field,
    /// `latency` the wall-clock duration of the ranking call, and
    /// `hit_count` the number of results returned to the caller.
    fn record_lookup(&self, field: SearchField, latency: Duration, hit_count: usize);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn LookupMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn LookupMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn LookupMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global lookup metrics recorder.
///
/// Typically called once during service startup so all matcher instances
/// share the same metrics backend.
pub fn set_lookup_metrics(recorder: Option<Arc<dyn LookupMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("lookup metrics lock poisoned");
    *guard = recorder;
}
