// Metrics hooks for the matcher.
//
// Callers install a global `ResolveMetrics` implementation via
// [`set_resolve_metrics`]; `HypothesisMatcher::resolve` then reports the
// outcome and latency of every token it resolves. No metrics backend is
// assumed.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::hypothesis::MatchHypothesis;

/// Observer for token resolutions.
pub trait ResolveMetrics: Send + Sync {
    /// `pos_tag` is the token's tag as given, `hypothesis` is the winning
    /// hypothesis (`None` when exhausted), `lookups` the number of
    /// hypotheses that issued a lookup.
    fn record_resolution(
        &self,
        pos_tag: &str,
        hypothesis: Option<MatchHypothesis>,
        lookups: usize,
        latency: Duration,
    );
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn ResolveMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn ResolveMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn ResolveMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global resolution metrics recorder.
pub fn set_resolve_metrics(recorder: Option<Arc<dyn ResolveMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
