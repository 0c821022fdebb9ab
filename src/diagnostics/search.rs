use super::timing::TimingBreakdown;
use serde::Serialize;

/// Counters and traces of one branch-and-bound run.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    /// Nodes popped from the queue and processed.
    pub nodes_expanded: usize,
    /// Children discarded because their lower bound could not beat the best energy.
    pub nodes_pruned: usize,
    pub nodes_pushed: usize,
    pub max_queue_len: usize,
    /// Concrete shapes evaluated exactly.
    pub shapes_evaluated: usize,
    /// Best energy after every improvement; non-increasing.
    pub upper_bound_trace: Vec<f64>,
    pub timings: TimingBreakdown,
    pub elapsed_ms: f64,
}

impl SearchReport {
    pub fn best_energy(&self) -> Option<f64> {
        self.upper_bound_trace.last().copied()
    }

    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        format!(
            "expanded={} pushed={} pruned={} max_queue={} shapes={} best={} elapsed_ms={:.1}",
            self.nodes_expanded,
            self.nodes_pushed,
            self.nodes_pruned,
            self.max_queue_len,
            self.shapes_evaluated,
            self.best_energy()
                .map(|v| format!("{v:.4}"))
                .unwrap_or_else(|| "-".to_string()),
            self.elapsed_ms
        )
    }
}
