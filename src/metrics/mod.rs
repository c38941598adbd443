use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry, TextEncoder,
};

// ============================================================================
// Metrics Module - Prometheus metrics for the console workflows
// ============================================================================
//
// Provides metrics for:
// - Mutation submissions and their outcomes, per workflow
// - Client-side validation rejections, per rule
// - Duplicate submits swallowed by the single-flight gate
// - Selection size and synchronizer pruning
//
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Workflow Metrics
    pub mutations_submitted: IntCounterVec,
    pub mutations_succeeded: IntCounterVec,
    pub mutations_failed: IntCounterVec,
    pub mutation_duration: HistogramVec,
    pub validation_rejections: IntCounterVec,
    pub duplicate_submissions: IntCounterVec,

    // Selection Metrics
    pub selected_links: IntGauge,
    pub selection_links_pruned: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let mutations_submitted = IntCounterVec::new(
            Opts::new("console_mutations_submitted_total", "Mutations sent to the server"),
            &["workflow"],
        )?;
        registry.register(Box::new(mutations_submitted.clone()))?;

        let mutations_succeeded = IntCounterVec::new(
            Opts::new("console_mutations_succeeded_total", "Mutations the server accepted"),
            &["workflow"],
        )?;
        registry.register(Box::new(mutations_succeeded.clone()))?;

        let mutations_failed = IntCounterVec::new(
            Opts::new("console_mutations_failed_total", "Mutations that failed after submission"),
            &["workflow", "reason"],
        )?;
        registry.register(Box::new(mutations_failed.clone()))?;

        let mutation_duration = HistogramVec::new(
            HistogramOpts::new("console_mutation_duration_seconds", "Round trip of a mutation")
                .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["workflow"],
        )?;
        registry.register(Box::new(mutation_duration.clone()))?;

        let validation_rejections = IntCounterVec::new(
            Opts::new("console_validation_rejections_total", "Submits stopped before any network call"),
            &["workflow", "rule"],
        )?;
        registry.register(Box::new(validation_rejections.clone()))?;

        let duplicate_submissions = IntCounterVec::new(
            Opts::new("console_duplicate_submissions_total", "Submits ignored while a mutation was in flight"),
            &["workflow"],
        )?;
        registry.register(Box::new(duplicate_submissions.clone()))?;

        let selected_links = IntGauge::new(
            "console_selected_links",
            "Links currently selected across all orders",
        )?;
        registry.register(Box::new(selected_links.clone()))?;

        let selection_links_pruned = IntCounter::new(
            "console_selection_links_pruned_total",
            "Selected links dropped by list synchronization",
        )?;
        registry.register(Box::new(selection_links_pruned.clone()))?;

        Ok(Self {
            registry,
            mutations_submitted,
            mutations_succeeded,
            mutations_failed,
            mutation_duration,
            validation_rejections,
            duplicate_submissions,
            selected_links,
            selection_links_pruned,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every metric in the Prometheus text format
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    pub fn record_submitted(&self, workflow: &str) {
        self.mutations_submitted.with_label_values(&[workflow]).inc();
    }

    pub fn record_outcome(&self, workflow: &str, duration_secs: f64, failure: Option<&str>) {
        match failure {
            None => self.mutations_succeeded.with_label_values(&[workflow]).inc(),
            Some(reason) => self.mutations_failed.with_label_values(&[workflow, reason]).inc(),
        }
        self.mutation_duration.with_label_values(&[workflow]).observe(duration_secs);
    }

    pub fn record_validation_rejection(&self, workflow: &str, rule: &str) {
        self.validation_rejections.with_label_values(&[workflow, rule]).inc();
    }

    pub fn record_duplicate_submission(&self, workflow: &str) {
        self.duplicate_submissions.with_label_values(&[workflow]).inc();
    }

    pub fn set_selected_links(&self, count: usize) {
        self.selected_links.set(count as i64);
    }

    pub fn record_pruned_links(&self, count: usize) {
        self.selection_links_pruned.inc_by(count as u64);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_record_outcome() {
        let metrics = Metrics::new().unwrap();
        metrics.record_submitted("batch_purchase");
        metrics.record_outcome("batch_purchase", 0.2, None);
        metrics.record_outcome("batch_purchase", 0.4, Some("rejected"));

        let gathered = metrics.registry.gather();
        let succeeded = gathered.iter().find(|m| m.name() == "console_mutations_succeeded_total").unwrap();
        assert_eq!(succeeded.metric[0].counter.value, Some(1.0));

        let failed = gathered.iter().find(|m| m.name() == "console_mutations_failed_total").unwrap();
        assert_eq!(failed.metric[0].counter.value, Some(1.0));
    }

    #[test]
    fn test_validation_rejections_by_rule() {
        let metrics = Metrics::new().unwrap();
        metrics.record_validation_rejection("batch_purchase", "missing_image");
        metrics.record_validation_rejection("batch_purchase", "empty_selection");

        let gathered = metrics.registry.gather();
        let rejections = gathered.iter().find(|m| m.name() == "console_validation_rejections_total").unwrap();
        assert_eq!(rejections.metric.len(), 2);
    }

    #[test]
    fn test_selection_gauges() {
        let metrics = Metrics::new().unwrap();
        metrics.set_selected_links(4);
        metrics.record_pruned_links(3);

        assert_eq!(metrics.selected_links.get(), 4);
        assert_eq!(metrics.selection_links_pruned.get(), 3);
    }

    #[test]
    fn test_encode_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.record_duplicate_submission("pin");

        let text = metrics.encode().unwrap();
        assert!(text.contains("console_duplicate_submissions_total{workflow=\"pin\"} 1"));
    }
}
