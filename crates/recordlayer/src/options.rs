use rl_planner::StatisticsPolicy;
use rl_schema::VectorStrategy;
use std::collections::HashMap;
use std::time::Duration;

/// Batch tuning for the online indexer's build loop (spec.md §6's `batch`
/// configuration surface). Mirrors [`rl_indexer::BuildOptions`] one field at
/// a time rather than re-exporting it directly, so this crate's public
/// surface stays independent of `rl-indexer`'s internal naming.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchOptions {
    pub max_records: usize,
    /// Soft cap on bytes read per batch; spec.md caps this at 10 MB.
    pub max_bytes: usize,
    /// Soft cap on wall-clock time per batch; spec.md caps this at 5 s.
    pub max_time: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { max_records: 1000, max_bytes: 10_000_000, max_time: Duration::from_secs(5) }
    }
}

impl From<BatchOptions> for rl_indexer::BuildOptions {
    fn from(opts: BatchOptions) -> Self {
        rl_indexer::BuildOptions {
            batch_size: opts.max_records,
            max_bytes: opts.max_bytes,
            max_time_ms: opts.max_time.as_millis() as u64,
            throttle_delay_ms: 0,
        }
    }
}

/// Retryable-error backoff (spec.md §5, §7: "100 ms × 2^attempt, default 3
/// attempts").
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryOptions {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_millis(100) }
    }
}

impl RetryOptions {
    /// The delay before the given zero-based attempt number, per the
    /// documented `base_delay * 2^attempt` backoff curve.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }
}

/// The typed options struct every long-lived component is constructed with
/// (spec.md §6: "not a CLI -- a typed options struct passed at
/// construction"). Fields are grouped by the sub-crate that consumes them;
/// nothing here is read by more than one component.
#[derive(Clone, Debug)]
pub struct Options {
    /// Bounds [`rl_planner::to_dnf`]'s DNF rewrite so a deeply nested filter
    /// cannot blow up into an exponential number of terms.
    pub max_dnf_terms: u64,
    pub max_rewrite_depth: u64,
    pub statistics_policy: StatisticsPolicy,
    pub sample_rate: f64,
    /// Per-index-name override of the default vector-index build strategy
    /// (spec.md §4.G); an index absent from this map uses the strategy
    /// recorded on its [`rl_schema::IndexOptions`] at definition time.
    pub vector_strategy: HashMap<String, VectorStrategy>,
    pub batch: BatchOptions,
    pub retry: RetryOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_dnf_terms: 100,
            max_rewrite_depth: 20,
            statistics_policy: StatisticsPolicy::default(),
            sample_rate: 1.0,
            vector_strategy: HashMap::new(),
            batch: BatchOptions::default(),
            retry: RetryOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let opts = Options::default();
        assert_eq!(opts.max_dnf_terms, 100);
        assert_eq!(opts.max_rewrite_depth, 20);
        assert_eq!(opts.sample_rate, 1.0);
        assert!(opts.vector_strategy.is_empty());
        assert_eq!(opts.retry.max_attempts, 3);
        assert_eq!(opts.retry.base_delay, Duration::from_millis(100));
        assert!(opts.batch.max_bytes <= 10_000_000);
        assert!(opts.batch.max_time <= Duration::from_secs(5));
    }

    #[test]
    fn retry_delay_doubles_each_attempt() {
        let retry = RetryOptions::default();
        assert_eq!(retry.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn batch_options_convert_into_indexer_build_options() {
        let batch = BatchOptions { max_records: 500, ..BatchOptions::default() };
        let build: rl_indexer::BuildOptions = batch.into();
        assert_eq!(build.batch_size, 500);
        assert_eq!(build.max_bytes, 10_000_000);
    }
}
