// Statistics manager (spec.md §4.J): per-record-type row counts and typed
// comparable-value histograms, used by the cost estimator's selectivity
// calculations. `TupleValue` (rl-type) already is the tagged, totally
// ordered comparable-value abstraction spec.md §4.I calls for -- no second
// type is introduced.

use parking_lot::RwLock;
use rl_type::TupleValue;
use std::collections::HashMap;

/// One bucket of an equi-depth histogram over a single column's observed
/// values.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    pub lower: TupleValue,
    pub upper: TupleValue,
    pub count: u64,
    pub distinct_count: u64,
}

impl Bucket {
    pub fn new(lower: TupleValue, upper: TupleValue, count: u64, distinct_count: u64) -> Self {
        Self { lower, upper, count, distinct_count }
    }

    fn contains(&self, value: &TupleValue) -> bool {
        value >= &self.lower && value <= &self.upper
    }
}

/// A per-column histogram: buckets ordered by `lower`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Histogram {
    pub buckets: Vec<Bucket>,
}

impl Histogram {
    pub fn new(mut buckets: Vec<Bucket>) -> Self {
        buckets.sort_by(|a, b| a.lower.cmp(&b.lower));
        Self { buckets }
    }
}

/// Statistics for one record type: total row count plus a histogram per
/// indexed/filterable column.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordTypeStatistics {
    pub row_count: u64,
    pub histograms: HashMap<String, Histogram>,
}

impl RecordTypeStatistics {
    pub fn new(row_count: u64) -> Self {
        Self { row_count, histograms: HashMap::new() }
    }

    pub fn with_histogram(mut self, column: impl Into<String>, histogram: Histogram) -> Self {
        self.histograms.insert(column.into(), histogram);
        self
    }
}

/// When statistics are refreshed (spec.md §6 Configuration surface).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StatisticsPolicy {
    Manual,
    Scheduled { interval_secs: u64 },
    ChangeThreshold { fraction: f64 },
    OnIndexBuild,
}

impl Default for StatisticsPolicy {
    fn default() -> Self {
        StatisticsPolicy::Manual
    }
}

/// Holds the last-collected statistics per record type and decides, under a
/// [`StatisticsPolicy::ChangeThreshold`] policy, whether accumulated writes
/// since the last refresh warrant recomputation. Recomputation itself (a
/// scan + histogram build) is a caller responsibility -- this manager is
/// just the policy + storage, matching spec.md's framing of "statistics
/// manager" as distinct from whatever walks the record store to produce
/// them.
pub struct StatisticsManager {
    policy: StatisticsPolicy,
    sample_rate: f64,
    stats: RwLock<HashMap<String, RecordTypeStatistics>>,
    writes_since_refresh: RwLock<HashMap<String, u64>>,
}

impl StatisticsManager {
    pub fn new(policy: StatisticsPolicy, sample_rate: f64) -> Self {
        Self {
            policy,
            sample_rate,
            stats: RwLock::new(HashMap::new()),
            writes_since_refresh: RwLock::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> StatisticsPolicy {
        self.policy
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Replaces the stored statistics for `record_type`, e.g. after a scan
    /// recomputes them, and clears its change-threshold counter.
    pub fn set(&self, record_type: impl Into<String>, stats: RecordTypeStatistics) {
        let record_type = record_type.into();
        self.writes_since_refresh.write().insert(record_type.clone(), 0);
        self.stats.write().insert(record_type, stats);
    }

    /// A clone of the current statistics, fetched once by the cost
    /// estimator before it recurses through a plan tree (spec.md §4.I:
    /// "statistics are pre-fetched once ... to keep recursive cost
    /// functions synchronous").
    pub fn get(&self, record_type: &str) -> Option<RecordTypeStatistics> {
        self.stats.read().get(record_type).cloned()
    }

    /// Tallies a write against `record_type` and, under
    /// [`StatisticsPolicy::ChangeThreshold`], reports whether the fraction
    /// of changed rows since the last refresh has crossed the configured
    /// threshold. The caller is responsible for actually recomputing and
    /// calling [`StatisticsManager::set`]; this only answers "is it time".
    pub fn record_write(&self, record_type: &str) -> bool {
        let mut counts = self.writes_since_refresh.write();
        let count = counts.entry(record_type.to_string()).or_insert(0);
        *count += 1;
        match self.policy {
            StatisticsPolicy::ChangeThreshold { fraction } => {
                let row_count = self.stats.read().get(record_type).map(|s| s.row_count).unwrap_or(0);
                let denom = row_count.max(1) as f64;
                (*count as f64) / denom >= fraction
            }
            _ => false,
        }
    }
}

/// Any denominator whose absolute value is below this is treated as zero
/// (spec.md §4.I: "all divisions use an epsilon guard").
const EPSILON: f64 = 1e-10;

pub fn safe_div(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator.abs() < EPSILON {
        default
    } else {
        numerator / denominator
    }
}

/// Conservative selectivity used whenever statistics for the relevant
/// column are unavailable (spec.md §4.I).
pub const UNKNOWN_SELECTIVITY: f64 = 0.1;

/// Equality selectivity (spec.md §4.I): `bucket.count / (bucket.distinct_count * total)`.
pub fn equality_selectivity(histogram: &Histogram, value: &TupleValue, total_rows: u64) -> f64 {
    let Some(bucket) = histogram.buckets.iter().find(|b| b.contains(value)) else {
        return UNKNOWN_SELECTIVITY;
    };
    safe_div(bucket.count as f64, (bucket.distinct_count * total_rows) as f64, UNKNOWN_SELECTIVITY)
}

/// Range selectivity: sums `bucket.count * overlap_fraction` over every
/// bucket overlapping `[lower, upper]` (either bound optional, meaning
/// unbounded on that side), then normalizes by `total_rows` to produce a
/// `[0,1]` fraction consistent with how selectivity is used elsewhere in the
/// cost model (estimated_rows = rows * selectivity). See DESIGN.md for why
/// this divides by `total_rows` where spec.md's formula text does not --
/// read literally that text yields an absolute row count, not a fraction.
pub fn range_selectivity(
    histogram: &Histogram,
    lower: Option<&TupleValue>,
    upper: Option<&TupleValue>,
    total_rows: u64,
) -> f64 {
    if histogram.buckets.is_empty() {
        return UNKNOWN_SELECTIVITY;
    }
    let mut matched_rows = 0.0;
    for bucket in &histogram.buckets {
        let overlap = overlap_fraction(bucket, lower, upper);
        if overlap > 0.0 {
            matched_rows += bucket.count as f64 * overlap;
        }
    }
    safe_div(matched_rows, total_rows as f64, UNKNOWN_SELECTIVITY)
}

/// Fraction of `bucket`'s range covered by `[lower, upper]`. Uses linear
/// interpolation when both bucket bounds and the query bound convert to
/// `f64` (numeric/timestamp types); falls back to a boolean 0/1 overlap for
/// types without a meaningful notion of "fraction of the way across"
/// (strings, bytes, uuids).
fn overlap_fraction(bucket: &Bucket, lower: Option<&TupleValue>, upper: Option<&TupleValue>) -> f64 {
    if let Some(lo) = lower {
        if &bucket.upper < lo {
            return 0.0;
        }
    }
    if let Some(hi) = upper {
        if &bucket.lower > hi {
            return 0.0;
        }
    }
    let (Some(bucket_lo), Some(bucket_hi)) = (as_f64(&bucket.lower), as_f64(&bucket.upper)) else {
        return 1.0;
    };
    let span = bucket_hi - bucket_lo;
    if span.abs() < EPSILON {
        return 1.0;
    }
    let clip_lo = lower.and_then(as_f64).map(|v| v.max(bucket_lo)).unwrap_or(bucket_lo);
    let clip_hi = upper.and_then(as_f64).map(|v| v.min(bucket_hi)).unwrap_or(bucket_hi);
    ((clip_hi - clip_lo) / span).clamp(0.0, 1.0)
}

fn as_f64(value: &TupleValue) -> Option<f64> {
    match value {
        TupleValue::I64(v) => Some(*v as f64),
        TupleValue::F64(v) => Some(*v),
        TupleValue::Timestamp(v) => Some(*v as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_histogram() -> Histogram {
        Histogram::new(vec![
            Bucket::new(TupleValue::I64(0), TupleValue::I64(9), 100, 10),
            Bucket::new(TupleValue::I64(10), TupleValue::I64(19), 100, 10),
        ])
    }

    #[test]
    fn equality_selectivity_uses_matching_bucket() {
        let h = uniform_histogram();
        let sel = equality_selectivity(&h, &TupleValue::I64(5), 200);
        assert!((sel - (100.0 / (10.0 * 200.0))).abs() < 1e-9);
    }

    #[test]
    fn equality_selectivity_falls_back_when_no_bucket_matches() {
        let h = uniform_histogram();
        assert_eq!(equality_selectivity(&h, &TupleValue::I64(999), 200), UNKNOWN_SELECTIVITY);
    }

    #[test]
    fn range_selectivity_covers_full_span() {
        let h = uniform_histogram();
        let sel = range_selectivity(&h, Some(&TupleValue::I64(0)), Some(&TupleValue::I64(19)), 200);
        assert!((sel - 1.0).abs() < 1e-9);
    }

    #[test]
    fn range_selectivity_partial_bucket_interpolates() {
        let h = uniform_histogram();
        // [0, 4] covers half of the first bucket (0..=9), none of the second.
        let sel = range_selectivity(&h, Some(&TupleValue::I64(0)), Some(&TupleValue::I64(4)), 200);
        let expected = (100.0 * 0.5) / 200.0;
        assert!((sel - expected).abs() < 0.05);
    }

    #[test]
    fn safe_div_guards_near_zero_denominator() {
        assert_eq!(safe_div(10.0, 0.0, 0.1), 0.1);
        assert_eq!(safe_div(10.0, 1e-12, 0.1), 0.1);
        assert_eq!(safe_div(10.0, 2.0, 0.1), 5.0);
    }

    #[test]
    fn change_threshold_policy_signals_refresh() {
        let mgr = StatisticsManager::new(StatisticsPolicy::ChangeThreshold { fraction: 0.1 }, 1.0);
        mgr.set("User", RecordTypeStatistics::new(100));
        for _ in 0..9 {
            assert!(!mgr.record_write("User"));
        }
        assert!(mgr.record_write("User"));
    }
}
