// Cost model (spec.md §4.I): estimates I/O, CPU, and row counts for a
// candidate [`crate::plan::Plan`], using pre-fetched statistics so the
// recursive estimator stays synchronous.

use crate::filter::{Comparison, Filter};
use crate::plan::Plan;
use crate::stats::{equality_selectivity, range_selectivity, safe_div, RecordTypeStatistics, UNKNOWN_SELECTIVITY};
use rl_type::TupleValue;

/// Weights turning row counts into abstract cost units. Defaults give every
/// row a unit I/O cost and attribute CPU cost to deserialization and filter
/// evaluation separately, matching the per-term breakdown in spec.md §4.I.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CostWeights {
    pub io_read: f64,
    pub deserialize: f64,
    pub filter: f64,
}

impl Default for CostWeights {
    fn default() -> Self {
        Self { io_read: 1.0, deserialize: 1.0, filter: 0.1 }
    }
}

/// The estimated cost of executing a plan: I/O units, CPU units, and the
/// number of rows expected to flow out of it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cost {
    pub io: f64,
    pub cpu: f64,
    pub estimated_rows: f64,
}

impl Cost {
    pub fn zero() -> Self {
        Self { io: 0.0, cpu: 0.0, estimated_rows: 0.0 }
    }

    /// Total cost used to rank candidate plans against one another.
    pub fn total(&self) -> f64 {
        self.io + self.cpu
    }
}

/// Estimates the cost of `plan` given `stats` for its record type (`None`
/// when statistics are unavailable, triggering the conservative defaults
/// spec.md §4.I calls for) and `total_rows`, the row count a `FullScan`
/// would see. `stats` is fetched once by the caller and threaded through
/// every recursive call -- no further statistics lookups happen here.
pub fn estimate_cost(plan: &Plan, stats: Option<&RecordTypeStatistics>, weights: &CostWeights) -> Cost {
    let total_rows = stats.map(|s| s.row_count).unwrap_or(0) as f64;
    match plan {
        Plan::FullScan { filter, .. } => {
            let sel = filter.as_ref().map(|f| filter_selectivity(f, stats)).unwrap_or(1.0);
            let rows = total_rows * sel;
            Cost { io: total_rows * weights.io_read, cpu: total_rows * (weights.deserialize + weights.filter), estimated_rows: rows }
        }
        Plan::IndexScan { key_range_rows, filter, .. } => {
            let rows = *key_range_rows;
            let cpu = rows * weights.filter * if filter.is_some() { 1.0 } else { 0.25 };
            Cost { io: rows * weights.io_read, cpu, estimated_rows: rows }
        }
        Plan::Intersection { children } => {
            let mut child_costs: Vec<Cost> = children.iter().map(|c| estimate_cost(c, stats, weights)).collect();
            child_costs.sort_by(|a, b| a.estimated_rows.partial_cmp(&b.estimated_rows).unwrap());
            let io: f64 = child_costs.iter().map(|c| c.io).sum();
            let cpu = child_costs.iter().map(|c| c.cpu).fold(0.0, f64::max);
            let selectivity_total: f64 = child_costs
                .iter()
                .map(|c| if total_rows > 0.0 { safe_div(c.estimated_rows, total_rows, UNKNOWN_SELECTIVITY) } else { UNKNOWN_SELECTIVITY })
                .product();
            let estimated_rows = total_rows * selectivity_total;
            Cost { io, cpu, estimated_rows }
        }
        Plan::Limit { child, n } => {
            let child_cost = estimate_cost(child, stats, weights);
            if child_cost.estimated_rows <= 0.0 {
                return Cost::zero();
            }
            let limit_factor = (*n as f64 / child_cost.estimated_rows).min(1.0);
            Cost {
                io: child_cost.io * limit_factor,
                cpu: child_cost.cpu * limit_factor,
                estimated_rows: child_cost.estimated_rows * limit_factor,
            }
        }
        Plan::Sort { child, streamed, .. } => {
            let child_cost = estimate_cost(child, stats, weights);
            if *streamed {
                child_cost
            } else {
                let rows = child_cost.estimated_rows.max(1.0);
                let sort_cpu = rows * rows.log2().max(1.0) * weights.filter;
                Cost { io: child_cost.io, cpu: child_cost.cpu + sort_cpu, estimated_rows: child_cost.estimated_rows }
            }
        }
    }
}

/// Overall selectivity of a filter tree against `stats`'s histograms,
/// combining per-leaf selectivity through the boolean structure: `And`
/// multiplies (independence assumption), `Or` uses inclusion-exclusion's
/// two-term approximation, `Not` complements.
pub fn filter_selectivity(filter: &Filter, stats: Option<&RecordTypeStatistics>) -> f64 {
    match filter {
        Filter::True => 1.0,
        Filter::False => 0.0,
        Filter::Not(inner) => (1.0 - filter_selectivity(inner, stats)).clamp(0.0, 1.0),
        Filter::And(children) => children.iter().map(|c| filter_selectivity(c, stats)).product(),
        Filter::Or(children) => {
            let mut remaining = 1.0;
            for child in children {
                remaining *= 1.0 - filter_selectivity(child, stats);
            }
            (1.0 - remaining).clamp(0.0, 1.0)
        }
        Filter::Field { name, comparison } => field_selectivity(name, comparison, stats),
    }
}

fn field_selectivity(name: &str, comparison: &Comparison, stats: Option<&RecordTypeStatistics>) -> f64 {
    let Some(stats) = stats else { return UNKNOWN_SELECTIVITY };
    let Some(histogram) = stats.histograms.get(name) else { return UNKNOWN_SELECTIVITY };
    match comparison {
        Comparison::Eq(v) => equality_selectivity(histogram, v, stats.row_count),
        Comparison::Lt(v) => range_selectivity(histogram, None, Some(v), stats.row_count),
        Comparison::Le(v) => range_selectivity(histogram, None, Some(v), stats.row_count),
        Comparison::Gt(v) => range_selectivity(histogram, Some(v), None, stats.row_count),
        Comparison::Ge(v) => range_selectivity(histogram, Some(v), None, stats.row_count),
        Comparison::In(values) => values
            .iter()
            .map(|v| equality_selectivity(histogram, v, stats.row_count))
            .sum::<f64>()
            .min(1.0),
        Comparison::StartsWith(_) | Comparison::Contains(_) => UNKNOWN_SELECTIVITY,
    }
}

/// Row count a query for `value` equal to a single point would touch,
/// used by the planner to size an `IndexScan` candidate's `key_range_rows`
/// before costing it.
pub fn point_row_estimate(name: &str, value: &TupleValue, stats: Option<&RecordTypeStatistics>) -> f64 {
    let Some(stats) = stats else { return UNKNOWN_SELECTIVITY * 1000.0 };
    let Some(histogram) = stats.histograms.get(name) else {
        return UNKNOWN_SELECTIVITY * stats.row_count as f64;
    };
    equality_selectivity(histogram, value, stats.row_count) * stats.row_count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Bucket, Histogram};

    fn stats_with_age_histogram() -> RecordTypeStatistics {
        RecordTypeStatistics::new(10_000).with_histogram(
            "age",
            Histogram::new(vec![Bucket::new(TupleValue::I64(0), TupleValue::I64(99), 10_000, 100)]),
        )
    }

    #[test]
    fn full_scan_cost_scales_with_row_count_and_selectivity() {
        let stats = RecordTypeStatistics::new(1000);
        let plan = Plan::FullScan { record_type: "User".into(), filter: None };
        let cost = estimate_cost(&plan, Some(&stats), &CostWeights::default());
        assert_eq!(cost.estimated_rows, 1000.0);
        assert!(cost.io > 0.0);
    }

    #[test]
    fn index_scan_cheaper_than_full_scan_for_selective_predicate() {
        let stats = stats_with_age_histogram();
        let weights = CostWeights::default();
        let full = Plan::FullScan {
            record_type: "User".into(),
            filter: Some(Filter::field("age", Comparison::Eq(TupleValue::I64(5)))),
        };
        let indexed = Plan::IndexScan {
            index_name: "by_age".into(),
            key_range_rows: point_row_estimate("age", &TupleValue::I64(5), Some(&stats)),
            filter: None,
        };
        let full_cost = estimate_cost(&full, Some(&stats), &weights);
        let index_cost = estimate_cost(&indexed, Some(&stats), &weights);
        assert!(index_cost.total() < full_cost.total());
    }

    #[test]
    fn intersection_cost_sums_io_and_multiplies_selectivity() {
        let stats = stats_with_age_histogram();
        let weights = CostWeights::default();
        let a = Plan::IndexScan { index_name: "a".into(), key_range_rows: 100.0, filter: None };
        let b = Plan::IndexScan { index_name: "b".into(), key_range_rows: 50.0, filter: None };
        let plan = Plan::Intersection { children: vec![a, b] };
        let cost = estimate_cost(&plan, Some(&stats), &weights);
        assert!(cost.io > 0.0);
        assert!(cost.estimated_rows <= 100.0);
    }

    #[test]
    fn limit_zero_child_rows_yields_zero_cost() {
        let plan = Plan::Limit {
            child: Box::new(Plan::FullScan { record_type: "User".into(), filter: Some(Filter::False) }),
            n: 10,
        };
        let stats = RecordTypeStatistics::new(1000);
        let cost = estimate_cost(&plan, Some(&stats), &CostWeights::default());
        assert_eq!(cost.total(), 0.0);
        assert_eq!(cost.estimated_rows, 0.0);
    }

    #[test]
    fn limit_factor_scales_down_cost() {
        let stats = RecordTypeStatistics::new(1000);
        let plan = Plan::Limit {
            child: Box::new(Plan::FullScan { record_type: "User".into(), filter: None }),
            n: 10,
        };
        let cost = estimate_cost(&plan, Some(&stats), &CostWeights::default());
        assert!((cost.estimated_rows - 10.0).abs() < 1e-9);
    }

    #[test]
    fn missing_statistics_fall_back_to_conservative_defaults() {
        let plan = Plan::FullScan {
            record_type: "User".into(),
            filter: Some(Filter::field("age", Comparison::Eq(TupleValue::I64(1)))),
        };
        let cost = estimate_cost(&plan, None, &CostWeights::default());
        assert_eq!(cost.estimated_rows, 0.0);
    }
}
