//! Query planner and cost estimator (spec.md §4.I) plus the statistics
//! manager (spec.md §4.J): translates a typed filter/sort/limit query into
//! an execution plan, costs candidate plans using pre-fetched statistics,
//! and caches the chosen plan under a canonical, order-independent key.

mod cache;
mod cost;
mod error;
mod filter;
mod plan;
mod rewrite;
mod stats;

pub use cache::{compute_cache_key, CacheKey, PlanCache};
pub use cost::{estimate_cost, filter_selectivity, point_row_estimate, Cost, CostWeights};
pub use error::{Error, Result};
pub use filter::{Comparison, Filter, Query, SortKey};
pub use plan::{bounds_for_comparison, candidate_plans, choose_plan, comparison_for_field, Plan};
pub use rewrite::{constant_fold, estimate_dnf_terms, flatten, push_not_down, rewrite, to_dnf};
pub use stats::{
    equality_selectivity, range_selectivity, safe_div, Bucket, Histogram, RecordTypeStatistics,
    StatisticsManager, StatisticsPolicy, UNKNOWN_SELECTIVITY,
};
