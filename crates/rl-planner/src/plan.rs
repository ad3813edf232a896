// Plan generation (spec.md §4.I): translates a rewritten [`Query`] into
// candidate execution plans and picks the cheapest by estimated cost.

use crate::cost::{estimate_cost, filter_selectivity, point_row_estimate, Cost, CostWeights};
use crate::filter::{Comparison, Filter, Query, SortKey};
use crate::rewrite::rewrite;
use crate::stats::RecordTypeStatistics;
use rl_schema::{IndexDefinition, IndexKind, Schema};
use rl_type::TupleValue;

/// One candidate (or chosen) execution plan (spec.md §4.I Plan variants).
#[derive(Clone, Debug, PartialEq)]
pub enum Plan {
    FullScan {
        record_type: String,
        filter: Option<Filter>,
    },
    IndexScan {
        index_name: String,
        /// Pre-estimated row count covered by this scan's key range, so the
        /// cost model never has to look statistics up itself mid-recursion.
        key_range_rows: f64,
        /// Residual filter left over after the index range already
        /// accounts for part of the predicate.
        filter: Option<Filter>,
    },
    Intersection {
        children: Vec<Plan>,
    },
    Limit {
        child: Box<Plan>,
        n: usize,
    },
    Sort {
        child: Box<Plan>,
        keys: Vec<SortKey>,
        /// Whether the child already produces rows in this order (e.g. an
        /// `IndexScan` over the same field), letting execution stream
        /// instead of materializing and sorting.
        streamed: bool,
    },
}

/// Extracts, from a single comparison leaf against `field_name`, the
/// `(lower, upper)` bound pair an index scan over that field would need --
/// `None` on either side means unbounded.
pub fn bounds_for_comparison(comparison: &Comparison) -> Option<(Option<TupleValue>, Option<TupleValue>)> {
    match comparison {
        Comparison::Eq(v) => Some((Some(v.clone()), Some(v.clone()))),
        Comparison::Lt(v) | Comparison::Le(v) => Some((None, Some(v.clone()))),
        Comparison::Gt(v) | Comparison::Ge(v) => Some((Some(v.clone()), None)),
        Comparison::In(_) | Comparison::StartsWith(_) | Comparison::Contains(_) => None,
    }
}

/// A single indexable leaf pulled out of a (possibly `And`-flattened)
/// filter: the field it constrains, the index that can serve it, and the
/// comparison itself.
struct IndexableLeaf<'a> {
    index: &'a IndexDefinition,
    comparison: &'a Comparison,
}

/// Finds, for each top-level leaf of a (flattened) `And` filter, a `value`
/// index whose root expression is exactly that single field.
fn indexable_leaves<'a>(children: &'a [Filter], schema: &'a Schema, record_type: &str) -> Vec<IndexableLeaf<'a>> {
    let candidates = schema.indexes_for_record_type(record_type);
    children
        .iter()
        .filter_map(|child| {
            let Filter::Field { name, comparison } = child else { return None };
            candidates
                .iter()
                .find(|idx| idx.kind() == IndexKind::Value && single_field_name(idx) == Some(name.as_str()))
                .map(|idx| IndexableLeaf { index: idx, comparison })
        })
        .collect()
}

fn single_field_name(index: &IndexDefinition) -> Option<&str> {
    match index.root_expression() {
        rl_expr::KeyExpression::Field(name) => Some(name.as_str()),
        _ => None,
    }
}

/// Builds every candidate plan for `query` against `schema`, without yet
/// costing or choosing among them. The filter is rewritten (push-not-down,
/// flatten, constant-fold) first; DNF conversion is left to the caller since
/// it is bounded by a config knob (`max_dnf_terms`) this function doesn't
/// own.
pub fn candidate_plans(query: &Query, schema: &Schema) -> Vec<Plan> {
    let filter = query.filter.clone().map(rewrite);
    let mut plans = vec![Plan::FullScan { record_type: query.record_type.clone(), filter: filter.clone() }];

    if let Some(filter) = &filter {
        let leaves: Vec<Filter> = match filter {
            Filter::And(children) => children.clone(),
            other => vec![other.clone()],
        };
        let indexable = indexable_leaves(&leaves, schema, &query.record_type);

        if !indexable.is_empty() {
            let used_fields: Vec<&str> =
                indexable.iter().filter_map(|l| single_field_name(l.index)).collect();
            let residual: Vec<Filter> = leaves
                .iter()
                .filter(|l| match l {
                    Filter::Field { name, .. } => !used_fields.contains(&name.as_str()),
                    _ => true,
                })
                .cloned()
                .collect();
            let residual_filter = match residual.len() {
                0 => None,
                1 => Some(residual.into_iter().next().unwrap()),
                _ => Some(Filter::And(residual)),
            };

            if indexable.len() == 1 {
                plans.push(Plan::IndexScan {
                    index_name: indexable[0].index.name().to_string(),
                    key_range_rows: 0.0, // filled in by `size_index_scans`
                    filter: residual_filter,
                });
            } else {
                let children: Vec<Plan> = indexable
                    .iter()
                    .map(|l| Plan::IndexScan {
                        index_name: l.index.name().to_string(),
                        key_range_rows: 0.0,
                        filter: None,
                    })
                    .collect();
                plans.push(Plan::Intersection { children });
                if let Some(residual_filter) = residual_filter {
                    let last = plans.pop().unwrap();
                    plans.push(wrap_residual(last, residual_filter));
                }
            }
        }
    }

    plans
}

/// `Intersection` has no filter slot of its own; a residual filter left
/// after both sides of the intersection are satisfied is represented by
/// wrapping the intersection in a degenerate single-child `FullScan`-style
/// residual check is wrong (it would re-scan); instead we fold it into the
/// first child's filter slot, since every `IndexScan` child already carries
/// one.
fn wrap_residual(plan: Plan, residual: Filter) -> Plan {
    match plan {
        Plan::Intersection { mut children } => {
            if let Some(Plan::IndexScan { filter, .. }) = children.first_mut() {
                *filter = Some(match filter.take() {
                    Some(existing) => Filter::And(vec![existing, residual]),
                    None => residual,
                });
            }
            Plan::Intersection { children }
        }
        other => other,
    }
}

/// Fills in each `IndexScan`'s `key_range_rows` using point/range
/// estimates from `stats`, now that the candidate shape is fixed. Recurses
/// through `Intersection` children. Each `IndexScan` is sized using only
/// the leaf that matches *its own* indexed field -- not just the first
/// bounded leaf in the filter -- so two index scans in the same
/// `Intersection` don't both size themselves off the same predicate.
fn size_index_scans(plan: Plan, schema: &Schema, query_filter: &Option<Filter>, stats: Option<&RecordTypeStatistics>) -> Plan {
    match plan {
        Plan::IndexScan { index_name, filter, .. } => {
            let field_name = schema.index(&index_name).ok().and_then(single_field_name);
            let rows = match field_name {
                Some(field_name) => estimate_index_scan_rows(field_name, query_filter, stats),
                None => stats.map(|s| s.row_count as f64).unwrap_or(0.0),
            };
            Plan::IndexScan { index_name, key_range_rows: rows, filter }
        }
        Plan::Intersection { children } => Plan::Intersection {
            children: children.into_iter().map(|c| size_index_scans(c, schema, query_filter, stats)).collect(),
        },
        other => other,
    }
}

/// Finds the leaf of `query_filter` constraining `field_name` and converts
/// it into a row-count estimate via the field's histogram.
fn estimate_index_scan_rows(
    field_name: &str,
    query_filter: &Option<Filter>,
    stats: Option<&RecordTypeStatistics>,
) -> f64 {
    let Some(filter) = query_filter else { return stats.map(|s| s.row_count as f64).unwrap_or(0.0) };
    let leaves: Vec<&Filter> = match filter {
        Filter::And(children) => children.iter().collect(),
        other => vec![other],
    };
    for leaf in leaves {
        if let Filter::Field { name, comparison } = leaf {
            if name != field_name {
                continue;
            }
            if let Some((lower, upper)) = bounds_for_comparison(comparison) {
                let total = stats.map(|s| s.row_count).unwrap_or(0);
                if let (Some(l), Some(u)) = (&lower, &upper) {
                    if l == u {
                        return point_row_estimate(name, l, stats);
                    }
                }
                if let Some(histogram) = stats.and_then(|s| s.histograms.get(name)) {
                    let sel = crate::stats::range_selectivity(histogram, lower.as_ref(), upper.as_ref(), total);
                    return sel * total as f64;
                }
                return crate::stats::UNKNOWN_SELECTIVITY * total as f64;
            }
        }
    }
    stats.map(|s| s.row_count as f64).unwrap_or(0.0)
}

/// Finds the leaf of `filter` constraining `field_name` and returns its
/// comparison, for an executor translating an `IndexScan` plan back into an
/// actual key range. Mirrors the leaf-matching `estimate_index_scan_rows`
/// does when sizing the same candidate.
pub fn comparison_for_field<'a>(filter: &'a Filter, field_name: &str) -> Option<&'a Comparison> {
    let leaves: Vec<&Filter> = match filter {
        Filter::And(children) => children.iter().collect(),
        other => vec![other],
    };
    leaves.into_iter().find_map(|leaf| match leaf {
        Filter::Field { name, comparison } if name == field_name => Some(comparison),
        _ => None,
    })
}

/// Whether `plan`'s natural output order already satisfies `keys`, letting
/// `Sort` stream instead of materialize.
fn already_ordered_by(plan: &Plan, keys: &[SortKey]) -> bool {
    if keys.len() != 1 {
        return false;
    }
    match plan {
        Plan::IndexScan { index_name, .. } => index_name == &keys[0].field && keys[0].ascending,
        _ => false,
    }
}

/// Wraps `plan` with `Sort`/`Limit` nodes as the query requires, and returns
/// the final candidate. `streamed` is computed against the *inner* plan,
/// before a `Limit` wrapper is added.
fn apply_sort_and_limit(plan: Plan, query: &Query) -> Plan {
    let mut current = plan;
    if !query.sort.is_empty() {
        let streamed = already_ordered_by(&current, &query.sort);
        current = Plan::Sort { child: Box::new(current), keys: query.sort.clone(), streamed };
    }
    if let Some(n) = query.limit {
        current = Plan::Limit { child: Box::new(current), n };
    }
    current
}

/// Builds every candidate, costs each, and returns the cheapest by
/// [`Cost::total`]. Ties broken in candidate-generation order (`FullScan`
/// is always first, so a genuine tie prefers it).
pub fn choose_plan(
    query: &Query,
    schema: &Schema,
    stats: Option<&RecordTypeStatistics>,
    weights: &CostWeights,
) -> Result<Plan, crate::error::Error> {
    let rewritten_filter = query.filter.clone().map(rewrite);
    let mut candidates = candidate_plans(query, schema);
    for plan in &mut candidates {
        *plan = size_index_scans(std::mem::replace(plan, Plan::FullScan { record_type: String::new(), filter: None }), schema, &rewritten_filter, stats);
    }
    let candidates: Vec<Plan> = candidates.into_iter().map(|p| apply_sort_and_limit(p, query)).collect();

    candidates
        .into_iter()
        .map(|plan| {
            let cost = estimate_cost(&plan, stats, weights);
            (plan, cost)
        })
        .min_by(|(_, a), (_, b)| a.total().partial_cmp(&b.total()).unwrap())
        .map(|(plan, _)| plan)
        .ok_or(crate::error::Error::NoValidPlan)
}

/// Re-exported so callers that only need the selectivity formula (e.g. a
/// "why did the planner choose this" debug tool) don't have to import
/// `cost` directly.
pub fn estimate_filter_selectivity(filter: &Filter, stats: Option<&RecordTypeStatistics>) -> f64 {
    filter_selectivity(filter, stats)
}
