use crate::filter::Filter;

/// Pushes `Not` down to the leaves via De Morgan's laws, so downstream
/// passes never have to reason about a `Not` wrapping a compound node.
/// `not(field)` is left as-is: negating a single comparison is not
/// simplified further here (the planner handles it at the leaf).
pub fn push_not_down(filter: Filter) -> Filter {
    match filter {
        Filter::Not(inner) => match *inner {
            Filter::Not(inner2) => push_not_down(*inner2),
            Filter::And(children) => {
                Filter::Or(children.into_iter().map(|c| push_not_down(Filter::not(c))).collect())
            }
            Filter::Or(children) => {
                Filter::And(children.into_iter().map(|c| push_not_down(Filter::not(c))).collect())
            }
            Filter::True => Filter::False,
            Filter::False => Filter::True,
            other @ Filter::Field { .. } => Filter::Not(Box::new(other)),
        },
        Filter::And(children) => Filter::And(children.into_iter().map(push_not_down).collect()),
        Filter::Or(children) => Filter::Or(children.into_iter().map(push_not_down).collect()),
        other => other,
    }
}

/// Flattens nested `And`/`Or` of the same kind (`and(and(a,b), c)` becomes
/// `and(a, b, c)`) so later passes see a uniform shape.
pub fn flatten(filter: Filter) -> Filter {
    match filter {
        Filter::And(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children.into_iter().map(flatten) {
                match child {
                    Filter::And(grandchildren) => flat.extend(grandchildren),
                    other => flat.push(other),
                }
            }
            Filter::And(flat)
        }
        Filter::Or(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children.into_iter().map(flatten) {
                match child {
                    Filter::Or(grandchildren) => flat.extend(grandchildren),
                    other => flat.push(other),
                }
            }
            Filter::Or(flat)
        }
        Filter::Not(inner) => Filter::Not(Box::new(flatten(*inner))),
        other => other,
    }
}

/// Folds away trivially decidable nodes: an empty `And` is `True` (the
/// identity), an empty `Or` is `False`, a single-child `And`/`Or` collapses
/// to its child, and any `And`/`Or` containing its own absorbing element
/// (`False`/`True` respectively) collapses to that element.
pub fn constant_fold(filter: Filter) -> Filter {
    match filter {
        Filter::And(children) => {
            let children: Vec<Filter> = children.into_iter().map(constant_fold).collect();
            if children.iter().any(|c| matches!(c, Filter::False)) {
                return Filter::False;
            }
            let children: Vec<Filter> = children.into_iter().filter(|c| !matches!(c, Filter::True)).collect();
            match children.len() {
                0 => Filter::True,
                1 => children.into_iter().next().unwrap(),
                _ => Filter::And(children),
            }
        }
        Filter::Or(children) => {
            let children: Vec<Filter> = children.into_iter().map(constant_fold).collect();
            if children.iter().any(|c| matches!(c, Filter::True)) {
                return Filter::True;
            }
            let children: Vec<Filter> = children.into_iter().filter(|c| !matches!(c, Filter::False)).collect();
            match children.len() {
                0 => Filter::False,
                1 => children.into_iter().next().unwrap(),
                _ => Filter::Or(children),
            }
        }
        Filter::Not(inner) => match constant_fold(*inner) {
            Filter::True => Filter::False,
            Filter::False => Filter::True,
            other => Filter::Not(Box::new(other)),
        },
        other => other,
    }
}

/// Runs the full bounded rewrite pipeline: push-not-down, flatten, constant
/// fold. Does not attempt DNF conversion -- see [`estimate_dnf_terms`] and
/// [`to_dnf`] for that, gated separately by `max_dnf_terms`.
pub fn rewrite(filter: Filter) -> Filter {
    constant_fold(flatten(push_not_down(filter)))
}

/// Estimates how many disjunctive terms a filter would expand to in DNF,
/// without actually expanding it: `and` multiplies children's term counts,
/// `or` sums them, a leaf (or `Not`-wrapped leaf) is 1. Used to bound
/// exponential blow-up before attempting [`to_dnf`] (spec.md §4.I).
pub fn estimate_dnf_terms(filter: &Filter) -> u64 {
    match filter {
        Filter::And(children) => children.iter().map(estimate_dnf_terms).product::<u64>().max(1),
        Filter::Or(children) => children.iter().map(estimate_dnf_terms).sum::<u64>().max(1),
        Filter::Not(inner) => estimate_dnf_terms(inner),
        Filter::Field { .. } | Filter::True | Filter::False => 1,
    }
}

/// Converts `filter` to disjunctive normal form (an `Or` of `And`s of
/// leaves), but only if [`estimate_dnf_terms`] does not exceed
/// `max_dnf_terms`. Returns the filter unchanged (not in DNF) when the
/// estimate is too large, leaving the caller to fall back to a
/// non-DNF-aware plan (e.g. a single index scan plus residual filter).
pub fn to_dnf(filter: Filter, max_dnf_terms: u64) -> Filter {
    if estimate_dnf_terms(&filter) > max_dnf_terms {
        return filter;
    }
    distribute(filter)
}

/// Expands `filter` into an explicit disjunction-of-conjunctions: each
/// inner `Vec<Filter>` is one conjunctive term's leaves.
fn distribute_list(filter: Filter) -> Vec<Vec<Filter>> {
    match filter {
        Filter::And(children) => children.into_iter().map(distribute_list).fold(vec![vec![]], |acc, next| {
            let mut combined = Vec::with_capacity(acc.len() * next.len().max(1));
            for a in &acc {
                for n in &next {
                    let mut term = a.clone();
                    term.extend(n.clone());
                    combined.push(term);
                }
            }
            combined
        }),
        Filter::Or(children) => children.into_iter().flat_map(distribute_list).collect(),
        other => vec![vec![other]],
    }
}

fn distribute(filter: Filter) -> Filter {
    let mut terms = distribute_list(filter);
    match terms.len() {
        1 => Filter::And(terms.pop().unwrap()),
        _ => Filter::Or(terms.into_iter().map(Filter::And).collect()),
    }
}
