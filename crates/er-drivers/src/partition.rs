//! # Partition Selection
//!
//! Events are stored one collection per event type. A filter that pins
//! `meta.type` to one value only needs that collection; anything else has
//! to scan them all.

use crate::plan::{native_operator, FilterPlan};
use er_core::event::TYPE_FIELD;
use er_core::Operator;

/// Field whose value names the collection an event lives in.
pub const PARTITION_FIELD: &str = TYPE_FIELD;

/// The single collection the plan is confined to, if any.
///
/// Requires exactly one equality clause on [`PARTITION_FIELD`]; other
/// clauses on the field are left to the query itself.
pub fn narrowed(plan: &FilterPlan) -> Option<&str> {
    let predicate = plan.field(PARTITION_FIELD)?;
    let eq = native_operator(Operator::Eq);
    let mut equalities = predicate.clauses.iter().filter(|clause| clause.op == eq);
    let only = equalities.next()?;
    if equalities.next().is_some() {
        return None;
    }
    Some(only.value.as_str())
}

/// Collections to query for `plan`, given every known collection.
///
/// Performs no I/O and does not check that a narrowed collection exists.
pub fn select_partitions(plan: &FilterPlan, all: Vec<String>) -> Vec<String> {
    match narrowed(plan) {
        Some(collection) => vec![collection.to_string()],
        None => all,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use er_core::Params;

    fn all() -> Vec<String> {
        vec!["p1".into(), "p2".into(), "p3".into()]
    }

    fn plan(conditions: &[(Operator, &str, &str)]) -> FilterPlan {
        let mut params = Params::new();
        for (op, key, value) in conditions {
            params.add(*op, *key, *value);
        }
        FilterPlan::build(&params)
    }

    #[test]
    fn test_equality_narrows_to_one() {
        let plan = plan(&[
            (Operator::Eq, "meta.type", "EiffelActivityTriggeredEvent"),
            (Operator::Eq, "meta.id", "x"),
        ]);
        assert_eq!(
            select_partitions(&plan, all()),
            vec!["EiffelActivityTriggeredEvent".to_string()]
        );
    }

    #[test]
    fn test_unknown_collection_is_not_checked() {
        let plan = plan(&[(Operator::Eq, "meta.type", "p9")]);
        assert_eq!(select_partitions(&plan, all()), vec!["p9".to_string()]);
    }

    #[test]
    fn test_no_type_filter_keeps_full_list() {
        let plan = plan(&[(Operator::Eq, "meta.id", "x")]);
        assert_eq!(select_partitions(&plan, all()), all());
        assert_eq!(select_partitions(&FilterPlan::default(), all()), all());
    }

    #[test]
    fn test_non_equality_keeps_full_list() {
        let plan = plan(&[
            (Operator::Ne, "meta.type", "p1"),
            (Operator::Gt, "meta.type", "p0"),
        ]);
        assert_eq!(select_partitions(&plan, all()), all());
    }

    #[test]
    fn test_equality_next_to_other_clauses_still_narrows() {
        let plan = plan(&[
            (Operator::Ne, "meta.type", "p1"),
            (Operator::Eq, "meta.type", "p2"),
        ]);
        assert_eq!(narrowed(&plan), Some("p2"));
    }

    #[test]
    fn test_two_equalities_do_not_narrow() {
        let plan = plan(&[
            (Operator::Eq, "meta.type", "p1"),
            (Operator::Eq, "meta.type", "p2"),
        ]);
        assert_eq!(narrowed(&plan), None);
        assert_eq!(select_partitions(&plan, all()), all());
    }
}
