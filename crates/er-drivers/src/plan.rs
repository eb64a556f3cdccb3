//! # Filter Plans
//!
//! The native form of a [`Params`] value for document stores: for each
//! key, the translated `$op: value` clauses that must all hold.

use er_core::event::ID_FIELD;
use er_core::{Operator, Params};
use serde_json::{Map, Value};

/// Native comparison token for an abstract operator.
pub const fn native_operator(op: Operator) -> &'static str {
    match op {
        Operator::Eq => "$eq",
        Operator::Ne => "$ne",
        Operator::Gt => "$gt",
        Operator::Lt => "$lt",
        Operator::Gte => "$gte",
        Operator::Lte => "$lte",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeClause {
    pub op: &'static str,
    pub value: String,
}

/// All clauses on one field, conjoined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPredicate {
    pub field: String,
    pub clauses: Vec<NativeClause>,
}

/// A backend-native filter. Top-level fields are conjoined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPlan {
    predicates: Vec<FieldPredicate>,
}

impl FilterPlan {
    /// Translate every key of `params`, keeping key and clause order.
    pub fn build(params: &Params) -> Self {
        let predicates = params
            .iter()
            .map(|(field, conditions)| FieldPredicate {
                field: field.to_string(),
                clauses: conditions
                    .iter()
                    .map(|condition| NativeClause {
                        op: native_operator(condition.op),
                        value: condition.value.clone(),
                    })
                    .collect(),
            })
            .collect();
        Self { predicates }
    }

    /// Plan matching the event with identifier `id`.
    pub fn by_id(id: &str) -> Self {
        let mut params = Params::new();
        params.add(Operator::Eq, ID_FIELD, id);
        Self::build(&params)
    }

    pub fn predicates(&self) -> &[FieldPredicate] {
        &self.predicates
    }

    pub fn field(&self, name: &str) -> Option<&FieldPredicate> {
        self.predicates.iter().find(|p| p.field == name)
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// The plan as a query document: `{field: {$op: value, ...}, ...}`.
    ///
    /// A document cannot hold the same operator twice under one field, so
    /// repeated operators (`a!=1&a!=2`) move into a top-level `$and`.
    pub fn to_document(&self) -> Value {
        let mut document = Map::new();
        let mut repeated = Vec::new();
        for predicate in &self.predicates {
            let mut clauses = Map::new();
            for clause in &predicate.clauses {
                if clauses.contains_key(clause.op) {
                    repeated.push(single_clause(&predicate.field, clause));
                } else {
                    clauses.insert(clause.op.to_string(), Value::String(clause.value.clone()));
                }
            }
            document.insert(predicate.field.clone(), Value::Object(clauses));
        }
        if !repeated.is_empty() {
            document.insert("$and".to_string(), Value::Array(repeated));
        }
        Value::Object(document)
    }
}

fn single_clause(field: &str, clause: &NativeClause) -> Value {
    let mut inner = Map::new();
    inner.insert(clause.op.to_string(), Value::String(clause.value.clone()));
    let mut outer = Map::new();
    outer.insert(field.to_string(), Value::Object(inner));
    Value::Object(outer)
}
