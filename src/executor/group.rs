//! Equivalence-class grouping
//!
//! `GroupedItems` is an insertion-ordered mapping from group-key value
//! to member sequence, built in a single pass. Groups appear in order of
//! first occurrence; members keep their relative input order. Key
//! equality is by value: a bucket index over a type-tagged canonical
//! rendering keeps the pass O(n) while distinguishing, say, the string
//! `"1"` from the number `1`.

use std::collections::HashMap;

use serde_json::Value;

use crate::expr::{self, Expr};

use super::errors::EngineResult;

/// Order-preserving mapping from group key to member items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedItems {
    buckets: Vec<(Value, Vec<Value>)>,
}

impl GroupedItems {
    /// Partitions `items` into equivalence classes under `key_fn`.
    pub fn partition<F>(items: Vec<Value>, mut key_fn: F) -> EngineResult<GroupedItems>
    where
        F: FnMut(&Value) -> EngineResult<Value>,
    {
        let mut buckets: Vec<(Value, Vec<Value>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for item in items {
            let key = key_fn(&item)?;
            let slot = *index
                .entry(canonical_key(&key))
                .or_insert_with(|| {
                    buckets.push((key, Vec::new()));
                    buckets.len() - 1
                });
            buckets[slot].1.push(item);
        }

        Ok(GroupedItems { buckets })
    }

    /// The members grouped under `key`, if any
    pub fn get(&self, key: &Value) -> Option<&[Value]> {
        self.buckets
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, members)| members.as_slice())
    }

    /// Group keys in first-occurrence order
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.buckets.iter().map(|(key, _)| key)
    }

    /// (key, members) pairs in first-occurrence order
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &[Value])> {
        self.buckets
            .iter()
            .map(|(key, members)| (key, members.as_slice()))
    }

    /// Number of groups
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if no groups were formed
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Groups a sequence by a key expression
pub struct GroupStage;

impl GroupStage {
    /// Partitions `items` under the query's group key. Attribute keys
    /// resolve their path; any other key expression is evaluated.
    pub fn group(items: Vec<Value>, key: &Expr) -> EngineResult<GroupedItems> {
        match key {
            Expr::Attribute { path } => GroupedItems::partition(items, |item| {
                Ok(expr::resolve_path(item, path)?.clone())
            }),
            other => GroupedItems::partition(items, |item| Ok(expr::evaluate(other, item)?)),
        }
    }
}

/// Type-tagged rendering used to bucket keys by value equality
fn canonical_key(value: &Value) -> String {
    match value {
        Value::Null => "z:null".to_string(),
        Value::Bool(b) => format!("b:{b}"),
        Value::Number(n) => format!("n:{n}"),
        Value::String(s) => format!("s:{s}"),
        // Compound keys are rare; their JSON rendering is canonical
        // enough (serde_json maps iterate in a fixed key order).
        other => format!("j:{other}"),
    }
}
