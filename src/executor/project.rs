//! Projection into fixed-schema records
//!
//! A projection request computes its field names once, up front, and
//! every produced row shares that schema. Attribute specs project under
//! their own dotted path; any other spec gets a synthetic name derived
//! from its position among all specs, so names stay stable and
//! collision-free across rows.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::expr::{self, Expr};

use super::errors::{EngineError, EngineResult};

/// Field names of a projection, in spec order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    fields: Vec<String>,
}

impl RecordSchema {
    /// Derives the schema from projection specs: an attribute spec
    /// contributes its dotted path, anything else `dynamic_<position>`.
    pub fn from_specs(specs: &[Expr]) -> Self {
        let fields = specs
            .iter()
            .enumerate()
            .map(|(position, spec)| match spec.attribute_path() {
                Some(path) => path,
                None => format!("dynamic_{position}"),
            })
            .collect();
        Self { fields }
    }

    /// Field names in order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Position of a field, if present
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field == name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true for an empty projection
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A projected row: values aligned to a schema shared by every row of
/// the same projection request
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
}

impl Record {
    /// The shared schema
    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Field value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.position(name).map(|idx| &self.values[idx])
    }

    /// Field values in schema order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// (name, value) pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Converts the row into a JSON object so it can flow through the
    /// generic stages (grouping a projected sequence, for instance).
    pub fn into_value(self) -> Value {
        let mut object = Map::new();
        for (name, value) in self.schema.fields.iter().zip(self.values) {
            object.insert(name.clone(), value);
        }
        Value::Object(object)
    }
}

/// Builds fixed-schema records from projection specs
pub struct ProjectStage;

impl ProjectStage {
    /// Projects each item into a record, one field per spec.
    pub fn project(items: &[Value], specs: &[Expr]) -> EngineResult<Vec<Record>> {
        let schema = Arc::new(RecordSchema::from_specs(specs));

        items
            .iter()
            .map(|item| {
                let values = specs
                    .iter()
                    .map(|spec| Self::field_value(spec, item))
                    .collect::<EngineResult<Vec<_>>>()?;
                Ok(Record {
                    schema: Arc::clone(&schema),
                    values,
                })
            })
            .collect()
    }

    fn field_value(spec: &Expr, item: &Value) -> EngineResult<Value> {
        match spec {
            Expr::Attribute { path } => expr::resolve_path(item, path)
                .map(Value::clone)
                .map_err(|_| EngineError::attribute_not_found(path.join("."), "select")),
            other => Ok(expr::evaluate(other, item)?),
        }
    }
}
