//! Provider dispatch
//!
//! A provider executes a query against a concrete source. The
//! collection provider runs the staged pipeline over an ordered
//! sequence; the map provider adapts a JSON object into
//! `{"key", "value"}` records, delegates to the collection pipeline,
//! and re-materializes element results back into a mapping keyed by the
//! original keys.
//!
//! Providers hold no per-call state: every execution derives everything
//! it needs from the query and options it was handed, so concurrent
//! calls against one provider are independent.

use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use crate::expr::Expr;
use crate::query::{Action, Query};

use super::aggregate::AggregateStage;
use super::errors::{EngineError, EngineResult};
use super::filter::FilterStage;
use super::group::{GroupStage, GroupedItems};
use super::project::{ProjectStage, Record};
use super::sort::SortStage;

/// Resolves an action token; unknown tokens are rejected with the
/// engine's fixed message.
pub fn parse_action(token: &str) -> EngineResult<Action> {
    match token {
        "select_many" => Ok(Action::SelectMany),
        "select" => Ok(Action::Select),
        "count" => Ok(Action::Count),
        "max" => Ok(Action::Max),
        "min" => Ok(Action::Min),
        "sum" => Ok(Action::Sum),
        "avg" => Ok(Action::Avg),
        unknown => Err(EngineError::invalid_action(unknown)),
    }
}

/// A projection column: raw text handled by the engine's minimal column
/// parser, or an expression built elsewhere (typically by the external
/// expression parser).
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSpec {
    Text(String),
    Parsed(Expr),
}

impl From<&str> for ColumnSpec {
    fn from(text: &str) -> Self {
        ColumnSpec::Text(text.to_string())
    }
}

impl From<String> for ColumnSpec {
    fn from(text: String) -> Self {
        ColumnSpec::Text(text)
    }
}

impl From<Expr> for ColumnSpec {
    fn from(expr: Expr) -> Self {
        ColumnSpec::Parsed(expr)
    }
}

/// Per-call arguments that travel beside the action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteOptions {
    /// Projection specs, required for `Select`
    pub columns: Vec<ColumnSpec>,
    /// Column specification, required for `Max`/`Min`/`Sum`/`Avg`
    pub column: Option<String>,
}

impl ExecuteOptions {
    /// Options for a projection
    pub fn columns<I, S>(specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ColumnSpec>,
    {
        Self {
            columns: specs.into_iter().map(Into::into).collect(),
            column: None,
        }
    }

    /// Options for a column aggregate
    pub fn column(spec: impl Into<String>) -> Self {
        Self {
            columns: Vec::new(),
            column: Some(spec.into()),
        }
    }
}

/// What an execution produced
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Filtered/sorted elements
    Items(Vec<Value>),
    /// A re-materialized mapping (map provider only)
    Mapping(Map<String, Value>),
    /// Group-key → members, in first-occurrence order
    Grouped(GroupedItems),
    /// Fixed-schema projection rows
    Records(Vec<Record>),
    /// An aggregate scalar
    Scalar(Value),
}

impl QueryResult {
    /// The element sequence, if that is what was produced
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            QueryResult::Items(items) => Some(items),
            _ => None,
        }
    }

    /// The mapping, if that is what was produced
    pub fn mapping(&self) -> Option<&Map<String, Value>> {
        match self {
            QueryResult::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// The group mapping, if that is what was produced
    pub fn grouped(&self) -> Option<&GroupedItems> {
        match self {
            QueryResult::Grouped(groups) => Some(groups),
            _ => None,
        }
    }

    /// The projection rows, if that is what was produced
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            QueryResult::Records(records) => Some(records),
            _ => None,
        }
    }

    /// The aggregate scalar, if that is what was produced
    pub fn scalar(&self) -> Option<&Value> {
        match self {
            QueryResult::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

/// Executes queries against an in-memory sequence
#[derive(Debug, Clone)]
pub struct CollectionProvider {
    items: Vec<Value>,
}

impl CollectionProvider {
    /// Creates a provider over the given elements
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    /// Executes `query` with a typed action.
    pub fn execute(
        &self,
        query: &Query,
        action: Action,
        options: &ExecuteOptions,
    ) -> EngineResult<QueryResult> {
        debug!(
            action = action.as_str(),
            filters = query.filters.len(),
            ordered = !query.order.is_empty(),
            grouped = query.group.is_some(),
            "executing query"
        );

        match action {
            Action::SelectMany => self.select_many(query),
            Action::Select => self.select(query, options),
            Action::Count => self.count(query),
            Action::Max | Action::Min | Action::Sum | Action::Avg => {
                self.aggregate(query, action, options)
            }
        }
    }

    /// Executes `query` with a textual action token; unknown tokens
    /// fail with `InvalidAction`.
    pub fn execute_raw(
        &self,
        query: &Query,
        action: &str,
        options: &ExecuteOptions,
    ) -> EngineResult<QueryResult> {
        self.execute(query, parse_action(action)?, options)
    }

    /// Filter passes, then the stable multi-key sort.
    fn select_items(&self, query: &Query) -> EngineResult<Vec<Value>> {
        let mut items = FilterStage::apply_all(self.items.clone(), &query.filters)?;
        trace!(kept = items.len(), "filters applied");
        SortStage::sort(&mut items, &query.order)?;
        Ok(items)
    }

    fn select_many(&self, query: &Query) -> EngineResult<QueryResult> {
        let items = self.select_items(query)?;
        match &query.group {
            Some(key) => Ok(QueryResult::Grouped(GroupStage::group(items, key)?)),
            None => Ok(QueryResult::Items(items)),
        }
    }

    fn select(&self, query: &Query, options: &ExecuteOptions) -> EngineResult<QueryResult> {
        let specs = options
            .columns
            .iter()
            .map(|spec| match spec {
                ColumnSpec::Parsed(expr) => Ok(expr.clone()),
                ColumnSpec::Text(text) => parse_column_spec(text),
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let items = self.select_items(query)?;
        let records = ProjectStage::project(&items, &specs)?;

        match &query.group {
            Some(key) => {
                let rows = records.into_iter().map(Record::into_value).collect();
                Ok(QueryResult::Grouped(GroupStage::group(rows, key)?))
            }
            None => Ok(QueryResult::Records(records)),
        }
    }

    /// Count measures whatever the grouped-or-ungrouped SelectMany
    /// returns: elements, or groups when a group key is present.
    fn count(&self, query: &Query) -> EngineResult<QueryResult> {
        let counted = match self.select_many(query)? {
            QueryResult::Grouped(groups) => groups.len(),
            QueryResult::Items(items) => items.len(),
            _ => 0,
        };
        Ok(QueryResult::Scalar(Value::from(counted as u64)))
    }

    fn aggregate(
        &self,
        query: &Query,
        action: Action,
        options: &ExecuteOptions,
    ) -> EngineResult<QueryResult> {
        let command = action.as_str();
        let items = self.select_items(query)?;

        // The empty sequence aggregates to 0 before the column is
        // looked at.
        if items.is_empty() {
            return Ok(QueryResult::Scalar(Value::from(0)));
        }

        let column = options.column.as_deref().unwrap_or("");
        let values = AggregateStage::resolve_column(&items, column, command)?;

        let scalar = match action {
            Action::Max => AggregateStage::max(&values)?,
            Action::Min => AggregateStage::min(&values)?,
            Action::Sum => AggregateStage::sum(&values)?,
            Action::Avg => AggregateStage::avg(&values)?,
            _ => unreachable!("only column aggregates reach here"),
        };
        Ok(QueryResult::Scalar(scalar))
    }
}

/// The engine's minimal column parser: `item` and `item.<path>` forms.
/// Free-form expressions are the external parser's job and arrive as
/// `ColumnSpec::Parsed`.
fn parse_column_spec(text: &str) -> EngineResult<Expr> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EngineError::attribute_required("select"));
    }
    if let Some(rest) = trimmed.strip_prefix("item.") {
        return Ok(Expr::attr(rest));
    }
    if trimmed.eq_ignore_ascii_case("item") {
        return Ok(Expr::Item);
    }
    Err(EngineError::attribute_not_found(trimmed, "select"))
}

/// Executes queries against a key-value mapping
#[derive(Debug, Clone)]
pub struct MapProvider {
    entries: Map<String, Value>,
}

impl MapProvider {
    /// Creates a provider over the given mapping
    pub fn new(entries: Map<String, Value>) -> Self {
        Self { entries }
    }

    /// Executes `query` with a typed action.
    pub fn execute(
        &self,
        query: &Query,
        action: Action,
        options: &ExecuteOptions,
    ) -> EngineResult<QueryResult> {
        let records = self
            .entries
            .iter()
            .map(|(key, value)| json!({"key": key, "value": value}))
            .collect();

        let result = CollectionProvider::new(records).execute(query, action, options)?;
        Ok(match result {
            QueryResult::Items(items) => QueryResult::Mapping(Self::rebuild(items)),
            other => other,
        })
    }

    /// Executes `query` with a textual action token.
    pub fn execute_raw(
        &self,
        query: &Query,
        action: &str,
        options: &ExecuteOptions,
    ) -> EngineResult<QueryResult> {
        self.execute(query, parse_action(action)?, options)
    }

    /// Re-materializes surviving `{"key", "value"}` records into a
    /// mapping keyed by the original keys.
    fn rebuild(items: Vec<Value>) -> Map<String, Value> {
        let mut entries = Map::new();
        for item in items {
            if let (Some(key), Some(value)) = (
                item.get("key").and_then(Value::as_str).map(str::to_string),
                item.get("value"),
            ) {
                entries.insert(key, value.clone());
            }
        }
        entries
    }
}

impl From<Map<String, Value>> for MapProvider {
    fn from(entries: Map<String, Value>) -> Self {
        Self::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mapping(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_parse_action_known_tokens() {
        assert_eq!(parse_action("select_many").unwrap(), Action::SelectMany);
        assert_eq!(parse_action("avg").unwrap(), Action::Avg);
    }

    #[test]
    fn test_parse_action_unknown_token_message() {
        let err = parse_action("foo").unwrap_err();
        assert_eq!(err.to_string(), "Invalid action exception. foo is unknown.");
    }

    #[test]
    fn test_select_many_filters_and_sorts() {
        let provider = CollectionProvider::new(vec![json!(12), json!(2), json!(11)]);
        let query = Query::new()
            .with_filter(Expr::gt(Expr::item(), Expr::lit(10)))
            .order_by(Expr::item());

        let result = provider
            .execute(&query, Action::SelectMany, &ExecuteOptions::default())
            .unwrap();
        assert_eq!(result.items().unwrap(), [json!(11), json!(12)]);
    }

    #[test]
    fn test_select_many_groups_when_key_present() {
        let provider = CollectionProvider::new(vec![
            json!({"city": "A", "n": 1}),
            json!({"city": "B", "n": 2}),
            json!({"city": "A", "n": 3}),
        ]);
        let query = Query::new().group_by(Expr::attr("city"));

        let result = provider
            .execute(&query, Action::SelectMany, &ExecuteOptions::default())
            .unwrap();
        let groups = result.grouped().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get(&json!("A")).unwrap().len(), 2);
    }

    #[test]
    fn test_select_projects_records() {
        let provider = CollectionProvider::new(vec![
            json!({"name": "alice", "age": 25}),
            json!({"name": "bob", "age": 30}),
        ]);
        let query = Query::new();
        let options = ExecuteOptions::columns(["item.name", "item.age"]);

        let result = provider.execute(&query, Action::Select, &options).unwrap();
        let records = result.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&json!("alice")));
        assert_eq!(records[1].get("age"), Some(&json!(30)));
    }

    #[test]
    fn test_select_accepts_parsed_expressions() {
        let provider = CollectionProvider::new(vec![json!({"age": 25})]);
        let query = Query::new();
        let options = ExecuteOptions::columns([
            ColumnSpec::from("item.age"),
            ColumnSpec::from(Expr::add(Expr::attr("age"), Expr::lit(1))),
        ]);

        let result = provider.execute(&query, Action::Select, &options).unwrap();
        let records = result.records().unwrap();
        assert_eq!(records[0].get("age"), Some(&json!(25)));
        assert_eq!(records[0].get("dynamic_1"), Some(&json!(26)));
    }

    #[test]
    fn test_select_rejects_unknown_bare_column() {
        let provider = CollectionProvider::new(vec![json!({"age": 25})]);
        let query = Query::new();
        let options = ExecuteOptions::columns(["age"]);

        let err = provider
            .execute(&query, Action::Select, &options)
            .unwrap_err();
        assert_eq!(err, EngineError::attribute_not_found("age", "select"));
    }

    #[test]
    fn test_count_counts_elements() {
        let provider = CollectionProvider::new(vec![json!(1), json!(2), json!(10)]);
        let query = Query::new().with_filter(Expr::le(Expr::item(), Expr::lit(3)));

        let result = provider
            .execute(&query, Action::Count, &ExecuteOptions::default())
            .unwrap();
        assert_eq!(result.scalar(), Some(&json!(2)));
    }

    #[test]
    fn test_count_counts_groups_when_grouped() {
        let provider = CollectionProvider::new(vec![
            json!({"city": "A"}),
            json!({"city": "B"}),
            json!({"city": "A"}),
        ]);
        let query = Query::new().group_by(Expr::attr("city"));

        let result = provider
            .execute(&query, Action::Count, &ExecuteOptions::default())
            .unwrap();
        assert_eq!(result.scalar(), Some(&json!(2)));
    }

    #[test]
    fn test_aggregates_over_raw_items() {
        let provider = CollectionProvider::new(vec![json!(3), json!(1), json!(2)]);
        let query = Query::new();

        let max = provider
            .execute(&query, Action::Max, &ExecuteOptions::column("item"))
            .unwrap();
        assert_eq!(max.scalar(), Some(&json!(3)));

        let sum = provider
            .execute(&query, Action::Sum, &ExecuteOptions::column("item"))
            .unwrap();
        assert_eq!(sum.scalar(), Some(&json!(6)));

        let avg = provider
            .execute(&query, Action::Avg, &ExecuteOptions::column("item"))
            .unwrap();
        assert_eq!(avg.scalar(), Some(&json!(2)));
    }

    #[test]
    fn test_aggregates_over_attribute_column() {
        let provider = CollectionProvider::new(vec![
            json!({"price": 10}),
            json!({"price": 30}),
            json!({"price": 20}),
        ]);
        let query = Query::new();

        let min = provider
            .execute(&query, Action::Min, &ExecuteOptions::column("item.price"))
            .unwrap();
        assert_eq!(min.scalar(), Some(&json!(10)));
    }

    #[test]
    fn test_empty_sequence_aggregates_to_zero() {
        let provider = CollectionProvider::new(vec![json!(1)]);
        let query = Query::new().with_filter(Expr::gt(Expr::item(), Expr::lit(100)));

        for action in [Action::Count, Action::Max, Action::Min, Action::Sum, Action::Avg] {
            let result = provider
                .execute(&query, action, &ExecuteOptions::column("item"))
                .unwrap();
            assert_eq!(result.scalar(), Some(&json!(0)), "{}", action.as_str());
        }
    }

    #[test]
    fn test_empty_sequence_wins_over_blank_column() {
        let provider = CollectionProvider::new(Vec::new());
        let query = Query::new();

        let result = provider
            .execute(&query, Action::Sum, &ExecuteOptions::default())
            .unwrap();
        assert_eq!(result.scalar(), Some(&json!(0)));
    }

    #[test]
    fn test_missing_column_on_nonempty_input_is_required() {
        let provider = CollectionProvider::new(vec![json!(1)]);
        let query = Query::new();

        let err = provider
            .execute(&query, Action::Sum, &ExecuteOptions::default())
            .unwrap_err();
        assert_eq!(err, EngineError::attribute_required("sum"));
    }

    #[test]
    fn test_map_provider_rematerializes_mapping() {
        let provider = MapProvider::new(mapping(&[
            ("one", json!(1)),
            ("two", json!(2)),
            ("eleven", json!(11)),
        ]));
        let query = Query::new().with_filter(Expr::le(Expr::attr("value"), Expr::lit(3)));

        let result = provider
            .execute(&query, Action::SelectMany, &ExecuteOptions::default())
            .unwrap();
        assert_eq!(
            result.mapping().unwrap(),
            &mapping(&[("one", json!(1)), ("two", json!(2))])
        );
    }

    #[test]
    fn test_map_provider_scalar_passes_through() {
        let provider = MapProvider::new(mapping(&[("a", json!(1)), ("b", json!(2))]));
        let query = Query::new();

        let result = provider
            .execute(&query, Action::Sum, &ExecuteOptions::column("item.value"))
            .unwrap();
        assert_eq!(result.scalar(), Some(&json!(3)));
    }

    #[test]
    fn test_providers_share_no_call_state() {
        // Two executions with different orderings against one provider
        // must not observe each other.
        let provider = CollectionProvider::new(vec![
            json!({"a": 1, "b": 2}),
            json!({"a": 2, "b": 1}),
        ]);
        let asc = Query::new().order_by(Expr::attr("a"));
        let desc = Query::new().order_by(Expr::neg(Expr::attr("a")));

        let first = provider
            .execute(&asc, Action::SelectMany, &ExecuteOptions::default())
            .unwrap();
        let second = provider
            .execute(&desc, Action::SelectMany, &ExecuteOptions::default())
            .unwrap();
        let third = provider
            .execute(&asc, Action::SelectMany, &ExecuteOptions::default())
            .unwrap();

        assert_eq!(first, third);
        assert_ne!(first, second);
    }
}
