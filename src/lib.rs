//! rinq - a strict, deterministic LINQ-style query engine for
//! in-memory collections and mappings
//!
//! A query bundles filter predicates, an optional multi-key ordering,
//! an optional group key and optional projection or aggregate requests;
//! a provider interprets it against a concrete source and produces a
//! sequence, a group mapping, projected records or a scalar.

pub mod executor;
pub mod expr;
pub mod query;
