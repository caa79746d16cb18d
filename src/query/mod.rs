//! Query model
//!
//! A `Query` is the immutable bundle a front end accumulates and the
//! executor consumes: filter expressions (ANDed), ordering keys, an
//! optional group key. Projection columns and aggregate columns travel
//! separately, with the requested action, at execution time.

mod ast;

pub use ast::{Action, Query};
