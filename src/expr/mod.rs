// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! The contract of the external expression evaluator.
//!
//! CHECK constraints are verified through a pre-bound expression supplied by
//! the host. The storage core treats it as a black box producing a
//! boolean-coded integer vector: a row passes unless its entry is a non-NULL
//! zero.

use thiserror::Error;

use crate::array::{DataChunk, I32Array};

/// An error raised while evaluating an expression.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ExprError(pub String);

/// A pre-bound expression over the columns of a table.
pub trait Expression: Send + Sync {
    /// Evaluate the expression over the chunk, producing one integer per row.
    fn execute(&self, chunk: &DataChunk) -> Result<I32Array, ExprError>;
}
