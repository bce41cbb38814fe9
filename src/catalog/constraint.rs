// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

use std::collections::HashSet;
use std::sync::Arc;

use crate::expr::Expression;
use crate::types::ColumnId;

/// A table constraint bound to column positions.
pub enum BoundConstraint {
    /// The column may not contain NULL values.
    NotNull(ColumnId),
    /// The expression must not evaluate to false for any row.
    Check {
        expression: Arc<dyn Expression>,
        /// The columns referenced by the expression.
        columns: HashSet<ColumnId>,
    },
    /// The key columns may not contain duplicated values.
    Unique { keys: Vec<ColumnId> },
    /// Referential constraint. Rejected by the engine as unimplemented.
    ForeignKey,
}

impl std::fmt::Debug for BoundConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotNull(col) => f.debug_tuple("NotNull").field(col).finish(),
            Self::Check { columns, .. } => f.debug_struct("Check").field("columns", columns).finish(),
            Self::Unique { keys } => f.debug_struct("Unique").field("keys", keys).finish(),
            Self::ForeignKey => write!(f, "ForeignKey"),
        }
    }
}
