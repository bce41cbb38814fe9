// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;

use crate::array::DataChunk;
use crate::types::{ColumnId, RowId};

/// The capability the table core requires of a secondary index.
///
/// The core guarantees that a rejected [`append`](Index::append) is followed
/// by [`delete`](Index::delete) calls that undo the appends already accepted
/// by other indexes, so an index never observes a half-applied statement.
pub trait Index: Send + Sync {
    /// Insert the rows of `chunk` under the given row ids. Returns `false`
    /// when a uniqueness constraint inside the index rejects them.
    fn append(&self, chunk: &DataChunk, row_ids: &[RowId]) -> bool;

    /// Remove rows previously accepted by [`append`](Index::append).
    fn delete(&self, chunk: &DataChunk, row_ids: &[RowId]);

    /// Whether an update touching `column_ids` affects this index.
    fn index_is_updated(&self, column_ids: &[ColumnId]) -> bool;
}

pub type IndexRef = Arc<dyn Index>;
