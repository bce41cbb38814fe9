// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! The per-table coordinator of writes, scans and index maintenance.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use super::column_segment::{TableColumns, NULL_STRING_HANDLE};
use super::constraints::{
    create_mock_chunk, verify_append_constraints, verify_update_constraints,
};
use super::error::{StorageResult, TracedStorageError};
use super::index::IndexRef;
use super::scan::{IndexTableScanState, TableScanState};
use super::segment_tree::SegmentTree;
use super::statistics::ColumnStatistics;
use super::version_chunk::VersionChunk;
use super::STORAGE_CHUNK_SIZE;
use crate::array::{Array, ArrayBuilderImpl, ArrayImpl, DataChunk};
use crate::catalog::TableCatalogRef;
use crate::transaction::{Transaction, VersionArena, VersionOp};
use crate::types::{ColumnId, RowId};

/// A table stored as column segments grouped into version chunks.
///
/// Writers funnel through [`append`](Self::append), [`delete`](Self::delete)
/// and [`update`](Self::update); readers walk the row-wise segment tree with
/// snapshot visibility. The table is safe to share across threads.
pub struct DataTable {
    info: TableCatalogRef,
    columns: Arc<TableColumns>,
    /// The row-wise tree of version chunks.
    storage_tree: SegmentTree<VersionChunk>,
    indexes: RwLock<Vec<IndexRef>>,
    statistics: Vec<Mutex<ColumnStatistics>>,
    arena: Arc<VersionArena>,
}

impl DataTable {
    /// Create an empty table: one empty segment per column and one empty
    /// version chunk at row id 0.
    pub fn new(info: TableCatalogRef, arena: Arc<VersionArena>) -> Self {
        let columns = Arc::new(TableColumns::new(info.types()));
        let statistics = (0..info.column_count())
            .map(|_| Mutex::new(ColumnStatistics::default()))
            .collect();
        let table = DataTable {
            info,
            columns,
            storage_tree: SegmentTree::new(),
            indexes: RwLock::new(Vec::new()),
            statistics,
            arena,
        };
        table.append_version_chunk(0);
        table
    }

    pub fn info(&self) -> &TableCatalogRef {
        &self.info
    }

    /// Register a secondary index. Existing rows are loaded through
    /// [`create_index_scan`](Self::create_index_scan) by the caller.
    pub fn add_index(&self, index: IndexRef) {
        self.indexes.write().push(index);
    }

    /// A snapshot of the column's statistics.
    pub fn statistics(&self, col: ColumnId) -> ColumnStatistics {
        self.statistics[col as usize].lock().clone()
    }

    /// The number of row ids handed out so far, including deleted and
    /// rolled-back rows (row-id space is never reclaimed).
    pub fn cardinality(&self) -> usize {
        let (_, last) = self.storage_tree.last_segment();
        (last.start() + last.count() as RowId) as usize
    }

    /// The `(start, count)` layout of the version chunks.
    #[cfg(test)]
    pub(crate) fn chunk_layout(&self) -> Vec<(RowId, usize)> {
        (0..self.storage_tree.len())
            .filter_map(|i| self.storage_tree.get(i))
            .map(|chunk| (chunk.start(), chunk.count()))
            .collect()
    }

    fn append_version_chunk(&self, start: RowId) -> Arc<VersionChunk> {
        let chunk = Arc::new(VersionChunk::new(
            start,
            self.columns.clone(),
            self.arena.clone(),
        ));
        self.storage_tree.append_segment(start, chunk.clone());
        chunk
    }

    fn get_chunk(&self, row: RowId) -> Arc<VersionChunk> {
        self.storage_tree.get_segment(row).1
    }

    fn verify_chunk_shape(&self, chunk: &DataChunk) {
        for (array, ty) in chunk.arrays().iter().zip(self.info.types()) {
            assert_eq!(
                array.data_type_kind(),
                ty.kind(),
                "mismatched column type in chunk"
            );
        }
    }

    /// Intern the chunk's strings, producing per-column handle vectors for
    /// the storage copy. Runs before the append latch is taken.
    fn stage_strings(&self, chunk: &DataChunk) -> Vec<Option<Vec<u64>>> {
        chunk
            .arrays()
            .iter()
            .map(|array| match array {
                ArrayImpl::Utf8(a) => Some(
                    a.iter()
                        .map(|v| match v {
                            Some(s) => self.columns.heap().insert(s),
                            None => NULL_STRING_HANDLE,
                        })
                        .collect(),
                ),
                _ => None,
            })
            .collect()
    }

    /// Append the chunk's rows to every index, undoing the partial work if
    /// one of them rejects the rows.
    fn append_to_indexes(&self, chunk: &DataChunk, row_start: RowId) -> StorageResult<()> {
        let indexes = self.indexes.read();
        if indexes.is_empty() {
            return Ok(());
        }
        let row_ids: Vec<RowId> = (row_start..row_start + chunk.cardinality() as RowId).collect();
        let mut failed_index = None;
        for (i, index) in indexes.iter().enumerate() {
            if !index.append(chunk, &row_ids) {
                failed_index = Some(i);
                break;
            }
        }
        if let Some(failed) = failed_index {
            // constraint violation: remove the entries accepted so far
            for index in &indexes[..failed] {
                index.delete(chunk, &row_ids);
            }
            return Err(TracedStorageError::constraint(
                "PRIMARY KEY or UNIQUE constraint violated: duplicated key",
            ));
        }
        Ok(())
    }

    /// Mirror an update into the indexes affected by `column_ids`, undoing
    /// the partial work if one of them rejects the new keys.
    fn update_indexes(
        &self,
        column_ids: &[ColumnId],
        updates: &DataChunk,
        row_ids: &[RowId],
    ) -> StorageResult<()> {
        let indexes = self.indexes.read();
        if indexes.is_empty() {
            return Ok(());
        }
        let mock_chunk = create_mock_chunk(&self.info, column_ids, updates);
        let mut failed_index = None;
        for (i, index) in indexes.iter().enumerate() {
            if !index.index_is_updated(column_ids) {
                continue;
            }
            if !index.append(&mock_chunk, row_ids) {
                failed_index = Some(i);
                break;
            }
        }
        if let Some(failed) = failed_index {
            for index in &indexes[..failed] {
                if index.index_is_updated(column_ids) {
                    index.delete(&mock_chunk, row_ids);
                }
            }
            return Err(TracedStorageError::constraint(
                "PRIMARY KEY or UNIQUE constraint violated: duplicated key",
            ));
        }
        Ok(())
    }

    /// Append a chunk of rows, assigning them dense monotone row ids.
    pub fn append(&self, txn: &mut Transaction, chunk: DataChunk) -> StorageResult<()> {
        if chunk.cardinality() == 0 {
            return Ok(());
        }
        if chunk.column_count() != self.info.column_count() {
            return Err(TracedStorageError::catalog(
                "mismatch in column count for append",
            ));
        }
        self.verify_chunk_shape(&chunk);

        // verify any constraints on the new chunk
        verify_append_constraints(&self.info, &chunk)?;

        // move variable-length payloads into the heap
        let handles = self.stage_strings(&chunk);

        // ready to append: take the append latch, i.e. the tree's node lock
        // plus an exclusive lock on the tail chunk
        let _latch = self.storage_tree.lock_node();
        let (_, mut last_chunk) = self.storage_tree.last_segment();
        let mut chunk_data = last_chunk.data().write();

        let row_start = last_chunk.start() + chunk_data.count as RowId;

        // index appends go first: they may fail on unique conflicts, and at
        // this point nothing has been mutated yet
        self.append_to_indexes(&chunk, row_start)?;

        // update the statistics with the new data
        for (i, array) in chunk.arrays().iter().enumerate() {
            self.statistics[i].lock().update(array);
        }

        trace!(
            table = self.info.name(),
            row_start,
            rows = chunk.cardinality(),
            "append"
        );

        let mut remainder = chunk.cardinality();
        let mut offset = 0;
        loop {
            let to_copy = (STORAGE_CHUNK_SIZE - chunk_data.count).min(remainder);
            if to_copy > 0 {
                // push the undo entries for the freshly inserted rows first
                VersionChunk::push_deleted_entries(&last_chunk, txn, &mut chunk_data, to_copy);
                // now insert the elements into the column segments
                for (i, array) in chunk.arrays().iter().enumerate() {
                    self.columns
                        .append_vector(i, array, handles[i].as_deref(), offset, to_copy);
                }
                chunk_data.count += to_copy;
                offset += to_copy;
                remainder -= to_copy;
            }
            if remainder == 0 {
                break;
            }
            // the tail chunk is full: allocate the next one
            let next_start = last_chunk.start() + chunk_data.count as RowId;
            drop(chunk_data);
            last_chunk = self.append_version_chunk(next_start);
            chunk_data = last_chunk.data().write();
        }
        Ok(())
    }

    /// Delete the rows with the given ids.
    ///
    /// All row ids must belong to one version chunk; the caller partitions
    /// larger batches.
    pub fn delete(&self, txn: &mut Transaction, row_ids: &[RowId]) -> StorageResult<()> {
        if row_ids.is_empty() {
            return Ok(());
        }
        let chunk = self.get_chunk(row_ids[0]);
        let mut data = chunk.data().write();

        // check the whole batch for conflicts before producing any undo
        // record, so a failed statement leaves the transaction untouched
        for &id in row_ids {
            let offset = self.row_offset_in(&chunk, id, data.count);
            if let Some(node) = chunk.get_version_info(&data, offset) {
                if txn.has_conflict(self.arena.get(node).version_number()) {
                    return Err(TracedStorageError::conflict("tuple deletion"));
                }
            }
        }

        trace!(table = self.info.name(), rows = row_ids.len(), "delete");
        for &id in row_ids {
            let offset = (id - chunk.start()) as usize;
            // move the current tuple data into the undo buffer
            VersionChunk::push_tuple(&chunk, txn, VersionOp::Delete, &mut data, offset);
            // and set the deleted flag
            chunk.set_deleted(&mut data, offset);
        }
        Ok(())
    }

    /// Update `column_ids` of the rows with the given ids to the values of
    /// `updates` (one column per entry of `column_ids`, in that order).
    pub fn update(
        &self,
        txn: &mut Transaction,
        row_ids: &[RowId],
        column_ids: &[ColumnId],
        updates: &DataChunk,
    ) -> StorageResult<()> {
        if row_ids.is_empty() {
            return Ok(());
        }
        assert_eq!(updates.column_count(), column_ids.len());
        assert_eq!(updates.cardinality(), row_ids.len());

        // first verify that no constraints are violated
        verify_update_constraints(&self.info, updates, column_ids)?;

        // move strings to the heap before entering the critical section
        let handles = self.stage_strings(updates);

        let chunk = self.get_chunk(row_ids[0]);
        let mut data = chunk.data().write();

        // check ALL tuples for conflicts before inserting anything into the
        // undo buffer, so a conflicting batch rolls back cleanly
        for &id in row_ids {
            let offset = self.row_offset_in(&chunk, id, data.count);
            if let Some(node) = chunk.get_version_info(&data, offset) {
                if txn.has_conflict(self.arena.get(node).version_number()) {
                    return Err(TracedStorageError::conflict("tuple update"));
                }
            }
        }

        // index maintenance next; it may fail, and the base table is still
        // untouched at this point
        self.update_indexes(column_ids, updates, row_ids)?;

        trace!(table = self.info.name(), rows = row_ids.len(), "update");
        // no conflicts: move the tuples into the undo buffer
        for &id in row_ids {
            let offset = (id - chunk.start()) as usize;
            VersionChunk::push_tuple(&chunk, txn, VersionOp::Update, &mut data, offset);
        }

        // now update the columns in the base table
        for (i, &col) in column_ids.iter().enumerate() {
            let array = updates.array_at(i);
            for (k, &id) in row_ids.iter().enumerate() {
                self.columns
                    .write_row_value(col as usize, id, array, handles[i].as_deref(), k);
            }
            self.statistics[col as usize].lock().update(array);
        }
        Ok(())
    }

    fn row_offset_in(&self, chunk: &VersionChunk, id: RowId, count: usize) -> usize {
        let offset = id
            .checked_sub(chunk.start())
            .expect("row ids must belong to one version chunk") as usize;
        assert!(offset < count, "row ids must belong to one version chunk");
        offset
    }

    /// Capture the extent of the table for a snapshot scan.
    pub fn initialize_scan(&self) -> TableScanState {
        let root = self.storage_tree.root_segment();
        let (_, last_chunk) = self.storage_tree.last_segment();
        let last_chunk_count = last_chunk.count();
        let columns = root.pointers().to_vec();
        TableScanState {
            chunk: Some(root),
            chunk_index: 0,
            last_chunk,
            last_chunk_count,
            columns,
            offset: 0,
        }
    }

    /// Produce the next vector of rows visible to `txn`, or `None` when the
    /// scan is drained. Repeated calls never return a row twice.
    pub fn scan(
        &self,
        txn: &Transaction,
        column_ids: &[ColumnId],
        state: &mut TableScanState,
    ) -> Option<DataChunk> {
        while let Some(current_chunk) = state.chunk.clone() {
            let (result, is_last_segment) = current_chunk.scan(state, txn, column_ids);
            if is_last_segment {
                if Arc::ptr_eq(&current_chunk, &state.last_chunk) {
                    // the snapshot ends here
                    state.chunk = None;
                } else {
                    state.offset = 0;
                    state.chunk_index += 1;
                    let next = self
                        .storage_tree
                        .get(state.chunk_index)
                        .expect("chunk list ended before the snapshot's last chunk");
                    state.columns = next.pointers().to_vec();
                    state.chunk = Some(next);
                }
            } else {
                state.offset += 1;
            }
            if let Some(result) = result {
                return Some(result);
            }
        }
        None
    }

    /// Materialize the visible images of the given rows.
    pub fn fetch(
        &self,
        txn: &Transaction,
        column_ids: &[ColumnId],
        row_ids: &[RowId],
    ) -> DataChunk {
        let types = self.info.types();
        let mut builders: Vec<ArrayBuilderImpl> = column_ids
            .iter()
            .map(|&col| ArrayBuilderImpl::with_capacity(row_ids.len(), &types[col as usize]))
            .collect();
        // sort the row ids so ids of one chunk group together, minimizing
        // lock churn
        let mut sorted = row_ids.to_vec();
        sorted.sort_unstable();
        for id in sorted {
            let chunk = self.get_chunk(id);
            let data = chunk.data().read();
            let offset = self.row_offset_in(&chunk, id, data.count);
            chunk.retrieve_tuple_data(txn, &data, &mut builders, column_ids, offset);
        }
        builders.into_iter().map(|b| b.finish()).collect()
    }

    /// Start an index-build scan over the whole table.
    pub fn initialize_index_scan(&self) -> IndexTableScanState {
        IndexTableScanState {
            base: self.initialize_scan(),
            version_offset: 0,
            version_chain: None,
        }
    }

    /// Produce the next vector of rows for index bootstrap: all committed
    /// and in-progress insertions, plus every stored version image.
    pub fn create_index_scan(
        &self,
        column_ids: &[ColumnId],
        state: &mut IndexTableScanState,
    ) -> Option<DataChunk> {
        while let Some(current_chunk) = state.base.chunk.clone() {
            let (result, exhausted) = current_chunk.create_index_scan(state, column_ids);
            if exhausted {
                state.base.chunk_index += 1;
                state.base.chunk = self.storage_tree.get(state.base.chunk_index);
                state.base.offset = 0;
                state.version_offset = 0;
                state.version_chain = None;
            }
            if let Some(result) = result {
                return Some(result);
            }
        }
        None
    }
}
