// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! Version chunks: the row-wise unit of locking and version tracking.

use std::sync::Arc;

use bitvec::vec::BitVec;
use parking_lot::RwLock;

use super::column_segment::{ColumnPointer, TableColumns};
use super::scan::{IndexTableScanState, TableScanState};
use super::VECTOR_SIZE;
use crate::array::{ArrayBuilderImpl, ArrayImpl, DataChunk};
use crate::transaction::{Transaction, VersionArena, VersionNode, VersionNodeId, VersionOp};
use crate::types::{ColumnId, DataValue, RowId};

/// The mutable state of a chunk, guarded by the chunk's reader/writer lock.
///
/// Writers hold the write guard for the duration of one statement's work on
/// the chunk; readers hold the read guard per scan stride or fetched row.
pub(crate) struct ChunkData {
    /// Number of rows in the chunk. Never exceeds `STORAGE_CHUNK_SIZE`.
    pub count: usize,
    /// Head of the version chain per row, if any.
    pub version_slots: Vec<Option<VersionNodeId>>,
    pub deleted: BitVec,
}

/// How one row resolves for a reader.
enum RowVersion {
    /// The base table data is the visible image.
    Base,
    /// The pre-image stored in this node is the visible image.
    Image(Arc<VersionNode>),
    /// No image is visible: deleted, or not yet inserted for this reader.
    Invisible,
}

/// A horizontal slab of up to `STORAGE_CHUNK_SIZE` rows spanning all columns.
///
/// The chunk owns per-row version slots and the deleted bitmap; the column
/// bytes live in the per-column segment arenas, reached through the chunk's
/// back-reference and pinned by the column pointers captured at creation.
pub struct VersionChunk {
    start: RowId,
    columns: Arc<TableColumns>,
    arena: Arc<VersionArena>,
    /// Where this chunk's rows begin in each column's segment arena.
    pointers: Vec<ColumnPointer>,
    data: RwLock<ChunkData>,
}

impl VersionChunk {
    pub(crate) fn new(start: RowId, columns: Arc<TableColumns>, arena: Arc<VersionArena>) -> Self {
        let pointers = (0..columns.types().len())
            .map(|col| columns.tail_pointer(col))
            .collect();
        VersionChunk {
            start,
            columns,
            arena,
            pointers,
            data: RwLock::new(ChunkData {
                count: 0,
                version_slots: Vec::new(),
                deleted: BitVec::new(),
            }),
        }
    }

    pub fn start(&self) -> RowId {
        self.start
    }

    pub fn count(&self) -> usize {
        self.data.read().count
    }

    pub(crate) fn pointers(&self) -> &[ColumnPointer] {
        &self.pointers
    }

    pub(crate) fn data(&self) -> &RwLock<ChunkData> {
        &self.data
    }

    /// Reserve version slots for `count` freshly appended rows, chained into
    /// the transaction's undo buffer so that rollback marks them deleted.
    pub(crate) fn push_deleted_entries(
        this: &Arc<Self>,
        txn: &mut Transaction,
        data: &mut ChunkData,
        count: usize,
    ) {
        for i in 0..count {
            let row_offset = data.count + i;
            let node = this
                .arena
                .alloc(txn.transaction_id(), VersionOp::Insert, None, None);
            data.version_slots.push(Some(node));
            data.deleted.push(false);
            debug_assert_eq!(data.version_slots.len(), row_offset + 1);
            txn.undo.push(this.clone(), row_offset, node);
        }
    }

    /// Copy the row's current image into the undo buffer and prepend the new
    /// version node to the row's chain.
    pub(crate) fn push_tuple(
        this: &Arc<Self>,
        txn: &mut Transaction,
        op: VersionOp,
        data: &mut ChunkData,
        row_offset: usize,
    ) {
        let row = this.start + row_offset as RowId;
        let image: Box<[DataValue]> = (0..this.columns.types().len())
            .map(|col| this.columns.read_value(col, row))
            .collect();
        let prev = data.version_slots[row_offset];
        let node = this
            .arena
            .alloc(txn.transaction_id(), op, Some(image), prev);
        data.version_slots[row_offset] = Some(node);
        txn.undo.push(this.clone(), row_offset, node);
    }

    pub(crate) fn set_deleted(&self, data: &mut ChunkData, row_offset: usize) {
        data.deleted.set(row_offset, true);
    }

    /// The head of the row's version chain, if any.
    pub(crate) fn get_version_info(
        &self,
        data: &ChunkData,
        row_offset: usize,
    ) -> Option<VersionNodeId> {
        data.version_slots.get(row_offset).copied().flatten()
    }

    /// Resolve which image of the row the transaction sees.
    ///
    /// Walk the chain newest-first past every write that is invisible to the
    /// reader. If the head itself is visible the base data is current; if the
    /// walk passed invisible writes, the pre-image of the oldest-passed one
    /// is the reader's image; an insert pre-image (`None`) means the row did
    /// not exist yet.
    fn resolve_version(
        &self,
        txn: &Transaction,
        data: &ChunkData,
        row_offset: usize,
    ) -> RowVersion {
        let mut current = self.get_version_info(data, row_offset);
        let mut newest_invisible: Option<Arc<VersionNode>> = None;
        while let Some(id) = current {
            let node = self.arena.get(id);
            if txn.use_version(node.version_number()) {
                break;
            }
            current = node.prev;
            newest_invisible = Some(node);
        }
        match newest_invisible {
            None => {
                if row_offset < data.deleted.len() && data.deleted[row_offset] {
                    RowVersion::Invisible
                } else {
                    RowVersion::Base
                }
            }
            Some(node) => {
                if node.data.is_some() {
                    RowVersion::Image(node)
                } else {
                    RowVersion::Invisible
                }
            }
        }
    }

    /// Produce the next stride of up to `VECTOR_SIZE` visible rows.
    ///
    /// Returns the materialized rows (or `None` if the whole stride was
    /// filtered out) and whether this was the chunk's last stride for the
    /// scanning snapshot.
    pub(crate) fn scan(
        &self,
        state: &mut TableScanState,
        txn: &Transaction,
        column_ids: &[ColumnId],
    ) -> (Option<DataChunk>, bool) {
        let data = self.data.read();
        let max_count = if std::ptr::eq(self, Arc::as_ptr(&state.last_chunk)) {
            state.last_chunk_count
        } else {
            data.count
        };
        let scan_start = state.offset * VECTOR_SIZE;
        if scan_start >= max_count {
            return (None, true);
        }
        let n = VECTOR_SIZE.min(max_count - scan_start);
        let is_last_segment = scan_start + n >= max_count;

        // bulk-read the stride through the per-column cursors
        let types = self.columns.types();
        let mut builders: Vec<ArrayBuilderImpl> = column_ids
            .iter()
            .map(|&col| ArrayBuilderImpl::with_capacity(n, &types[col as usize]))
            .collect();
        for (builder, &col) in builders.iter_mut().zip(column_ids) {
            let cursor = &mut state.columns[col as usize];
            self.columns.read_range_at(col as usize, cursor, n, builder);
        }
        let base: Vec<ArrayImpl> = builders.into_iter().map(|b| b.finish()).collect();

        // reconcile the stride with the version chains
        enum RowSource {
            Base(usize),
            Image(Arc<VersionNode>),
        }
        let mut sources = Vec::with_capacity(n);
        let mut all_base = true;
        for i in 0..n {
            match self.resolve_version(txn, &data, scan_start + i) {
                RowVersion::Base => sources.push(RowSource::Base(i)),
                RowVersion::Image(node) => {
                    all_base = false;
                    sources.push(RowSource::Image(node));
                }
                RowVersion::Invisible => all_base = false,
            }
        }
        if all_base {
            return (Some(base.into_iter().collect()), is_last_segment);
        }
        if sources.is_empty() {
            return (None, is_last_segment);
        }
        let mut builders: Vec<ArrayBuilderImpl> = column_ids
            .iter()
            .map(|&col| ArrayBuilderImpl::with_capacity(sources.len(), &types[col as usize]))
            .collect();
        for source in sources {
            match source {
                RowSource::Base(i) => {
                    for (builder, array) in builders.iter_mut().zip(&base) {
                        builder.push(&array.get(i));
                    }
                }
                RowSource::Image(node) => {
                    let image = node.data.as_deref().expect("image without tuple data");
                    for (builder, &col) in builders.iter_mut().zip(column_ids) {
                        builder.push(&image[col as usize]);
                    }
                }
            }
        }
        let chunk = builders.into_iter().map(|b| b.finish()).collect();
        (Some(chunk), is_last_segment)
    }

    /// Materialize one row into the builders if it is visible to `txn`.
    pub(crate) fn retrieve_tuple_data(
        &self,
        txn: &Transaction,
        data: &ChunkData,
        builders: &mut [ArrayBuilderImpl],
        column_ids: &[ColumnId],
        row_offset: usize,
    ) {
        match self.resolve_version(txn, data, row_offset) {
            RowVersion::Base => {
                let row = self.start + row_offset as RowId;
                for (builder, &col) in builders.iter_mut().zip(column_ids) {
                    builder.push(&self.columns.read_value(col as usize, row));
                }
            }
            RowVersion::Image(node) => {
                let image = node.data.as_deref().expect("image without tuple data");
                for (builder, &col) in builders.iter_mut().zip(column_ids) {
                    builder.push(&image[col as usize]);
                }
            }
            RowVersion::Invisible => {}
        }
    }

    /// Produce rows for index bootstrap.
    ///
    /// Emits every stored version image first (so the index covers the
    /// pre-images reachable by older snapshots), then the base rows that are
    /// not deleted, committed and in-progress insertions alike. Returns the
    /// rows and whether the chunk is exhausted.
    pub(crate) fn create_index_scan(
        &self,
        state: &mut IndexTableScanState,
        column_ids: &[ColumnId],
    ) -> (Option<DataChunk>, bool) {
        let data = self.data.read();
        let types = self.columns.types();
        let mut builders: Vec<ArrayBuilderImpl> = column_ids
            .iter()
            .map(|&col| ArrayBuilderImpl::with_capacity(VECTOR_SIZE, &types[col as usize]))
            .collect();
        let mut emitted = 0;

        let finish = |builders: Vec<ArrayBuilderImpl>, emitted: usize| {
            (emitted > 0).then(|| builders.into_iter().map(|b| b.finish()).collect::<DataChunk>())
        };

        // phase 1: stored version images
        while state.version_offset < data.count {
            let row_offset = state.version_offset;
            // `version_chain` is only `Some` when resuming a partially
            // walked chain of this row.
            let mut chain = state
                .version_chain
                .take()
                .or_else(|| self.get_version_info(&data, row_offset));
            while let Some(id) = chain {
                let node = self.arena.get(id);
                chain = node.prev;
                if let Some(image) = node.data.as_deref() {
                    for (builder, &col) in builders.iter_mut().zip(column_ids) {
                        builder.push(&image[col as usize]);
                    }
                    emitted += 1;
                    if emitted >= VECTOR_SIZE {
                        if chain.is_some() {
                            state.version_chain = chain;
                        } else {
                            state.version_offset += 1;
                        }
                        return (finish(builders, emitted), false);
                    }
                }
            }
            state.version_offset += 1;
        }

        // phase 2: base rows, strided
        loop {
            let scan_start = state.base.offset * VECTOR_SIZE;
            if scan_start >= data.count {
                return (finish(builders, emitted), true);
            }
            let n = VECTOR_SIZE.min(data.count - scan_start);
            for i in 0..n {
                let row_offset = scan_start + i;
                if data.deleted[row_offset] {
                    continue;
                }
                let row = self.start + row_offset as RowId;
                for (builder, &col) in builders.iter_mut().zip(column_ids) {
                    builder.push(&self.columns.read_value(col as usize, row));
                }
                emitted += 1;
            }
            state.base.offset += 1;
            let exhausted = scan_start + n >= data.count;
            if exhausted || emitted > 0 {
                return (finish(builders, emitted), exhausted);
            }
        }
    }

    /// Undo one write of a rolled-back transaction.
    pub(crate) fn undo_write(&self, row_offset: usize, node: &VersionNode) {
        let mut data = self.data.write();
        match node.op {
            // a rolled-back insert stays allocated but is never visible
            VersionOp::Insert => data.deleted.set(row_offset, true),
            VersionOp::Delete => {
                data.version_slots[row_offset] = node.prev;
                data.deleted.set(row_offset, false);
            }
            VersionOp::Update => {
                let image = node.data.as_deref().expect("update undo without tuple data");
                let row = self.start + row_offset as RowId;
                for (col, value) in image.iter().enumerate() {
                    self.columns.restore_value(col, row, value);
                }
                data.version_slots[row_offset] = node.prev;
            }
        }
    }
}
