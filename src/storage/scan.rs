// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

use std::sync::Arc;

use super::column_segment::ColumnPointer;
use super::version_chunk::VersionChunk;
use crate::transaction::VersionNodeId;

/// Cursor state of a base-table scan.
///
/// The state captures the extent of the table at initialization: the last
/// chunk and its row count at that moment bound the scan, so rows appended
/// afterwards are never observed.
pub struct TableScanState {
    pub(crate) chunk: Option<Arc<VersionChunk>>,
    pub(crate) chunk_index: usize,
    pub(crate) last_chunk: Arc<VersionChunk>,
    pub(crate) last_chunk_count: usize,
    /// Per-column read cursors, positioned at the current chunk's rows.
    pub(crate) columns: Vec<ColumnPointer>,
    /// Stride within the current chunk, in units of `VECTOR_SIZE` rows.
    pub(crate) offset: usize,
}

/// Cursor state of an index-build scan: the base cursor plus the position of
/// the version-chain walk inside the current chunk.
pub struct IndexTableScanState {
    pub(crate) base: TableScanState,
    /// Row offset whose version chain is being walked.
    pub(crate) version_offset: usize,
    /// Next node of the partially walked chain, if the previous call filled
    /// its result mid-chain.
    pub(crate) version_chain: Option<VersionNodeId>,
}
