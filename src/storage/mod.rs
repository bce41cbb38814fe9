// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! The columnar, multi-versioned table storage core.
//!
//! A table stores tuples in per-column [`ColumnSegment`]s grouped row-wise
//! into [`VersionChunk`]s. Writers verify constraints, maintain the secondary
//! indexes, push pre-images into the transaction's undo buffer and mutate the
//! column segments under the chunk's exclusive lock; readers walk the chunk
//! list reconciling base data with the version chains of their snapshot.

mod column_segment;
mod constraints;
mod data_table;
mod error;
mod index;
mod scan;
mod segment_tree;
mod statistics;
mod string_heap;
mod version_chunk;

#[cfg(test)]
mod tests;

pub use self::column_segment::{ColumnPointer, ColumnSegment};
pub use self::data_table::DataTable;
pub use self::error::{StorageError, StorageResult, TracedStorageError};
pub use self::index::{Index, IndexRef};
pub use self::scan::{IndexTableScanState, TableScanState};
pub use self::segment_tree::{SegmentNode, SegmentTree};
pub use self::statistics::ColumnStatistics;
pub use self::string_heap::StringHeap;
pub use self::version_chunk::VersionChunk;

/// Capacity in bytes of one column segment.
pub const BLOCK_SIZE: usize = 16384;

/// Maximum number of rows in one version chunk.
pub const STORAGE_CHUNK_SIZE: usize = 1024;

/// Maximum number of rows a scan returns per call.
pub const VECTOR_SIZE: usize = 256;
