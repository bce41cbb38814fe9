// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! Column segments and the per-column segment trees.

use std::sync::Arc;

use parking_lot::RwLock;

use super::segment_tree::SegmentTree;
use super::string_heap::StringHeap;
use super::BLOCK_SIZE;
use crate::array::{Array, ArrayBuilder, ArrayBuilderImpl, ArrayImpl};
use crate::types::{DataType, DataTypeKind, DataValue, RowId};

// NULL values are materialized in-band as type-specific sentinels, so a
// segment holds exactly `fixed_size` bytes per value.
const NULL_BOOL: u8 = u8::MAX;
const NULL_INT32: i32 = i32::MIN;
const NULL_INT64: i64 = i64::MIN;
const NULL_FLOAT64: f64 = f64::MIN;
pub(crate) const NULL_STRING_HANDLE: u64 = u64::MAX;

/// A position in a column's segment arena: the ordinal of the segment in the
/// column's tree and a byte offset within it.
///
/// Segments are never freed, so a pointer never dangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPointer {
    pub segment: usize,
    pub offset: usize,
}

/// A fixed-capacity buffer holding a contiguous run of one column's values.
pub struct ColumnSegment {
    start: RowId,
    ty: DataTypeKind,
    count: usize,
    /// Byte offset of the first free byte: always `count * fixed_size`.
    offset: usize,
    data: Box<[u8]>,
}

impl ColumnSegment {
    pub fn new(start: RowId, ty: DataTypeKind) -> Self {
        ColumnSegment {
            start,
            ty,
            count: 0,
            offset: 0,
            data: vec![0; BLOCK_SIZE].into_boxed_slice(),
        }
    }

    pub fn start(&self) -> RowId {
        self.start
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    fn type_size(&self) -> usize {
        self.ty.fixed_size()
    }

    /// Remaining capacity, in values.
    pub fn capacity_left(&self) -> usize {
        (BLOCK_SIZE - self.offset) / self.type_size()
    }

    /// Materialize one value of `array` into the given slot.
    fn encode(&mut self, elem: usize, array: &ArrayImpl, handles: Option<&[u64]>, idx: usize) {
        let size = self.type_size();
        let at = elem * size;
        match array {
            ArrayImpl::Bool(a) => {
                self.data[at] = match a.get(idx) {
                    Some(true) => 1,
                    Some(false) => 0,
                    None => NULL_BOOL,
                }
            }
            ArrayImpl::Int32(a) => {
                let v = a.get(idx).copied().unwrap_or(NULL_INT32);
                self.data[at..at + 4].copy_from_slice(&v.to_le_bytes());
            }
            ArrayImpl::Int64(a) => {
                let v = a.get(idx).copied().unwrap_or(NULL_INT64);
                self.data[at..at + 8].copy_from_slice(&v.to_le_bytes());
            }
            ArrayImpl::Float64(a) => {
                let v = a.get(idx).copied().unwrap_or(NULL_FLOAT64);
                self.data[at..at + 8].copy_from_slice(&v.to_le_bytes());
            }
            ArrayImpl::Utf8(_) => {
                let handle = handles.expect("string column without staged handles")[idx];
                self.data[at..at + 8].copy_from_slice(&handle.to_le_bytes());
            }
        }
    }

    /// Copy up to `count` values of `array[src_offset..]` into the free tail
    /// of the segment, converting NULLs to sentinels. Returns how many were
    /// copied.
    pub fn append_values(
        &mut self,
        array: &ArrayImpl,
        handles: Option<&[u64]>,
        src_offset: usize,
        count: usize,
    ) -> usize {
        let n = count.min(self.capacity_left());
        for i in 0..n {
            self.encode(self.count + i, array, handles, src_offset + i);
        }
        self.count += n;
        self.offset += n * self.type_size();
        n
    }

    /// Overwrite one slot with a value of the staged update vector.
    pub fn write_row(&mut self, elem: usize, array: &ArrayImpl, handles: Option<&[u64]>, idx: usize) {
        assert!(elem < self.count);
        self.encode(elem, array, handles, idx);
    }

    /// Overwrite one slot with a plain value (undo restore path).
    pub fn write_value(&mut self, elem: usize, value: &DataValue, heap: &StringHeap) {
        assert!(elem < self.count);
        let size = self.type_size();
        let at = elem * size;
        match (self.ty, value) {
            (DataTypeKind::Bool, DataValue::Bool(v)) => self.data[at] = *v as u8,
            (DataTypeKind::Bool, DataValue::Null) => self.data[at] = NULL_BOOL,
            (DataTypeKind::Int32, DataValue::Int32(v)) => {
                self.data[at..at + 4].copy_from_slice(&v.to_le_bytes())
            }
            (DataTypeKind::Int32, DataValue::Null) => {
                self.data[at..at + 4].copy_from_slice(&NULL_INT32.to_le_bytes())
            }
            (DataTypeKind::Int64, DataValue::Int64(v)) => {
                self.data[at..at + 8].copy_from_slice(&v.to_le_bytes())
            }
            (DataTypeKind::Int64, DataValue::Null) => {
                self.data[at..at + 8].copy_from_slice(&NULL_INT64.to_le_bytes())
            }
            (DataTypeKind::Float64, DataValue::Float64(v)) => {
                self.data[at..at + 8].copy_from_slice(&v.to_le_bytes())
            }
            (DataTypeKind::Float64, DataValue::Null) => {
                self.data[at..at + 8].copy_from_slice(&NULL_FLOAT64.to_le_bytes())
            }
            (DataTypeKind::String, DataValue::String(s)) => {
                let handle = heap.insert(s);
                self.data[at..at + 8].copy_from_slice(&handle.to_le_bytes())
            }
            (DataTypeKind::String, DataValue::Null) => {
                self.data[at..at + 8].copy_from_slice(&NULL_STRING_HANDLE.to_le_bytes())
            }
            _ => panic!("value type mismatch in column segment"),
        }
    }

    /// Read one value, converting sentinels back to NULL.
    pub fn read_value(&self, elem: usize, heap: &StringHeap) -> DataValue {
        assert!(elem < self.count);
        let size = self.type_size();
        let buf = &self.data[elem * size..(elem + 1) * size];
        match self.ty {
            DataTypeKind::Bool => match buf[0] {
                NULL_BOOL => DataValue::Null,
                v => DataValue::Bool(v != 0),
            },
            DataTypeKind::Int32 => match i32::from_le_bytes(buf.try_into().unwrap()) {
                NULL_INT32 => DataValue::Null,
                v => DataValue::Int32(v),
            },
            DataTypeKind::Int64 => match i64::from_le_bytes(buf.try_into().unwrap()) {
                NULL_INT64 => DataValue::Null,
                v => DataValue::Int64(v),
            },
            DataTypeKind::Float64 => {
                let v = f64::from_le_bytes(buf.try_into().unwrap());
                if v == NULL_FLOAT64 {
                    DataValue::Null
                } else {
                    DataValue::Float64(v)
                }
            }
            DataTypeKind::String => match u64::from_le_bytes(buf.try_into().unwrap()) {
                NULL_STRING_HANDLE => DataValue::Null,
                handle => DataValue::String(heap.get(handle).to_string()),
            },
        }
    }

    /// Read a contiguous run of values into a builder.
    pub fn read_range(
        &self,
        elem_offset: usize,
        count: usize,
        heap: &StringHeap,
        builder: &mut ArrayBuilderImpl,
    ) {
        assert!(elem_offset + count <= self.count);
        let size = self.type_size();
        for i in 0..count {
            let at = (elem_offset + i) * size;
            let buf = &self.data[at..at + size];
            match builder {
                ArrayBuilderImpl::Bool(b) => match buf[0] {
                    NULL_BOOL => b.push(None),
                    v => b.push(Some(&(v != 0))),
                },
                ArrayBuilderImpl::Int32(b) => {
                    match i32::from_le_bytes(buf.try_into().unwrap()) {
                        NULL_INT32 => b.push(None),
                        v => b.push(Some(&v)),
                    }
                }
                ArrayBuilderImpl::Int64(b) => {
                    match i64::from_le_bytes(buf.try_into().unwrap()) {
                        NULL_INT64 => b.push(None),
                        v => b.push(Some(&v)),
                    }
                }
                ArrayBuilderImpl::Float64(b) => {
                    let v = f64::from_le_bytes(buf.try_into().unwrap());
                    if v == NULL_FLOAT64 {
                        b.push(None)
                    } else {
                        b.push(Some(&v))
                    }
                }
                ArrayBuilderImpl::Utf8(b) => {
                    match u64::from_le_bytes(buf.try_into().unwrap()) {
                        NULL_STRING_HANDLE => b.push(None),
                        handle => {
                            let s = heap.get(handle);
                            b.push(Some(s.as_ref()))
                        }
                    }
                }
            }
        }
    }
}

/// The column side of a table: one segment tree per column plus the shared
/// string heap.
///
/// Version chunks hold back-references into this structure; it never shrinks
/// for the lifetime of the table.
pub(crate) struct TableColumns {
    types: Vec<DataType>,
    trees: Vec<SegmentTree<RwLock<ColumnSegment>>>,
    heap: StringHeap,
}

impl TableColumns {
    pub fn new(types: Vec<DataType>) -> Self {
        let trees = types
            .iter()
            .map(|ty| {
                let tree = SegmentTree::new();
                tree.append_segment(0, Arc::new(RwLock::new(ColumnSegment::new(0, ty.kind()))));
                tree
            })
            .collect();
        TableColumns {
            types,
            trees,
            heap: StringHeap::default(),
        }
    }

    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    pub fn heap(&self) -> &StringHeap {
        &self.heap
    }

    #[cfg(test)]
    pub(crate) fn tree(&self, col: usize) -> &SegmentTree<RwLock<ColumnSegment>> {
        &self.trees[col]
    }

    /// Append values into the tail segment of the column, allocating new
    /// segments as they fill up. Segment allocation is serialized by the
    /// table-level append, which holds the append latch.
    pub fn append_vector(
        &self,
        col: usize,
        array: &ArrayImpl,
        handles: Option<&[u64]>,
        mut src_offset: usize,
        mut count: usize,
    ) {
        while count > 0 {
            let (_, segment) = self.trees[col].last_segment();
            let copied = segment.write().append_values(array, handles, src_offset, count);
            src_offset += copied;
            count -= copied;
            if count > 0 {
                let seg = segment.read();
                let start = seg.start() + seg.count() as RowId;
                drop(seg);
                self.trees[col].append_segment(
                    start,
                    Arc::new(RwLock::new(ColumnSegment::new(start, self.types[col].kind()))),
                );
            }
        }
    }

    /// The segment holding `row` and the element offset of the row in it.
    pub fn pointer_to_row(&self, col: usize, row: RowId) -> (Arc<RwLock<ColumnSegment>>, usize) {
        let (_, segment) = self.trees[col].get_segment(row);
        let elem = {
            let seg = segment.read();
            debug_assert!(row >= seg.start());
            (row - seg.start()) as usize
        };
        (segment, elem)
    }

    /// The pointer pinning the next free position of the column.
    pub fn tail_pointer(&self, col: usize) -> ColumnPointer {
        let (index, segment) = self.trees[col].last_segment();
        let offset = segment.read().offset();
        ColumnPointer {
            segment: index,
            offset,
        }
    }

    pub fn read_value(&self, col: usize, row: RowId) -> DataValue {
        let (segment, elem) = self.pointer_to_row(col, row);
        let seg = segment.read();
        seg.read_value(elem, &self.heap)
    }

    pub fn write_row_value(
        &self,
        col: usize,
        row: RowId,
        array: &ArrayImpl,
        handles: Option<&[u64]>,
        idx: usize,
    ) {
        let (segment, elem) = self.pointer_to_row(col, row);
        segment.write().write_row(elem, array, handles, idx);
    }

    /// Restore a value from an undo image.
    pub fn restore_value(&self, col: usize, row: RowId, value: &DataValue) {
        let (segment, elem) = self.pointer_to_row(col, row);
        segment.write().write_value(elem, value, &self.heap);
    }

    /// Bulk-read `count` values starting at `cursor`, advancing it across
    /// segment boundaries.
    pub fn read_range_at(
        &self,
        col: usize,
        cursor: &mut ColumnPointer,
        mut count: usize,
        builder: &mut ArrayBuilderImpl,
    ) {
        let size = self.types[col].kind().fixed_size();
        while count > 0 {
            let segment = self.trees[col]
                .get(cursor.segment)
                .expect("column cursor past the last segment");
            let seg = segment.read();
            let elem = cursor.offset / size;
            let available = seg.count() - elem;
            if available == 0 {
                cursor.segment += 1;
                cursor.offset = 0;
                continue;
            }
            let n = available.min(count);
            seg.read_range(elem, n, &self.heap, builder);
            count -= n;
            cursor.offset += n * size;
        }
    }
}
