// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

use itertools::Itertools;

use super::{ArrayBuilderImpl, DataChunk};
use crate::types::{DataType, DataValue};

/// A helper struct to build a [`DataChunk`] row by row.
pub struct DataChunkBuilder {
    array_builders: Vec<ArrayBuilderImpl>,
    size: usize,
}

impl DataChunkBuilder {
    pub fn new<'a>(data_types: impl IntoIterator<Item = &'a DataType>, capacity: usize) -> Self {
        let array_builders = data_types
            .into_iter()
            .map(|ty| ArrayBuilderImpl::with_capacity(capacity, ty))
            .collect();
        DataChunkBuilder {
            array_builders,
            size: 0,
        }
    }

    /// Push a row of values.
    ///
    /// The row is accepted as an iterator of [`DataValue`], and it's required that the
    /// number of values is the same as the number of columns.
    pub fn push_row(&mut self, row: impl IntoIterator<Item = DataValue>) {
        self.array_builders
            .iter_mut()
            .zip_eq(row)
            .for_each(|(builder, v)| builder.push(&v));
        self.size += 1;
    }

    /// The number of rows pushed so far.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Generate a [`DataChunk`] with the pushed rows.
    #[must_use]
    pub fn finish(self) -> DataChunk {
        self.array_builders
            .into_iter()
            .map(|builder| builder.finish())
            .collect()
    }
}
