// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

use std::collections::HashMap;

use super::*;
use crate::types::DataType;

/// The catalog of a table.
///
/// Columns are ordered; a [`ColumnId`] is the position of the column in the
/// table.
pub struct TableCatalog {
    name: String,
    /// Mapping from column names to column ids
    column_idxs: HashMap<String, ColumnId>,
    columns: Vec<ColumnCatalog>,
    bound_constraints: Vec<BoundConstraint>,
}

impl TableCatalog {
    pub fn new(
        name: String,
        columns: Vec<ColumnCatalog>,
        bound_constraints: Vec<BoundConstraint>,
    ) -> TableCatalog {
        let column_idxs = columns
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                assert_eq!(col.id(), idx as ColumnId, "column ids must be positional");
                (col.name().to_string(), col.id())
            })
            .collect();
        TableCatalog {
            name,
            column_idxs,
            columns,
            bound_constraints,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column_idxs.contains_key(name)
    }

    pub fn get_column_id_by_name(&self, name: &str) -> Option<ColumnId> {
        self.column_idxs.get(name).cloned()
    }

    pub fn column(&self, id: ColumnId) -> &ColumnCatalog {
        &self.columns[id as usize]
    }

    pub fn all_columns(&self) -> &[ColumnCatalog] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The types of all columns, in column order.
    pub fn types(&self) -> Vec<DataType> {
        self.columns.iter().map(|col| col.datatype()).collect()
    }

    pub fn bound_constraints(&self) -> &[BoundConstraint] {
        &self.bound_constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataTypeExt, DataTypeKind};

    #[test]
    fn test_table_catalog() {
        let col0 = ColumnCatalog::new(0, "a".into(), DataTypeKind::Int32.not_null().to_column());
        let col1 = ColumnCatalog::new(1, "b".into(), DataTypeKind::Bool.nullable().to_column());
        let table_catalog = TableCatalog::new("t".into(), vec![col0, col1], vec![]);

        assert!(!table_catalog.contains_column("c"));
        assert!(table_catalog.contains_column("a"));
        assert_eq!(table_catalog.get_column_id_by_name("b"), Some(1));
        assert_eq!(table_catalog.column(0).name(), "a");
        assert_eq!(
            table_catalog.types(),
            vec![
                DataTypeKind::Int32.not_null(),
                DataTypeKind::Bool.nullable()
            ]
        );
    }
}
