// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! Verification of bound table constraints over an input chunk.

use std::collections::HashSet;

use super::error::{StorageResult, TracedStorageError};
use crate::array::{Array, ArrayImpl, DataChunk};
use crate::catalog::{BoundConstraint, TableCatalog};
use crate::expr::Expression;
use crate::types::ColumnId;

fn verify_not_null(
    table: &TableCatalog,
    array: &ArrayImpl,
    col_name: &str,
) -> StorageResult<()> {
    if array.has_null() {
        return Err(TracedStorageError::constraint(format!(
            "NOT NULL constraint failed: {}.{}",
            table.name(),
            col_name
        )));
    }
    Ok(())
}

fn verify_check(
    table: &TableCatalog,
    expression: &dyn Expression,
    chunk: &DataChunk,
) -> StorageResult<()> {
    let result = expression.execute(chunk).map_err(|e| {
        TracedStorageError::constraint(format!(
            "CHECK constraint failed: {} (Error: {})",
            table.name(),
            e
        ))
    })?;
    // a row passes unless its entry is a non-NULL zero
    if result.iter().any(|v| v == Some(&0)) {
        return Err(TracedStorageError::constraint(format!(
            "CHECK constraint failed: {}",
            table.name()
        )));
    }
    Ok(())
}

fn verify_unique(keys: &[ColumnId], chunk: &DataChunk) -> StorageResult<()> {
    if keys.len() != 1 {
        return Err(TracedStorageError::not_implemented(
            "UNIQUE constraint over multiple columns",
        ));
    }
    // this only checks the new chunk; uniqueness against existing rows is
    // enforced by the unique index at append time
    if !chunk.array_at(keys[0] as usize).all_unique() {
        return Err(TracedStorageError::constraint(
            "duplicate key value violates primary key or unique constraint",
        ));
    }
    Ok(())
}

/// Place the update columns at their catalog positions so that constraints
/// bound to catalog column ids can evaluate against an update chunk. Columns
/// absent from the update are padded with typed NULL columns.
pub(crate) fn create_mock_chunk(
    table: &TableCatalog,
    column_ids: &[ColumnId],
    updates: &DataChunk,
) -> DataChunk {
    let cardinality = updates.cardinality();
    let mut arrays: Vec<Option<ArrayImpl>> = (0..table.column_count()).map(|_| None).collect();
    for (i, &col) in column_ids.iter().enumerate() {
        arrays[col as usize] = Some(updates.array_at(i).clone());
    }
    arrays
        .into_iter()
        .enumerate()
        .map(|(col, array)| {
            array.unwrap_or_else(|| {
                ArrayImpl::nulls(table.column(col as ColumnId).datatype().kind(), cardinality)
            })
        })
        .collect()
}

/// Build the mock chunk if any of the desired columns are updated. Fails when
/// only part of them is present: evaluating the constraint would then need
/// the base values of the missing columns.
fn create_mock_chunk_checked(
    table: &TableCatalog,
    column_ids: &[ColumnId],
    desired: &HashSet<ColumnId>,
    updates: &DataChunk,
) -> StorageResult<Option<DataChunk>> {
    let found = column_ids.iter().filter(|col| desired.contains(col)).count();
    if found == 0 {
        return Ok(None);
    }
    if found != desired.len() {
        return Err(TracedStorageError::not_implemented(
            "constraint columns partially present in the update",
        ));
    }
    Ok(Some(create_mock_chunk(table, column_ids, updates)))
}

/// Verify every bound constraint against a full-row append chunk.
pub(crate) fn verify_append_constraints(
    table: &TableCatalog,
    chunk: &DataChunk,
) -> StorageResult<()> {
    for constraint in table.bound_constraints() {
        match constraint {
            BoundConstraint::NotNull(col) => verify_not_null(
                table,
                chunk.array_at(*col as usize),
                table.column(*col).name(),
            )?,
            BoundConstraint::Check { expression, .. } => {
                verify_check(table, expression.as_ref(), chunk)?
            }
            BoundConstraint::Unique { keys } => verify_unique(keys, chunk)?,
            BoundConstraint::ForeignKey => {
                return Err(TracedStorageError::not_implemented("FOREIGN KEY constraint"))
            }
        }
    }
    Ok(())
}

/// Verify the constraints touched by an update of `column_ids`.
pub(crate) fn verify_update_constraints(
    table: &TableCatalog,
    updates: &DataChunk,
    column_ids: &[ColumnId],
) -> StorageResult<()> {
    for constraint in table.bound_constraints() {
        match constraint {
            BoundConstraint::NotNull(col) => {
                if let Some(i) = column_ids.iter().position(|c| c == col) {
                    verify_not_null(table, updates.array_at(i), table.column(*col).name())?;
                }
            }
            BoundConstraint::Check {
                expression,
                columns,
            } => {
                if let Some(mock) =
                    create_mock_chunk_checked(table, column_ids, columns, updates)?
                {
                    verify_check(table, expression.as_ref(), &mock)?;
                }
            }
            BoundConstraint::Unique { keys } => {
                let desired: HashSet<ColumnId> = keys.iter().copied().collect();
                if let Some(mock) =
                    create_mock_chunk_checked(table, column_ids, &desired, updates)?
                {
                    verify_unique(keys, &mock)?;
                }
            }
            BoundConstraint::ForeignKey => {
                return Err(TracedStorageError::not_implemented("FOREIGN KEY constraint"))
            }
        }
    }
    Ok(())
}
