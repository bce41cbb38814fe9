// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! End-to-end scenarios for the table storage core.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::array::{Array, ArrayImpl, DataChunk, I32Array, Utf8Array};
use crate::catalog::{BoundConstraint, ColumnCatalog, TableCatalog, TableCatalogRef};
use crate::expr::{ExprError, Expression};
use crate::transaction::{Transaction, TransactionManager};
use crate::types::{ColumnId, DataTypeExt, DataTypeKind, DataValue, RowId};

fn two_int_catalog(bound_constraints: Vec<BoundConstraint>) -> TableCatalogRef {
    Arc::new(TableCatalog::new(
        "t".into(),
        vec![
            ColumnCatalog::new(0, "a".into(), DataTypeKind::Int32.nullable().to_column()),
            ColumnCatalog::new(1, "b".into(), DataTypeKind::Int32.nullable().to_column()),
        ],
        bound_constraints,
    ))
}

fn setup(bound_constraints: Vec<BoundConstraint>) -> (TransactionManager, DataTable) {
    let manager = TransactionManager::new();
    let table = DataTable::new(
        two_int_catalog(bound_constraints),
        manager.version_arena().clone(),
    );
    (manager, table)
}

fn i32s(values: &[Option<i32>]) -> ArrayImpl {
    ArrayImpl::Int32(values.iter().copied().collect::<I32Array>())
}

fn strs(values: &[Option<&str>]) -> ArrayImpl {
    ArrayImpl::Utf8(values.iter().copied().collect::<Utf8Array>())
}

fn int_chunk(a: &[Option<i32>], b: &[Option<i32>]) -> DataChunk {
    [i32s(a), i32s(b)].into_iter().collect()
}

fn int(v: i32) -> DataValue {
    DataValue::Int32(v)
}

fn scan_rows(table: &DataTable, txn: &Transaction, column_ids: &[ColumnId]) -> Vec<Vec<DataValue>> {
    let mut state = table.initialize_scan();
    let mut rows = Vec::new();
    while let Some(chunk) = table.scan(txn, column_ids, &mut state) {
        for i in 0..chunk.cardinality() {
            rows.push(chunk.get_row_by_idx(i));
        }
    }
    rows
}

fn assert_constraint_contains(err: &TracedStorageError, needle: &str) {
    match err.kind() {
        StorageError::Constraint(message) => {
            assert!(message.contains(needle), "unexpected message: {}", message)
        }
        other => panic!("expected a constraint error, got: {:?}", other),
    }
}

/// An in-memory index recording `(key, row id)` pairs; optionally rejects
/// keys it has already seen.
struct TestIndex {
    key_column: ColumnId,
    unique: bool,
    entries: Mutex<Vec<(DataValue, RowId)>>,
}

impl TestIndex {
    fn new(key_column: ColumnId, unique: bool) -> Arc<Self> {
        Arc::new(TestIndex {
            key_column,
            unique,
            entries: Mutex::new(Vec::new()),
        })
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn contains(&self, key: &DataValue) -> bool {
        self.entries.lock().iter().any(|(k, _)| k == key)
    }
}

impl Index for TestIndex {
    fn append(&self, chunk: &DataChunk, row_ids: &[RowId]) -> bool {
        let array = chunk.array_at(self.key_column as usize);
        let mut entries = self.entries.lock();
        if self.unique {
            for i in 0..array.len() {
                let key = array.get(i);
                if entries.iter().any(|(k, _)| *k == key) {
                    return false;
                }
            }
        }
        for (i, &row) in row_ids.iter().enumerate() {
            entries.push((array.get(i), row));
        }
        true
    }

    fn delete(&self, _chunk: &DataChunk, row_ids: &[RowId]) {
        self.entries
            .lock()
            .retain(|(_, row)| !row_ids.contains(row));
    }

    fn index_is_updated(&self, column_ids: &[ColumnId]) -> bool {
        column_ids.contains(&self.key_column)
    }
}

/// CHECK expression: `column > 0`.
struct PositiveCheck {
    column: ColumnId,
}

impl Expression for PositiveCheck {
    fn execute(&self, chunk: &DataChunk) -> Result<I32Array, ExprError> {
        match chunk.array_at(self.column as usize) {
            ArrayImpl::Int32(a) => Ok(a.iter().map(|v| v.map(|x| (*x > 0) as i32)).collect()),
            _ => Err(ExprError("expected an int32 column".into())),
        }
    }
}

fn positive_check(column: ColumnId) -> BoundConstraint {
    BoundConstraint::Check {
        expression: Arc::new(PositiveCheck { column }),
        columns: [column].into_iter().collect(),
    }
}

#[test]
fn test_basic_append_and_scan() {
    let (manager, table) = setup(vec![]);

    let mut t1 = manager.begin();
    table
        .append(
            &mut t1,
            int_chunk(
                &[Some(1), Some(2), Some(3)],
                &[Some(10), Some(20), Some(30)],
            ),
        )
        .unwrap();
    manager.commit(t1);

    let t2 = manager.begin();
    let rows = scan_rows(&table, &t2, &[0, 1]);
    assert_eq!(
        rows,
        vec![
            vec![int(1), int(10)],
            vec![int(2), int(20)],
            vec![int(3), int(30)],
        ]
    );
    assert_eq!(table.cardinality(), 3);
}

#[test]
fn test_not_null_rejected() {
    let manager = TransactionManager::new();
    let catalog = Arc::new(TableCatalog::new(
        "t".into(),
        vec![ColumnCatalog::new(
            0,
            "a".into(),
            DataTypeKind::Int32.not_null().to_column(),
        )],
        vec![BoundConstraint::NotNull(0)],
    ));
    let table = DataTable::new(catalog, manager.version_arena().clone());

    let mut txn = manager.begin();
    let chunk: DataChunk = [i32s(&[Some(5), None, Some(7)])].into_iter().collect();
    let err = table.append(&mut txn, chunk).unwrap_err();
    assert_constraint_contains(&err, "NOT NULL");
    assert_eq!(table.cardinality(), 0);
    assert_eq!(txn.undo_len(), 0);
}

#[test]
fn test_unique_index_rejects_and_repairs() {
    let (manager, table) = setup(vec![]);
    let unique = TestIndex::new(0, true);
    let secondary = TestIndex::new(1, false);
    table.add_index(unique.clone());
    table.add_index(secondary.clone());

    let mut t1 = manager.begin();
    table
        .append(&mut t1, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap();
    manager.commit(t1);
    assert_eq!(unique.len(), 1);
    assert_eq!(secondary.len(), 1);

    // the duplicated key is rejected by the first index; the second must not
    // be left holding an entry for the attempted row id
    let mut t2 = manager.begin();
    let err = table
        .append(&mut t2, int_chunk(&[Some(1)], &[Some(99)]))
        .unwrap_err();
    assert_constraint_contains(&err, "PRIMARY KEY or UNIQUE");
    assert_eq!(table.cardinality(), 1);
    assert_eq!(unique.len(), 1);
    assert_eq!(secondary.len(), 1);
    assert!(!secondary.contains(&int(99)));
    assert_eq!(t2.undo_len(), 0);
}

#[test]
fn test_index_repair_undoes_earlier_appends() {
    let (manager, table) = setup(vec![]);
    let first = TestIndex::new(1, false);
    let unique = TestIndex::new(0, true);
    table.add_index(first.clone());
    table.add_index(unique.clone());

    let mut t1 = manager.begin();
    table
        .append(&mut t1, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap();
    manager.commit(t1);

    // the second index fails: the entry accepted by the first is removed
    let mut t2 = manager.begin();
    table
        .append(&mut t2, int_chunk(&[Some(1)], &[Some(20)]))
        .unwrap_err();
    assert_eq!(first.len(), 1);
    assert_eq!(unique.len(), 1);
    assert!(!first.contains(&int(20)));
}

#[test]
fn test_update_update_conflict() {
    let (manager, table) = setup(vec![]);
    let mut t0 = manager.begin();
    table
        .append(&mut t0, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap();
    manager.commit(t0);

    let mut t1 = manager.begin();
    let updates: DataChunk = [i32s(&[Some(100)])].into_iter().collect();
    table.update(&mut t1, &[0], &[0], &updates).unwrap();

    // t2 hits t1's uncommitted version
    let mut t2 = manager.begin();
    let updates2: DataChunk = [i32s(&[Some(200)])].into_iter().collect();
    let err = table.update(&mut t2, &[0], &[0], &updates2).unwrap_err();
    assert!(matches!(
        err.kind(),
        StorageError::TransactionConflict("tuple update")
    ));
    assert_eq!(t2.undo_len(), 0);

    manager.commit(t1);
    let t3 = manager.begin();
    assert_eq!(scan_rows(&table, &t3, &[0, 1]), vec![vec![int(100), int(10)]]);
}

#[test]
fn test_first_writer_wins_after_commit() {
    let (manager, table) = setup(vec![]);
    let mut t0 = manager.begin();
    table
        .append(&mut t0, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap();
    manager.commit(t0);

    // both transactions start before either writes
    let mut t1 = manager.begin();
    let mut t2 = manager.begin();
    let updates: DataChunk = [i32s(&[Some(100)])].into_iter().collect();
    table.update(&mut t1, &[0], &[0], &updates).unwrap();
    manager.commit(t1);

    // t1 committed after t2's snapshot: t2 must not overwrite it
    let updates2: DataChunk = [i32s(&[Some(200)])].into_iter().collect();
    let err = table.update(&mut t2, &[0], &[0], &updates2).unwrap_err();
    assert!(matches!(
        err.kind(),
        StorageError::TransactionConflict("tuple update")
    ));
    assert_eq!(t2.undo_len(), 0);
}

#[test]
fn test_delete_conflict() {
    let (manager, table) = setup(vec![]);
    let mut t0 = manager.begin();
    table
        .append(&mut t0, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap();
    manager.commit(t0);

    let mut t1 = manager.begin();
    table.delete(&mut t1, &[0]).unwrap();

    let mut t2 = manager.begin();
    let err = table.delete(&mut t2, &[0]).unwrap_err();
    assert!(matches!(
        err.kind(),
        StorageError::TransactionConflict("tuple deletion")
    ));
    assert_eq!(t2.undo_len(), 0);
    manager.rollback(t1);

    // after the rollback the row is free again
    let mut t3 = manager.begin();
    table.delete(&mut t3, &[0]).unwrap();
    manager.commit(t3);
    let t4 = manager.begin();
    assert!(scan_rows(&table, &t4, &[0]).is_empty());
}

#[test]
fn test_chunk_spill_on_append() {
    let (manager, table) = setup(vec![]);
    let a: Vec<Option<i32>> = (0..1500).map(Some).collect();
    let mut txn = manager.begin();
    table.append(&mut txn, int_chunk(&a, &a)).unwrap();
    manager.commit(txn);

    assert_eq!(
        table.chunk_layout(),
        vec![(0, STORAGE_CHUNK_SIZE), (STORAGE_CHUNK_SIZE as RowId, 476)]
    );
    let reader = manager.begin();
    let rows = scan_rows(&table, &reader, &[0]);
    assert_eq!(rows.len(), 1500);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row[0], int(i as i32));
    }
}

#[test]
fn test_delete_then_scan_and_fetch() {
    let (manager, table) = setup(vec![]);
    let a: Vec<Option<i32>> = (0..100).map(Some).collect();
    let mut t0 = manager.begin();
    table.append(&mut t0, int_chunk(&a, &a)).unwrap();
    manager.commit(t0);

    let mut t1 = manager.begin();
    table.delete(&mut t1, &[10, 20, 30]).unwrap();
    manager.commit(t1);

    let t2 = manager.begin();
    let rows = scan_rows(&table, &t2, &[0]);
    assert_eq!(rows.len(), 97);
    let values: HashSet<DataValue> = rows.into_iter().map(|mut r| r.remove(0)).collect();
    for missing in [10, 20, 30] {
        assert!(!values.contains(&int(missing)));
    }

    // fetching the deleted rows produces no tuples
    let fetched = table.fetch(&t2, &[0, 1], &[10, 20, 30]);
    assert_eq!(fetched.cardinality(), 0);
    let fetched = table.fetch(&t2, &[0, 1], &[31, 9]);
    assert_eq!(
        (0..fetched.cardinality())
            .map(|i| fetched.get_row_by_idx(i))
            .collect::<Vec<_>>(),
        vec![vec![int(9), int(9)], vec![int(31), int(31)]]
    );
}

#[test]
fn test_rolled_back_append_is_invisible() {
    let (manager, table) = setup(vec![]);
    let mut t1 = manager.begin();
    table
        .append(
            &mut t1,
            int_chunk(&[Some(1), Some(2), Some(3)], &[Some(1), Some(2), Some(3)]),
        )
        .unwrap();
    manager.rollback(t1);

    let t2 = manager.begin();
    assert!(scan_rows(&table, &t2, &[0]).is_empty());
    // row-id space is not reclaimed
    assert_eq!(table.cardinality(), 3);

    // later appends keep working and get fresh row ids
    let mut t3 = manager.begin();
    table
        .append(&mut t3, int_chunk(&[Some(4)], &[Some(4)]))
        .unwrap();
    manager.commit(t3);
    assert_eq!(table.cardinality(), 4);
    let t4 = manager.begin();
    assert_eq!(scan_rows(&table, &t4, &[0]), vec![vec![int(4)]]);
}

#[test]
fn test_snapshot_does_not_see_later_appends() {
    let (manager, table) = setup(vec![]);
    let mut t0 = manager.begin();
    table
        .append(&mut t0, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap();
    manager.commit(t0);

    let reader = manager.begin();
    let mut state = table.initialize_scan();

    let mut writer = manager.begin();
    table
        .append(&mut writer, int_chunk(&[Some(2)], &[Some(20)]))
        .unwrap();
    manager.commit(writer);

    // the reader's captured extent bounds the scan
    let mut rows = Vec::new();
    while let Some(chunk) = table.scan(&reader, &[0], &mut state) {
        for i in 0..chunk.cardinality() {
            rows.push(chunk.get_row_by_idx(i));
        }
    }
    assert_eq!(rows, vec![vec![int(1)]]);

    // a scan initialized now still hides the rows committed after the
    // reader's start time
    assert_eq!(scan_rows(&table, &reader, &[0]), vec![vec![int(1)]]);

    let fresh = manager.begin();
    assert_eq!(scan_rows(&table, &fresh, &[0]).len(), 2);
}

#[test]
fn test_transaction_sees_own_writes() {
    let (manager, table) = setup(vec![]);
    let mut txn = manager.begin();
    table
        .append(&mut txn, int_chunk(&[Some(1), Some(2)], &[Some(10), Some(20)]))
        .unwrap();

    // uncommitted rows are visible to their own transaction only
    assert_eq!(scan_rows(&table, &txn, &[0]).len(), 2);
    let other = manager.begin();
    assert!(scan_rows(&table, &other, &[0]).is_empty());
}

#[test]
fn test_old_snapshot_reads_through_version_chain() {
    let (manager, table) = setup(vec![]);
    let mut t0 = manager.begin();
    table
        .append(&mut t0, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap();
    manager.commit(t0);

    let reader = manager.begin();

    let mut writer = manager.begin();
    let updates: DataChunk = [i32s(&[Some(2)])].into_iter().collect();
    table.update(&mut writer, &[0], &[0], &updates).unwrap();
    manager.commit(writer);

    // the reader's snapshot predates the update: the pre-image wins
    assert_eq!(scan_rows(&table, &reader, &[0, 1]), vec![vec![int(1), int(10)]]);
    assert_eq!(
        {
            let fetched = table.fetch(&reader, &[0], &[0]);
            fetched.get_row_by_idx(0)
        },
        vec![int(1)]
    );

    let fresh = manager.begin();
    assert_eq!(scan_rows(&table, &fresh, &[0, 1]), vec![vec![int(2), int(10)]]);
}

#[test]
fn test_update_rollback_restores_base_data() {
    let (manager, table) = setup(vec![]);
    let mut t0 = manager.begin();
    table
        .append(&mut t0, int_chunk(&[Some(1), Some(2)], &[Some(10), Some(20)]))
        .unwrap();
    manager.commit(t0);

    let mut t1 = manager.begin();
    let updates = int_chunk(&[Some(100), Some(200)], &[None, None]);
    table.update(&mut t1, &[0, 1], &[0, 1], &updates).unwrap();
    assert_eq!(
        scan_rows(&table, &t1, &[0, 1]),
        vec![
            vec![int(100), DataValue::Null],
            vec![int(200), DataValue::Null],
        ]
    );
    manager.rollback(t1);

    let t2 = manager.begin();
    assert_eq!(
        scan_rows(&table, &t2, &[0, 1]),
        vec![vec![int(1), int(10)], vec![int(2), int(20)]]
    );
}

#[test]
fn test_check_constraint() {
    let (manager, table) = setup(vec![positive_check(0)]);

    let mut t1 = manager.begin();
    table
        .append(&mut t1, int_chunk(&[Some(1), None], &[Some(10), Some(20)]))
        .unwrap();
    manager.commit(t1);

    // a non-NULL zero fails the check
    let mut t2 = manager.begin();
    let err = table
        .append(&mut t2, int_chunk(&[Some(0)], &[Some(30)]))
        .unwrap_err();
    assert_constraint_contains(&err, "CHECK");
    assert_eq!(table.cardinality(), 2);

    // updates of the checked column are verified as well
    let mut t3 = manager.begin();
    let updates: DataChunk = [i32s(&[Some(-5)])].into_iter().collect();
    let err = table.update(&mut t3, &[0], &[0], &updates).unwrap_err();
    assert_constraint_contains(&err, "CHECK");
    assert_eq!(t3.undo_len(), 0);
}

#[test]
fn test_check_constraint_partial_update_columns() {
    let manager = TransactionManager::new();
    let both = BoundConstraint::Check {
        expression: Arc::new(PositiveCheck { column: 0 }),
        columns: [0, 1].into_iter().collect(),
    };
    let table = DataTable::new(two_int_catalog(vec![both]), manager.version_arena().clone());

    let mut t0 = manager.begin();
    table
        .append(&mut t0, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap();
    manager.commit(t0);

    // only one of the two referenced columns is updated
    let mut t1 = manager.begin();
    let updates: DataChunk = [i32s(&[Some(5)])].into_iter().collect();
    let err = table.update(&mut t1, &[0], &[0], &updates).unwrap_err();
    assert!(matches!(err.kind(), StorageError::NotImplemented(_)));
}

#[test]
fn test_foreign_key_rejected() {
    let (manager, table) = setup(vec![BoundConstraint::ForeignKey]);
    let mut txn = manager.begin();
    let err = table
        .append(&mut txn, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap_err();
    assert!(matches!(err.kind(), StorageError::NotImplemented(_)));

    let updates: DataChunk = [i32s(&[Some(2)])].into_iter().collect();
    let err = table.update(&mut txn, &[0], &[0], &updates).unwrap_err();
    assert!(matches!(err.kind(), StorageError::NotImplemented(_)));
}

#[test]
fn test_multi_column_unique_rejected() {
    let (manager, table) = setup(vec![BoundConstraint::Unique { keys: vec![0, 1] }]);
    let mut txn = manager.begin();
    let err = table
        .append(&mut txn, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap_err();
    assert!(matches!(err.kind(), StorageError::NotImplemented(_)));
}

#[test]
fn test_unique_within_chunk() {
    let (manager, table) = setup(vec![BoundConstraint::Unique { keys: vec![0] }]);
    let mut txn = manager.begin();
    let err = table
        .append(
            &mut txn,
            int_chunk(&[Some(1), Some(1)], &[Some(10), Some(20)]),
        )
        .unwrap_err();
    assert_constraint_contains(&err, "duplicate key");

    table
        .append(
            &mut txn,
            int_chunk(&[Some(1), Some(2)], &[Some(10), Some(20)]),
        )
        .unwrap();
}

#[test]
fn test_statistics_track_bounds_and_nulls() {
    let (manager, table) = setup(vec![]);
    let mut t1 = manager.begin();
    table
        .append(&mut t1, int_chunk(&[Some(3), Some(7)], &[Some(1), None]))
        .unwrap();
    manager.commit(t1);

    let stats = table.statistics(0);
    assert_eq!(stats.min(), Some(&int(3)));
    assert_eq!(stats.max(), Some(&int(7)));
    assert!(!stats.has_null());
    assert!(table.statistics(1).has_null());

    let mut t2 = manager.begin();
    table
        .append(&mut t2, int_chunk(&[Some(-1)], &[Some(5)]))
        .unwrap();
    manager.commit(t2);
    let stats = table.statistics(0);
    assert_eq!(stats.min(), Some(&int(-1)));
    assert_eq!(stats.max(), Some(&int(7)));
}

#[test]
fn test_string_columns() {
    let manager = TransactionManager::new();
    let catalog = Arc::new(TableCatalog::new(
        "people".into(),
        vec![
            ColumnCatalog::new(0, "id".into(), DataTypeKind::Int32.not_null().to_column()),
            ColumnCatalog::new(1, "name".into(), DataTypeKind::String.nullable().to_column()),
        ],
        vec![],
    ));
    let table = DataTable::new(catalog, manager.version_arena().clone());

    let mut t0 = manager.begin();
    let chunk: DataChunk = [
        i32s(&[Some(1), Some(2), Some(3)]),
        strs(&[Some("alice"), None, Some("carol")]),
    ]
    .into_iter()
    .collect();
    table.append(&mut t0, chunk).unwrap();
    manager.commit(t0);

    let reader = manager.begin();
    assert_eq!(
        scan_rows(&table, &reader, &[1]),
        vec![
            vec![DataValue::String("alice".into())],
            vec![DataValue::Null],
            vec![DataValue::String("carol".into())],
        ]
    );

    // a rolled-back string update restores the old image
    let mut t1 = manager.begin();
    let updates: DataChunk = [strs(&[Some("bob")])].into_iter().collect();
    table.update(&mut t1, &[1], &[1], &updates).unwrap();
    manager.rollback(t1);
    let t2 = manager.begin();
    let fetched = table.fetch(&t2, &[1], &[1]);
    assert_eq!(fetched.get_row_by_idx(0), vec![DataValue::Null]);

    // a committed one sticks
    let mut t3 = manager.begin();
    let updates: DataChunk = [strs(&[Some("bob")])].into_iter().collect();
    table.update(&mut t3, &[1], &[1], &updates).unwrap();
    manager.commit(t3);
    let t4 = manager.begin();
    let fetched = table.fetch(&t4, &[1], &[1]);
    assert_eq!(
        fetched.get_row_by_idx(0),
        vec![DataValue::String("bob".into())]
    );
}

#[test]
fn test_update_indexes_skip_untouched() {
    let (manager, table) = setup(vec![]);
    let on_a = TestIndex::new(0, false);
    table.add_index(on_a.clone());

    let mut t0 = manager.begin();
    table
        .append(&mut t0, int_chunk(&[Some(1)], &[Some(10)]))
        .unwrap();
    manager.commit(t0);
    assert_eq!(on_a.len(), 1);

    // updating column 1 does not touch an index on column 0
    let mut t1 = manager.begin();
    let updates: DataChunk = [i32s(&[Some(99)])].into_iter().collect();
    table.update(&mut t1, &[0], &[1], &updates).unwrap();
    manager.commit(t1);
    assert_eq!(on_a.len(), 1);

    // updating column 0 appends the new key
    let mut t2 = manager.begin();
    let updates: DataChunk = [i32s(&[Some(5)])].into_iter().collect();
    table.update(&mut t2, &[0], &[0], &updates).unwrap();
    manager.commit(t2);
    assert_eq!(on_a.len(), 2);
    assert!(on_a.contains(&int(5)));
}

#[test]
fn test_create_index_scan_sees_in_progress_and_versions() {
    let (manager, table) = setup(vec![]);
    let mut t0 = manager.begin();
    table
        .append(&mut t0, int_chunk(&[Some(1), Some(2)], &[Some(10), Some(20)]))
        .unwrap();
    manager.commit(t0);

    // committed update: leaves the pre-image in the version chain
    let mut t1 = manager.begin();
    let updates: DataChunk = [i32s(&[Some(5)])].into_iter().collect();
    table.update(&mut t1, &[0], &[0], &updates).unwrap();
    manager.commit(t1);

    // in-progress append
    let mut t2 = manager.begin();
    table
        .append(&mut t2, int_chunk(&[Some(3)], &[Some(30)]))
        .unwrap();

    let mut state = table.initialize_index_scan();
    let mut rows = Vec::new();
    while let Some(chunk) = table.create_index_scan(&[0, 1], &mut state) {
        for i in 0..chunk.cardinality() {
            rows.push(chunk.get_row_by_idx(i));
        }
    }
    // the pre-image, both committed rows, and the in-progress insertion
    assert_eq!(rows.len(), 4);
    assert!(rows.contains(&vec![int(1), int(10)]));
    assert!(rows.contains(&vec![int(5), int(10)]));
    assert!(rows.contains(&vec![int(2), int(20)]));
    assert!(rows.contains(&vec![int(3), int(30)]));
    manager.rollback(t2);
}

#[test]
fn test_column_count_mismatch() {
    let (manager, table) = setup(vec![]);
    let mut txn = manager.begin();
    let chunk: DataChunk = [i32s(&[Some(1)])].into_iter().collect();
    let err = table.append(&mut txn, chunk).unwrap_err();
    assert!(matches!(err.kind(), StorageError::Catalog(_)));
}

#[test]
fn test_concurrent_appends_are_dense() {
    let manager = Arc::new(TransactionManager::new());
    let table = Arc::new(DataTable::new(
        two_int_catalog(vec![]),
        manager.version_arena().clone(),
    ));

    let mut handles = Vec::new();
    for t in 0..4 {
        let manager = manager.clone();
        let table = table.clone();
        handles.push(std::thread::spawn(move || {
            for batch in 0..10 {
                let mut txn = manager.begin();
                let a: Vec<Option<i32>> =
                    (0..200).map(|i| Some(t * 10_000 + batch * 200 + i)).collect();
                table.append(&mut txn, int_chunk(&a, &a)).unwrap();
                manager.commit(txn);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(table.cardinality(), 8000);
    let reader = manager.begin();
    assert_eq!(scan_rows(&table, &reader, &[0, 1]).len(), 8000);

    // the chunk layout covers the row-id space densely with no overlap
    let mut expected_start = 0;
    for (start, count) in table.chunk_layout() {
        assert_eq!(start, expected_start);
        expected_start += count as RowId;
    }
    assert_eq!(expected_start, 8000);
}

#[test]
fn test_scan_drains_exactly_once() {
    let (manager, table) = setup(vec![]);
    let a: Vec<Option<i32>> = (0..600).map(Some).collect();
    let mut t0 = manager.begin();
    table.append(&mut t0, int_chunk(&a, &a)).unwrap();
    manager.commit(t0);

    let reader = manager.begin();
    let mut state = table.initialize_scan();
    let mut seen = HashSet::new();
    while let Some(chunk) = table.scan(&reader, &[0], &mut state) {
        assert!(chunk.cardinality() <= VECTOR_SIZE);
        for i in 0..chunk.cardinality() {
            assert!(seen.insert(chunk.get_row_by_idx(i)[0].clone()));
        }
    }
    assert_eq!(seen.len(), 600);
    // the drained cursor stays drained
    assert!(table.scan(&reader, &[0], &mut state).is_none());
}
