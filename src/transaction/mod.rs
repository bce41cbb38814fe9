// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! Transactions and the multi-version commit protocol.
//!
//! Transaction ids live in `[TRANSACTION_ID_START, ..)`; commit timestamps
//! below it. A version number therefore encodes whether the write is still
//! in progress. Commit rewrites the version number of every node the
//! transaction wrote to the commit timestamp; rollback undoes the writes in
//! reverse order.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

mod undo_buffer;
mod version_info;

pub use self::undo_buffer::UndoBuffer;
pub use self::version_info::{VersionArena, VersionNode, VersionNodeId, VersionOp};

/// The first version number that denotes an uncommitted write.
pub const TRANSACTION_ID_START: u64 = 1 << 62;

/// An active transaction.
pub struct Transaction {
    transaction_id: u64,
    start_time: u64,
    pub(crate) undo: UndoBuffer,
}

impl Transaction {
    pub fn transaction_id(&self) -> u64 {
        self.transaction_id
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Number of undo records this transaction has produced.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Whether a write with this version number is visible to the
    /// transaction: its own write, or one committed at or before its start
    /// time.
    pub(crate) fn use_version(&self, version_number: u64) -> bool {
        version_number == self.transaction_id || version_number <= self.start_time
    }

    /// Whether writing over a head with this version number conflicts:
    /// in progress by another transaction, or committed after this
    /// transaction's start time (first-writer-wins).
    pub(crate) fn has_conflict(&self, version_number: u64) -> bool {
        if version_number >= TRANSACTION_ID_START {
            version_number != self.transaction_id
        } else {
            version_number > self.start_time
        }
    }
}

struct ManagerInner {
    next_transaction_id: u64,
    last_commit_ts: u64,
}

/// Hands out transactions and drives commit and rollback.
pub struct TransactionManager {
    inner: Mutex<ManagerInner>,
    arena: Arc<VersionArena>,
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionManager {
    pub fn new() -> Self {
        TransactionManager {
            inner: Mutex::new(ManagerInner {
                next_transaction_id: TRANSACTION_ID_START,
                last_commit_ts: 0,
            }),
            arena: Arc::new(VersionArena::default()),
        }
    }

    /// The arena version nodes are allocated into. Tables share it so that
    /// their version chains resolve through one place.
    pub fn version_arena(&self) -> &Arc<VersionArena> {
        &self.arena
    }

    /// Start a new transaction with a snapshot of the current commit state.
    pub fn begin(&self) -> Transaction {
        let mut inner = self.inner.lock();
        let transaction_id = inner.next_transaction_id;
        inner.next_transaction_id += 1;
        let start_time = inner.last_commit_ts;
        debug!(transaction_id, start_time, "begin transaction");
        Transaction {
            transaction_id,
            start_time,
            undo: UndoBuffer::default(),
        }
    }

    /// Commit: allocate the next timestamp and publish every written version
    /// under it.
    ///
    /// The manager lock is held across the rewrite, so a transaction that
    /// begins afterwards observes either all or none of the writes.
    pub fn commit(&self, mut txn: Transaction) -> u64 {
        let mut inner = self.inner.lock();
        inner.last_commit_ts += 1;
        let commit_ts = inner.last_commit_ts;
        let entries = std::mem::take(&mut txn.undo.entries);
        for entry in &entries {
            self.arena.get(entry.node).set_version_number(commit_ts);
        }
        debug!(
            transaction_id = txn.transaction_id,
            commit_ts,
            writes = entries.len(),
            "commit transaction"
        );
        commit_ts
    }

    /// Roll back: undo the transaction's writes in reverse order.
    pub fn rollback(&self, mut txn: Transaction) {
        let entries = std::mem::take(&mut txn.undo.entries);
        debug!(
            transaction_id = txn.transaction_id,
            writes = entries.len(),
            "rollback transaction"
        );
        for entry in entries.into_iter().rev() {
            let node = self.arena.get(entry.node);
            entry.chunk.undo_write(entry.row_offset, &node);
        }
    }
}
