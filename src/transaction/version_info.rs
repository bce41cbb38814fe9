// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::DataValue;

/// Stable index of a [`VersionNode`] in the [`VersionArena`].
pub type VersionNodeId = usize;

/// The kind of write a version node records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOp {
    Insert,
    Delete,
    Update,
}

/// One write to one row.
///
/// `version_number` is the writer's transaction id while the write is
/// uncommitted and is rewritten to the commit timestamp on commit. `data` is
/// the image of the row before this write (`None` for an insert: the row did
/// not exist). Nodes chain newest-first through `prev`.
pub struct VersionNode {
    version_number: AtomicU64,
    pub(crate) op: VersionOp,
    pub(crate) data: Option<Box<[DataValue]>>,
    pub(crate) prev: Option<VersionNodeId>,
}

impl VersionNode {
    pub(crate) fn version_number(&self) -> u64 {
        self.version_number.load(Ordering::Acquire)
    }

    pub(crate) fn set_version_number(&self, version_number: u64) {
        self.version_number.store(version_number, Ordering::Release);
    }
}

/// Append-only arena of version nodes.
///
/// Nodes are never freed: committed nodes stay reachable so that readers with
/// older snapshots keep resolving pre-images. The arena index is the stable
/// handle stored in version-chunk slots and `prev` links.
#[derive(Default)]
pub struct VersionArena {
    nodes: RwLock<Vec<Arc<VersionNode>>>,
}

impl VersionArena {
    pub(crate) fn alloc(
        &self,
        version_number: u64,
        op: VersionOp,
        data: Option<Box<[DataValue]>>,
        prev: Option<VersionNodeId>,
    ) -> VersionNodeId {
        let mut nodes = self.nodes.write();
        nodes.push(Arc::new(VersionNode {
            version_number: AtomicU64::new(version_number),
            op,
            data,
            prev,
        }));
        nodes.len() - 1
    }

    pub(crate) fn get(&self, id: VersionNodeId) -> Arc<VersionNode> {
        self.nodes.read()[id].clone()
    }
}
