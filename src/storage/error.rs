// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

use std::backtrace::Backtrace;

use thiserror::Error;

/// The error taxonomy of the storage core.
///
/// Invariant violations (row ids not co-located in one version chunk, shape
/// mismatches between a chunk and the catalog) are programmer bugs and
/// surface as panics, not as variants here.
#[derive(Error, Debug)]
pub enum StorageError {
    /// NOT NULL, CHECK or UNIQUE violation, including rejected index appends.
    #[error("{0}")]
    Constraint(String),
    /// Another transaction already wrote a targeted row.
    #[error("conflict on {0}")]
    TransactionConflict(&'static str),
    /// The chunk does not match the table catalog.
    #[error("{0}")]
    Catalog(String),
    /// A documented gap of the engine.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

/// [`StorageError`] with backtrace.
#[derive(Error)]
#[error("{source:?}\n{backtrace}")]
pub struct TracedStorageError {
    source: StorageError,
    backtrace: Box<Backtrace>,
}

impl From<StorageError> for TracedStorageError {
    fn from(source: StorageError) -> Self {
        TracedStorageError {
            source,
            backtrace: Box::new(Backtrace::capture()),
        }
    }
}

impl std::fmt::Debug for TracedStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl TracedStorageError {
    pub fn constraint(message: impl ToString) -> Self {
        StorageError::Constraint(message.to_string()).into()
    }

    pub fn conflict(operation: &'static str) -> Self {
        StorageError::TransactionConflict(operation).into()
    }

    pub fn catalog(message: impl ToString) -> Self {
        StorageError::Catalog(message.to_string()).into()
    }

    pub fn not_implemented(what: &'static str) -> Self {
        StorageError::NotImplemented(what).into()
    }

    /// The underlying error kind.
    pub fn kind(&self) -> &StorageError {
        &self.source
    }
}

pub type StorageResult<T> = std::result::Result<T, TracedStorageError>;
