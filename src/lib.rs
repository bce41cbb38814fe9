// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! StrataDB: a columnar, transactional table storage engine.
//!
//! Tables store tuples in fixed-capacity column segments grouped into
//! row-wise version chunks. Writes verify table constraints, keep secondary
//! indexes in step with the base table and log pre-images into per-transaction
//! undo buffers; reads are snapshot-isolated under multi-version concurrency
//! control with first-writer-wins conflict detection.

#![deny(unused_must_use)]

pub mod array;
pub mod catalog;
pub mod expr;
pub mod storage;
pub mod transaction;
pub mod types;
