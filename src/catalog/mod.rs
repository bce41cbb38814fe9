// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! Table and column metadata, including bound constraints.

use std::sync::Arc;

mod column;
mod constraint;
mod table;

pub use self::column::*;
pub use self::constraint::*;
pub use self::table::*;

pub use crate::types::{ColumnId, TableId};

pub type TableCatalogRef = Arc<TableCatalog>;
