// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

use crate::array::ArrayImpl;
use crate::types::DataValue;

/// A running summary of one column: minimum, maximum and NULL presence.
///
/// Statistics are advisory. They are maintained under the append latch (or
/// the chunk lock on update) and may be read without coordination; a reader
/// can observe values that are slightly stale but never values that shrink
/// the covered range.
#[derive(Debug, Default, Clone)]
pub struct ColumnStatistics {
    has_null: bool,
    min: Option<DataValue>,
    max: Option<DataValue>,
}

impl ColumnStatistics {
    /// Fold the values of `array` into the summary.
    pub fn update(&mut self, array: &ArrayImpl) {
        if array.has_null() {
            self.has_null = true;
        }
        if let Some((min, max)) = array.nonnull_min_max() {
            self.min = Some(match self.min.take() {
                Some(old) if old < min => old,
                _ => min,
            });
            self.max = Some(match self.max.take() {
                Some(old) if old > max => old,
                _ => max,
            });
        }
    }

    pub fn has_null(&self) -> bool {
        self.has_null
    }

    pub fn min(&self) -> Option<&DataValue> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&DataValue> {
        self.max.as_ref()
    }
}
