// Copyright 2026 StrataDB Project Authors. Licensed under Apache-2.0.

//! The vector operations consumed by the storage write and scan paths.

use itertools::Itertools;

use super::{Array, ArrayImpl};
use crate::types::DataValue;

impl ArrayImpl {
    /// Whether the array contains any NULL value.
    pub fn has_null(&self) -> bool {
        match self {
            Self::Bool(a) => a.has_null(),
            Self::Int32(a) => a.has_null(),
            Self::Int64(a) => a.has_null(),
            Self::Float64(a) => a.has_null(),
            Self::Utf8(a) => a.has_null(),
        }
    }

    /// Whether all non-NULL values in the array are distinct.
    pub fn all_unique(&self) -> bool {
        match self {
            Self::Bool(a) => a.iter().flatten().all_unique(),
            Self::Int32(a) => a.iter().flatten().all_unique(),
            Self::Int64(a) => a.iter().flatten().all_unique(),
            Self::Float64(a) => a.iter().flatten().map(|v| v.to_bits()).all_unique(),
            Self::Utf8(a) => a.iter().flatten().all_unique(),
        }
    }

    /// The minimum and maximum of the non-NULL values, or `None` for an
    /// all-NULL array.
    pub fn nonnull_min_max(&self) -> Option<(DataValue, DataValue)> {
        fn fold<T: Copy, A: Array<Item = T>>(
            a: &A,
            cmp: impl Fn(&T, &T) -> std::cmp::Ordering,
            wrap: impl Fn(T) -> DataValue,
        ) -> Option<(DataValue, DataValue)> {
            let mut iter = a.iter().flatten();
            let first = *iter.next()?;
            let (min, max) = iter.fold((first, first), |(min, max), v| {
                let min = if cmp(v, &min).is_lt() { *v } else { min };
                let max = if cmp(v, &max).is_gt() { *v } else { max };
                (min, max)
            });
            Some((wrap(min), wrap(max)))
        }

        match self {
            Self::Bool(a) => fold(a, bool::cmp, DataValue::Bool),
            Self::Int32(a) => fold(a, i32::cmp, DataValue::Int32),
            Self::Int64(a) => fold(a, i64::cmp, DataValue::Int64),
            Self::Float64(a) => fold(a, |x, y| x.total_cmp(y), DataValue::Float64),
            Self::Utf8(a) => {
                let mut iter = a.iter().flatten();
                let first = iter.next()?;
                let (min, max) = iter.fold((first, first), |(min, max), v| {
                    (min.min(v), max.max(v))
                });
                Some((DataValue::String(min.into()), DataValue::String(max.into())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::I32Array;

    #[test]
    fn test_has_null() {
        let a = ArrayImpl::Int32([Some(1), None, Some(3)].into_iter().collect());
        assert!(a.has_null());
        let b = ArrayImpl::Int32((0..3).collect::<I32Array>());
        assert!(!b.has_null());
    }

    #[test]
    fn test_all_unique_ignores_nulls() {
        let a = ArrayImpl::Int32([Some(1), None, None, Some(2)].into_iter().collect());
        assert!(a.all_unique());
        let b = ArrayImpl::Int32([Some(1), Some(1)].into_iter().collect());
        assert!(!b.all_unique());
    }

    #[test]
    fn test_min_max() {
        let a = ArrayImpl::Int32([Some(5), None, Some(-3), Some(4)].into_iter().collect());
        assert_eq!(
            a.nonnull_min_max(),
            Some((DataValue::Int32(-3), DataValue::Int32(5)))
        );
        let empty = ArrayImpl::Int32([None, None].into_iter().collect::<I32Array>());
        assert_eq!(empty.nonnull_min_max(), None);
    }
}
