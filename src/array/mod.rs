//! In-memory columnar values: typed arrays and row chunks.

use serde::{Deserialize, Serialize};

use crate::types::{DataType, DataTypeExt, DataTypeKind, DataValue};

mod data_chunk;
mod data_chunk_builder;
mod iterator;
mod ops;
mod primitive_array;
mod utf8_array;

pub use self::data_chunk::*;
pub use self::data_chunk_builder::*;
pub use self::iterator::ArrayIter;
pub use self::primitive_array::*;
pub use self::utf8_array::*;

/// A trait over all array builders.
///
/// `ArrayBuilder` is a trait over all builders. You could build an array with
/// `push` with the help of `ArrayBuilder` trait. The `push` function always
/// accepts a reference to an element. e.g. for `PrimitiveArray`,
/// you must do `builder.push(Some(&1))`. For `Utf8Array`, you must do
/// `builder.push(Some("xxx"))`. Note that you don't need to construct a `String`.
pub trait ArrayBuilder: Send + Sync + 'static {
    /// Corresponding `Array` of this builder.
    type Array: Array<Builder = Self>;

    /// Create a new builder with `capacity`.
    fn with_capacity(capacity: usize) -> Self;

    /// Append a value to builder.
    fn push(&mut self, value: Option<&<Self::Array as Array>::Item>);

    /// Finish build and return a new array.
    fn finish(self) -> Self::Array;
}

/// A trait over all arrays.
///
/// The `Builder` associated type is the builder for this array.
/// The `Item` is the item you could retrieve from this array.
pub trait Array: Sized + Send + Sync + 'static {
    /// Corresponding builder of this array.
    type Builder: ArrayBuilder<Array = Self>;

    /// Type of element in the array.
    type Item: ToOwned + ?Sized;

    /// Retrieve a reference to value.
    fn get(&self, idx: usize) -> Option<&Self::Item>;

    /// Number of items of array.
    fn len(&self) -> usize;

    /// Get iterator of current array.
    fn iter(&self) -> ArrayIter<'_, Self> {
        ArrayIter::new(self)
    }

    /// Check if `Array` is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub type BoolArray = PrimitiveArray<bool>;
pub type I32Array = PrimitiveArray<i32>;
pub type I64Array = PrimitiveArray<i64>;
pub type F64Array = PrimitiveArray<f64>;

pub type BoolArrayBuilder = PrimitiveArrayBuilder<bool>;
pub type I32ArrayBuilder = PrimitiveArrayBuilder<i32>;
pub type I64ArrayBuilder = PrimitiveArrayBuilder<i64>;
pub type F64ArrayBuilder = PrimitiveArrayBuilder<f64>;

/// Embeds all types of arrays in the `array` module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrayImpl {
    Bool(BoolArray),
    Int32(I32Array),
    Int64(I64Array),
    Float64(F64Array),
    Utf8(Utf8Array),
}

/// Embeds all types of array builders in the `array` module.
pub enum ArrayBuilderImpl {
    Bool(BoolArrayBuilder),
    Int32(I32ArrayBuilder),
    Int64(I64ArrayBuilder),
    Float64(F64ArrayBuilder),
    Utf8(Utf8ArrayBuilder),
}

macro_rules! impl_into {
    ($x:ty, $y:ident) => {
        impl From<$x> for ArrayImpl {
            fn from(array: $x) -> Self {
                Self::$y(array)
            }
        }
    };
}

impl_into! { BoolArray, Bool }
impl_into! { I32Array, Int32 }
impl_into! { I64Array, Int64 }
impl_into! { F64Array, Float64 }
impl_into! { Utf8Array, Utf8 }

impl ArrayBuilderImpl {
    /// Create a new array builder from the data type.
    pub fn new(ty: &DataType) -> Self {
        Self::with_capacity(0, ty)
    }

    /// Create a new array builder with `capacity` from the data type.
    pub fn with_capacity(capacity: usize, ty: &DataType) -> Self {
        match ty.kind() {
            DataTypeKind::Bool => Self::Bool(BoolArrayBuilder::with_capacity(capacity)),
            DataTypeKind::Int32 => Self::Int32(I32ArrayBuilder::with_capacity(capacity)),
            DataTypeKind::Int64 => Self::Int64(I64ArrayBuilder::with_capacity(capacity)),
            DataTypeKind::Float64 => Self::Float64(F64ArrayBuilder::with_capacity(capacity)),
            DataTypeKind::String => Self::Utf8(Utf8ArrayBuilder::with_capacity(capacity)),
        }
    }

    /// Append a [`DataValue`] to the back of the array.
    ///
    /// # Panics
    ///
    /// Panics if the value type does not match the builder type.
    pub fn push(&mut self, v: &DataValue) {
        match (self, v) {
            (Self::Bool(a), DataValue::Bool(v)) => a.push(Some(v)),
            (Self::Int32(a), DataValue::Int32(v)) => a.push(Some(v)),
            (Self::Int64(a), DataValue::Int64(v)) => a.push(Some(v)),
            (Self::Float64(a), DataValue::Float64(v)) => a.push(Some(v)),
            (Self::Utf8(a), DataValue::String(v)) => a.push(Some(v)),
            (Self::Bool(a), DataValue::Null) => a.push(None),
            (Self::Int32(a), DataValue::Null) => a.push(None),
            (Self::Int64(a), DataValue::Null) => a.push(None),
            (Self::Float64(a), DataValue::Null) => a.push(None),
            (Self::Utf8(a), DataValue::Null) => a.push(None),
            _ => panic!("failed to push value: type mismatch"),
        }
    }

    /// Finish build and return a new array.
    pub fn finish(self) -> ArrayImpl {
        match self {
            Self::Bool(a) => ArrayImpl::Bool(a.finish()),
            Self::Int32(a) => ArrayImpl::Int32(a.finish()),
            Self::Int64(a) => ArrayImpl::Int64(a.finish()),
            Self::Float64(a) => ArrayImpl::Float64(a.finish()),
            Self::Utf8(a) => ArrayImpl::Utf8(a.finish()),
        }
    }
}

impl ArrayImpl {
    /// Get the value at the given index.
    pub fn get(&self, idx: usize) -> DataValue {
        match self {
            Self::Bool(a) => match a.get(idx) {
                Some(val) => DataValue::Bool(*val),
                None => DataValue::Null,
            },
            Self::Int32(a) => match a.get(idx) {
                Some(val) => DataValue::Int32(*val),
                None => DataValue::Null,
            },
            Self::Int64(a) => match a.get(idx) {
                Some(val) => DataValue::Int64(*val),
                None => DataValue::Null,
            },
            Self::Float64(a) => match a.get(idx) {
                Some(val) => DataValue::Float64(*val),
                None => DataValue::Null,
            },
            Self::Utf8(a) => match a.get(idx) {
                Some(val) => DataValue::String(val.to_string()),
                None => DataValue::Null,
            },
        }
    }

    /// Get the value and convert it to string.
    pub fn get_to_string(&self, idx: usize) -> String {
        match self {
            Self::Bool(a) => a.get(idx).map(|v| v.to_string()),
            Self::Int32(a) => a.get(idx).map(|v| v.to_string()),
            Self::Int64(a) => a.get(idx).map(|v| v.to_string()),
            Self::Float64(a) => a.get(idx).map(|v| v.to_string()),
            Self::Utf8(a) => a.get(idx).map(|v| v.to_string()),
        }
        .unwrap_or_else(|| "NULL".into())
    }

    /// Number of items of array.
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(a) => a.len(),
            Self::Int32(a) => a.len(),
            Self::Int64(a) => a.len(),
            Self::Float64(a) => a.len(),
            Self::Utf8(a) => a.len(),
        }
    }

    /// Check if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filter the elements and return a new array.
    pub fn filter(&self, visibility: impl Iterator<Item = bool>) -> Self {
        match self {
            Self::Bool(a) => Self::Bool(filter_array(a, visibility)),
            Self::Int32(a) => Self::Int32(filter_array(a, visibility)),
            Self::Int64(a) => Self::Int64(filter_array(a, visibility)),
            Self::Float64(a) => Self::Float64(filter_array(a, visibility)),
            Self::Utf8(a) => Self::Utf8(filter_array(a, visibility)),
        }
    }

    /// The physical type stored in the array.
    pub fn data_type_kind(&self) -> DataTypeKind {
        match self {
            Self::Bool(_) => DataTypeKind::Bool,
            Self::Int32(_) => DataTypeKind::Int32,
            Self::Int64(_) => DataTypeKind::Int64,
            Self::Float64(_) => DataTypeKind::Float64,
            Self::Utf8(_) => DataTypeKind::String,
        }
    }

    /// The type of the values in the array.
    pub fn data_type(&self) -> DataType {
        self.data_type_kind().not_null()
    }

    /// Create an all-NULL array of the given type.
    pub fn nulls(kind: DataTypeKind, len: usize) -> Self {
        let mut builder = ArrayBuilderImpl::with_capacity(len, &kind.nullable());
        for _ in 0..len {
            builder.push(&DataValue::Null);
        }
        builder.finish()
    }
}

fn filter_array<A: Array>(array: &A, visibility: impl Iterator<Item = bool>) -> A {
    let mut builder = A::Builder::with_capacity(array.len());
    for (value, visible) in array.iter().zip(visibility) {
        if visible {
            builder.push(value);
        }
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter() {
        let array: I32Array = (0..=60).map(Some).collect();
        let filtered = ArrayImpl::Int32(array).filter((0..=60).map(|x| x >= 60));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.get(0), DataValue::Int32(60));
    }

    #[test]
    fn test_builder_push_value() {
        let mut builder = ArrayBuilderImpl::new(&DataTypeKind::Int32.nullable());
        builder.push(&DataValue::Int32(1));
        builder.push(&DataValue::Null);
        let array = builder.finish();
        assert_eq!(array.get(0), DataValue::Int32(1));
        assert_eq!(array.get(1), DataValue::Null);
    }
}
