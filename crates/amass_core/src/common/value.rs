use super::types::{shape_string, DType};
use crate::error::{Error, Result};
use ndarray as nd;
use nd::Dimension;
use num_traits::AsPrimitive;

/// A numeric n-d array of any rank (rank 0 is a scalar) keeping the element
/// type it was stored with
#[derive(Clone, Debug, PartialEq)]
pub enum NumericArray {
    Bool(nd::ArrayD<bool>),
    U8(nd::ArrayD<u8>),
    I8(nd::ArrayD<i8>),
    U16(nd::ArrayD<u16>),
    I16(nd::ArrayD<i16>),
    U32(nd::ArrayD<u32>),
    I32(nd::ArrayD<i32>),
    U64(nd::ArrayD<u64>),
    I64(nd::ArrayD<i64>),
    F32(nd::ArrayD<f32>),
    F64(nd::ArrayD<f64>),
}

/// Runs ``$body`` with ``$a`` bound to the inner array of whichever variant
/// ``$arr`` is
macro_rules! for_each_numeric {
    ($arr:expr, $a:ident => $body:expr) => {
        match $arr {
            NumericArray::Bool($a) => $body,
            NumericArray::U8($a) => $body,
            NumericArray::I8($a) => $body,
            NumericArray::U16($a) => $body,
            NumericArray::I16($a) => $body,
            NumericArray::U32($a) => $body,
            NumericArray::I32($a) => $body,
            NumericArray::U64($a) => $body,
            NumericArray::I64($a) => $body,
            NumericArray::F32($a) => $body,
            NumericArray::F64($a) => $body,
        }
    };
}
pub(crate) use for_each_numeric;

fn widen<T: AsPrimitive<f64>>(arr: &nd::ArrayD<T>) -> nd::ArrayD<f64> {
    arr.mapv(AsPrimitive::as_)
}

impl NumericArray {
    pub fn shape(&self) -> &[usize] {
        for_each_numeric!(self, a => a.shape())
    }
    pub fn dtype(&self) -> DType {
        match self {
            Self::Bool(_) => DType::Bool,
            Self::U8(_) => DType::U8,
            Self::I8(_) => DType::I8,
            Self::U16(_) => DType::U16,
            Self::I16(_) => DType::I16,
            Self::U32(_) => DType::U32,
            Self::I32(_) => DType::I32,
            Self::U64(_) => DType::U64,
            Self::I64(_) => DType::I64,
            Self::F32(_) => DType::F32,
            Self::F64(_) => DType::F64,
        }
    }
    /// Widens the array to ``f64`` for the numerical code. Booleans are not
    /// numbers as far as the converters are concerned.
    /// # Errors
    /// Will return an error for boolean arrays
    pub fn to_f64(&self, field: &str) -> Result<nd::ArrayD<f64>> {
        let arr = match self {
            Self::Bool(_) => {
                return Err(Error::UnexpectedKind {
                    field: field.to_string(),
                    expected: "a numeric array",
                    found: "a bool array".to_string(),
                })
            }
            Self::U8(a) => widen(a),
            Self::I8(a) => widen(a),
            Self::U16(a) => widen(a),
            Self::I16(a) => widen(a),
            Self::U32(a) => widen(a),
            Self::I32(a) => widen(a),
            Self::U64(a) => widen(a),
            Self::I64(a) => widen(a),
            Self::F32(a) => widen(a),
            Self::F64(a) => a.clone(),
        };
        Ok(arr)
    }
    /// Index of the first NaN or infinite element in logical order, if any
    pub fn first_non_finite(&self) -> Option<Vec<usize>> {
        match self {
            Self::F32(a) => a.indexed_iter().find(|(_, x)| !x.is_finite()).map(|(idx, _)| idx.slice().to_vec()),
            Self::F64(a) => a.indexed_iter().find(|(_, x)| !x.is_finite()).map(|(idx, _)| idx.slice().to_vec()),
            _ => None,
        }
    }
}

macro_rules! numeric_from {
    ($($t:ty => $variant:ident,)*) => {
        $(impl<D: nd::Dimension> From<nd::Array<$t, D>> for NumericArray {
            fn from(arr: nd::Array<$t, D>) -> Self {
                NumericArray::$variant(arr.into_dyn())
            }
        }
        impl<D: nd::Dimension> From<nd::Array<$t, D>> for Value {
            fn from(arr: nd::Array<$t, D>) -> Self {
                Value::Array(arr.into())
            }
        })*
    };
}
numeric_from!(
    bool => Bool,
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
);

/// Everything a record field or archive entry can be. Entries whose numpy
/// dtype has no counterpart here (objects, complex numbers, structured
/// records...) are kept as ``Unsupported`` so the archive still loads; they
/// only fail once something tries to serialize them.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Array(NumericArray),
    /// Strings of any rank, a rank 0 array is a plain string
    Text(nd::ArrayD<String>),
    Unsupported { descr: String, shape: Vec<usize> },
}
impl Value {
    pub fn text(s: &str) -> Self {
        Value::Text(nd::arr0(s.to_string()).into_dyn())
    }
    pub fn shape(&self) -> &[usize] {
        match self {
            Value::Array(arr) => arr.shape(),
            Value::Text(arr) => arr.shape(),
            Value::Unsupported { shape, .. } => shape,
        }
    }
    /// Human readable kind used in diagnostics, e.g. ``f64 (52, 3)``
    pub fn describe(&self) -> String {
        match self {
            Value::Array(arr) => format!("{} {}", arr.dtype(), shape_string(arr.shape())),
            Value::Text(arr) => format!("text {}", shape_string(arr.shape())),
            Value::Unsupported { descr, shape } => format!("unsupported dtype {descr} {}", shape_string(shape)),
        }
    }
    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }
    pub fn as_text(&self) -> Option<&nd::ArrayD<String>> {
        match self {
            Value::Text(arr) => Some(arr),
            _ => None,
        }
    }
}
impl From<NumericArray> for Value {
    fn from(arr: NumericArray) -> Self {
        Value::Array(arr)
    }
}
impl<D: nd::Dimension> From<nd::Array<String, D>> for Value {
    fn from(arr: nd::Array<String, D>) -> Self {
        Value::Text(arr.into_dyn())
    }
}
