use strum_macros::Display;

/// Element types an npz entry can hold and still be carried through the
/// converters. Names follow the numpy spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DType {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}
impl DType {
    /// Maps a numpy type code such as ``f8`` or ``u4`` (byte order already
    /// stripped) to a ``DType``
    pub fn from_type_code(code: &str) -> Option<Self> {
        let dtype = match code {
            "b1" | "?" => Self::Bool,
            "u1" => Self::U8,
            "i1" => Self::I8,
            "u2" => Self::U16,
            "i2" => Self::I16,
            "u4" => Self::U32,
            "i4" => Self::I32,
            "u8" => Self::U64,
            "i8" => Self::I64,
            "f4" => Self::F32,
            "f8" => Self::F64,
            _ => return None,
        };
        Some(dtype)
    }
}

/// Shape rendered the way numpy prints it, e.g. ``(52, 3)``
pub fn shape_string(shape: &[usize]) -> String {
    match shape {
        [] => "()".to_string(),
        [n] => format!("({n},)"),
        _ => {
            let dims: Vec<String> = shape.iter().map(ToString::to_string).collect();
            format!("({})", dims.join(", "))
        }
    }
}
