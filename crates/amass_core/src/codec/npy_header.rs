//! Just enough of the ``.npy`` format to learn an entry's dtype before
//! handing it to ``ndarray-npy``, and to decode the string dtypes it cannot
//! read (AMASS stores ``gender`` as a numpy unicode scalar).

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use ndarray as nd;
use ndarray::ShapeBuilder;
use num_traits::ToPrimitive;
use py_literal::Value as PyValue;
use std::io::{self, Read};

const MAGIC: &[u8; 6] = b"\x93NUMPY";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
    NotApplicable,
}

/// The parsed header dictionary of a ``.npy`` file
#[derive(Clone, Debug, PartialEq)]
pub struct NpyHeader {
    /// The raw ``descr`` entry, a plain string for simple dtypes
    pub descr: PyValue,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

/// Element layout of a simple (non structured) dtype such as ``<f8`` or ``|S4``
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescr {
    pub endianness: Endianness,
    /// Type code with the byte order removed, e.g. ``f8``, ``U4``
    pub code: String,
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

impl NpyHeader {
    /// Reads the magic string, version and header dictionary, leaving
    /// ``reader`` positioned at the start of the array data
    /// # Errors
    /// Will return an error if the stream is not a valid ``.npy`` file
    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut magic = [0_u8; 6];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(invalid("missing npy magic string"));
        }
        let major = reader.read_u8()?;
        let _minor = reader.read_u8()?;
        let header_len = match major {
            1 => usize::from(reader.read_u16::<LittleEndian>()?),
            2 | 3 => reader.read_u32::<LittleEndian>()? as usize,
            _ => return Err(invalid(format!("unknown npy format version {major}"))),
        };
        let mut header = vec![0_u8; header_len];
        reader.read_exact(&mut header)?;
        let header = String::from_utf8(header).map_err(|_| invalid("npy header is not utf8"))?;
        Self::parse(header.trim())
    }

    fn parse(header: &str) -> io::Result<Self> {
        let dict = match header.parse::<PyValue>() {
            Ok(PyValue::Dict(dict)) => dict,
            Ok(_) => return Err(invalid("npy header is not a dictionary")),
            Err(e) => return Err(invalid(format!("npy header does not parse: {e}"))),
        };
        let mut descr = None;
        let mut fortran_order = None;
        let mut shape = None;
        for (key, value) in dict {
            match (key, value) {
                (PyValue::String(k), v) if k == "descr" => descr = Some(v),
                (PyValue::String(k), PyValue::Boolean(b)) if k == "fortran_order" => fortran_order = Some(b),
                (PyValue::String(k), PyValue::Tuple(dims)) if k == "shape" => {
                    let dims = dims
                        .iter()
                        .map(|d| match d {
                            PyValue::Integer(i) => i.to_usize(),
                            _ => None,
                        })
                        .collect::<Option<Vec<usize>>>()
                        .ok_or_else(|| invalid("npy shape is not a tuple of sizes"))?;
                    shape = Some(dims);
                }
                _ => {}
            }
        }
        Ok(Self {
            descr: descr.ok_or_else(|| invalid("npy header has no descr"))?,
            fortran_order: fortran_order.ok_or_else(|| invalid("npy header has no fortran_order"))?,
            shape: shape.ok_or_else(|| invalid("npy header has no shape"))?,
        })
    }

    /// # Errors
    /// Will return an error if the element count overflows
    pub fn num_elements(&self) -> io::Result<usize> {
        self.shape
            .iter()
            .try_fold(1_usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| invalid(format!("npy shape {:?} is too large", self.shape)))
    }

    /// The simple dtype, or ``None`` for structured ones
    pub fn type_descr(&self) -> Option<TypeDescr> {
        let PyValue::String(descr) = &self.descr else {
            return None;
        };
        let (endianness, code) = match descr.chars().next()? {
            '<' => (Endianness::Little, &descr[1..]),
            '>' => (Endianness::Big, &descr[1..]),
            '|' => (Endianness::NotApplicable, &descr[1..]),
            // native order, every platform we target is little endian
            '=' => (Endianness::Little, &descr[1..]),
            _ => (Endianness::NotApplicable, descr.as_str()),
        };
        Some(TypeDescr {
            endianness,
            code: code.to_string(),
        })
    }

    /// ``descr`` formatted for diagnostics
    pub fn descr_string(&self) -> String {
        match &self.descr {
            PyValue::String(s) => s.clone(),
            other => format!("{other:?}"),
        }
    }
}

impl TypeDescr {
    /// Character width for ``U`` (unicode) and ``S``/``a`` (bytes) dtypes
    pub fn text_width(&self) -> Option<(TextKind, usize)> {
        let kind = match self.code.chars().next()? {
            'U' => TextKind::Unicode,
            'S' | 'a' => TextKind::Bytes,
            _ => return None,
        };
        let width = self.code[1..].parse().ok()?;
        Some((kind, width))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextKind {
    Unicode,
    Bytes,
}

/// Decodes the data part of a text ``.npy`` entry. Trailing NULs are padding
/// and get stripped, like numpy does. ``available`` bounds the number of data
/// bytes the header may claim.
/// # Errors
/// Will return an error if the header claims more data than ``available``,
/// the data is truncated or not valid text
pub fn read_text_array<R: Read>(
    reader: &mut R,
    header: &NpyHeader,
    descr: &TypeDescr,
    kind: TextKind,
    width: usize,
    available: u64,
) -> io::Result<nd::ArrayD<String>> {
    let nr_elements = header.num_elements()?;
    let char_bytes = match kind {
        TextKind::Unicode => 4,
        TextKind::Bytes => 1,
    };
    let data_len = nr_elements
        .checked_mul(width)
        .and_then(|n| n.checked_mul(char_bytes))
        .ok_or_else(|| invalid(format!("npy text entry of shape {:?} is too large", header.shape)))?;
    if data_len as u64 > available {
        return Err(invalid(format!("npy header claims {data_len} bytes of text but the entry holds {available}")));
    }
    let mut items = Vec::with_capacity(nr_elements);
    for _ in 0..nr_elements {
        let item = match kind {
            TextKind::Unicode => {
                let mut chars = Vec::with_capacity(width);
                for _ in 0..width {
                    let code_point = match descr.endianness {
                        Endianness::Big => reader.read_u32::<BigEndian>()?,
                        _ => reader.read_u32::<LittleEndian>()?,
                    };
                    chars.push(code_point);
                }
                while chars.last() == Some(&0) {
                    chars.pop();
                }
                chars
                    .into_iter()
                    .map(|c| char::from_u32(c).ok_or_else(|| invalid(format!("invalid code point {c:#x}"))))
                    .collect::<io::Result<String>>()?
            }
            TextKind::Bytes => {
                let mut bytes = vec![0_u8; width];
                reader.read_exact(&mut bytes)?;
                while bytes.last() == Some(&0) {
                    bytes.pop();
                }
                String::from_utf8(bytes).map_err(|_| invalid("byte string is not utf8"))?
            }
        };
        items.push(item);
    }
    let shape = nd::IxDyn(&header.shape);
    let arr = if header.fortran_order {
        nd::ArrayD::from_shape_vec(shape.f(), items)
    } else {
        nd::ArrayD::from_shape_vec(shape, items)
    };
    arr.map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a version 1.0 ``.npy`` file holding unicode strings
    pub(crate) fn unicode_npy(shape: &[usize], items: &[&str]) -> Vec<u8> {
        let width = items.iter().map(|s| s.chars().count()).max().unwrap_or(1).max(1);
        let shape_str = match shape {
            [] => "()".to_string(),
            [n] => format!("({n},)"),
            dims => format!("({})", dims.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")),
        };
        let mut header = format!("{{'descr': '<U{width}', 'fortran_order': False, 'shape': {shape_str}, }}");
        // pad so that magic + version + len + header is a multiple of 64, ending in a newline
        let total = 10 + header.len() + 1;
        header.push_str(&" ".repeat((64 - total % 64) % 64));
        header.push('\n');
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&u16::try_from(header.len()).unwrap().to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        for item in items {
            let mut chars: Vec<u32> = item.chars().map(u32::from).collect();
            chars.resize(width, 0);
            for c in chars {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        out
    }

    #[test]
    fn test_header_parse() {
        let header = NpyHeader::parse("{'descr': '<f8', 'fortran_order': False, 'shape': (120, 156), }").unwrap();
        assert_eq!(header.shape, vec![120, 156]);
        assert!(!header.fortran_order);
        let descr = header.type_descr().unwrap();
        assert_eq!(descr.endianness, Endianness::Little);
        assert_eq!(descr.code, "f8");
        assert_eq!(descr.text_width(), None);
    }

    #[test]
    fn test_scalar_shape() {
        let header = NpyHeader::parse("{'descr': '|S6', 'fortran_order': False, 'shape': (), }").unwrap();
        assert!(header.shape.is_empty());
        assert_eq!(header.num_elements().unwrap(), 1);
        assert_eq!(header.type_descr().unwrap().text_width(), Some((TextKind::Bytes, 6)));
    }

    #[test]
    fn test_structured_descr_has_no_type() {
        let header = NpyHeader::parse("{'descr': [('a', '<i4'), ('b', '<f8')], 'fortran_order': False, 'shape': (2,), }").unwrap();
        assert_eq!(header.type_descr(), None);
    }

    #[test]
    fn test_read_unicode_scalar() {
        let bytes = unicode_npy(&[], &["female"]);
        let mut reader = bytes.as_slice();
        let header = NpyHeader::read(&mut reader).unwrap();
        let descr = header.type_descr().unwrap();
        let (kind, width) = descr.text_width().unwrap();
        assert_eq!((kind, width), (TextKind::Unicode, 6));
        let arr = read_text_array(&mut reader, &header, &descr, kind, width, bytes.len() as u64).unwrap();
        assert_eq!(arr.ndim(), 0);
        assert_eq!(arr.first().unwrap(), "female");
    }

    #[test]
    fn test_read_padded_unicode_vector() {
        let bytes = unicode_npy(&[2], &["male", "female"]);
        let mut reader = bytes.as_slice();
        let header = NpyHeader::read(&mut reader).unwrap();
        let descr = header.type_descr().unwrap();
        let (kind, width) = descr.text_width().unwrap();
        let arr = read_text_array(&mut reader, &header, &descr, kind, width, bytes.len() as u64).unwrap();
        assert_eq!(arr.iter().cloned().collect::<Vec<_>>(), vec!["male".to_string(), "female".to_string()]);
    }

    #[test]
    fn test_overflowing_shape_is_an_error() {
        let header = NpyHeader::parse("{'descr': '<U4', 'fortran_order': False, 'shape': (4294967296, 4294967296, 4294967296), }").unwrap();
        assert!(header.num_elements().is_err());
    }

    #[test]
    fn test_claimed_size_is_bounded_by_entry() {
        let bytes = unicode_npy(&[1_000_000_000_000], &["male"]);
        let mut reader = bytes.as_slice();
        let header = NpyHeader::read(&mut reader).unwrap();
        let descr = header.type_descr().unwrap();
        let (kind, width) = descr.text_width().unwrap();
        let err = read_text_array(&mut reader, &header, &descr, kind, width, bytes.len() as u64).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_bad_magic() {
        let bytes = b"PK\x03\x04garbage".to_vec();
        assert!(NpyHeader::read(&mut bytes.as_slice()).is_err());
    }
}
