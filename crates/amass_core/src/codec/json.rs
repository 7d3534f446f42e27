use crate::{
    common::{
        record::Record,
        value::{for_each_numeric, NumericArray, Value},
    },
    error::{Error, Result},
};
use amass_utils::io::AtomicFile;
use log::info;
use ndarray as nd;
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::ser::PrettyFormatter;
use std::{
    io::{BufWriter, Write},
    path::Path,
};

/// Serializes an n-d array as nested sequences, outermost axis first. A rank
/// 0 array is its single element.
struct Nested<'a, T>(nd::ArrayViewD<'a, T>);

impl<T: Serialize> Serialize for Nested<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.0.ndim() == 0 {
            return match self.0.first() {
                Some(elem) => elem.serialize(serializer),
                None => serializer.serialize_unit(),
            };
        }
        let mut seq = serializer.serialize_seq(Some(self.0.len_of(nd::Axis(0))))?;
        for sub in self.0.axis_iter(nd::Axis(0)) {
            seq.serialize_element(&Nested(sub))?;
        }
        seq.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Array(arr) => for_each_numeric!(arr, a => Nested(a.view()).serialize(serializer)),
            Value::Text(text) => Nested(text.view()).serialize(serializer),
            Value::Unsupported { descr, .. } => Err(S::Error::custom(format!("unsupported dtype {descr}"))),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// the kinds the text format can hold, checked up front so a failure names the field
fn check_json_encodable(record: &Record) -> Result<()> {
    record.check_encodable(true)
}

fn serialize_into<W: Write>(record: &Record, writer: W, path: &Path) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    record.serialize(&mut ser).map_err(|e| {
        if e.is_io() {
            Error::Io {
                path: path.to_path_buf(),
                source: e.into(),
            }
        } else {
            Error::Encoding {
                field: "<document>".to_string(),
                reason: e.to_string(),
            }
        }
    })
}

/// Writes ``record`` as a 4-space indented JSON object, fields in record order
/// # Errors
/// Will return an ``Encoding`` error if a field cannot be represented, or an
/// ``Io`` error if the writer fails
pub fn to_writer<W: Write>(record: &Record, writer: W) -> Result<()> {
    check_json_encodable(record)?;
    serialize_into(record, writer, Path::new("<writer>"))
}

/// # Errors
/// Will return an ``Encoding`` error if a field cannot be represented
pub fn to_string(record: &Record) -> Result<String> {
    let mut buf = Vec::new();
    to_writer(record, &mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::Encoding {
        field: "<document>".to_string(),
        reason: e.to_string(),
    })
}

/// Writes the document to ``path``. The file only appears once it has been
/// written completely; on error nothing is left at ``path``.
/// # Errors
/// Will return an error if the record cannot be encoded or the file cannot be
/// written
pub fn to_file(record: &Record, path: &Path) -> Result<()> {
    check_json_encodable(record)?;
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = AtomicFile::new(path).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(file.as_file_mut());
        serialize_into(record, &mut writer, path)?;
        writer.flush().map_err(io_err)?;
    }
    file.commit().map_err(io_err)?;
    info!("wrote {}", path.display());
    Ok(())
}
