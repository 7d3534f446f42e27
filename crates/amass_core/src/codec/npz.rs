use super::npy_header::{read_text_array, NpyHeader};
use crate::{
    common::{
        record::Record,
        types::DType,
        value::{NumericArray, Value},
    },
    error::{Error, Result},
};
use log::{debug, info};
use ndarray_npy::{NpzReader, ReadNpzError};
use std::{
    io::{Cursor, Read, Seek},
    path::{Path, PathBuf},
};

/// The contents of an ``.npz`` archive: every entry decoded by its dtype, in
/// the order the entries are stored
#[derive(Clone, Debug, Default)]
pub struct NpzArchive {
    pub source: Option<PathBuf>,
    pub entries: Record,
}

fn read_numeric<R: Read + Seek>(npz: &mut NpzReader<R>, name: &str, dtype: DType) -> std::result::Result<NumericArray, ReadNpzError> {
    let arr = match dtype {
        DType::Bool => NumericArray::Bool(npz.by_name(name)?),
        DType::U8 => NumericArray::U8(npz.by_name(name)?),
        DType::I8 => NumericArray::I8(npz.by_name(name)?),
        DType::U16 => NumericArray::U16(npz.by_name(name)?),
        DType::I16 => NumericArray::I16(npz.by_name(name)?),
        DType::U32 => NumericArray::U32(npz.by_name(name)?),
        DType::I32 => NumericArray::I32(npz.by_name(name)?),
        DType::U64 => NumericArray::U64(npz.by_name(name)?),
        DType::I64 => NumericArray::I64(npz.by_name(name)?),
        DType::F32 => NumericArray::F32(npz.by_name(name)?),
        DType::F64 => NumericArray::F64(npz.by_name(name)?),
    };
    Ok(arr)
}

impl NpzArchive {
    /// Loads every entry of the archive at ``path``. Any failure is fatal,
    /// there is no partially loaded archive.
    /// # Errors
    /// Will return an error if the file cannot be read, is not a zip archive or
    /// one of its entries cannot be decoded
    pub fn from_file(path: &Path) -> Result<Self> {
        info!("loading archive {}", path.display());
        let buf = std::fs::read(path).map_err(|source| Error::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = Self::from_buf_with_source(&buf, path)?;
        archive.source = Some(path.to_path_buf());
        Ok(archive)
    }

    /// # Errors
    /// Will return an error if ``buf`` is not a zip archive or one of its
    /// entries cannot be decoded
    pub fn from_buf(buf: &[u8]) -> Result<Self> {
        Self::from_buf_with_source(buf, Path::new("<buffer>"))
    }

    fn from_buf_with_source(buf: &[u8], path: &Path) -> Result<Self> {
        let corrupt = |reason: String| Error::CorruptArchive {
            path: path.to_path_buf(),
            reason,
        };
        let mut zip = zip::ZipArchive::new(Cursor::new(buf)).map_err(|e| corrupt(e.to_string()))?;
        let mut npz = NpzReader::new(Cursor::new(buf)).map_err(|e| corrupt(e.to_string()))?;
        debug!("npz names is {:?}", zip.file_names().collect::<Vec<_>>());

        let mut entries = Record::new();
        for idx in 0..zip.len() {
            let mut entry = zip.by_index(idx).map_err(|e| corrupt(e.to_string()))?;
            if entry.is_dir() {
                continue;
            }
            let entry_name = entry.name().to_string();
            let entry_size = entry.size();
            let field = entry_name.strip_suffix(".npy").unwrap_or(&entry_name).to_string();
            let entry_err = |reason: String| Error::Entry {
                field: field.clone(),
                reason,
            };
            let header = NpyHeader::read(&mut entry).map_err(|e| entry_err(e.to_string()))?;
            let descr = header.type_descr();
            let value = match descr.as_ref().and_then(|d| d.text_width().map(|tw| (d, tw))) {
                Some((descr, (kind, width))) => {
                    let text = read_text_array(&mut entry, &header, descr, kind, width, entry_size).map_err(|e| entry_err(e.to_string()))?;
                    Value::Text(text)
                }
                None => match descr.as_ref().and_then(|d| DType::from_type_code(&d.code)) {
                    Some(dtype) => {
                        let arr = read_numeric(&mut npz, &entry_name, dtype).map_err(|e| entry_err(e.to_string()))?;
                        Value::Array(arr)
                    }
                    None => {
                        debug!("entry {field} has dtype {} which is carried as unsupported", header.descr_string());
                        Value::Unsupported {
                            descr: header.descr_string(),
                            shape: header.shape.clone(),
                        }
                    }
                },
            };
            entries.insert(&field, value);
        }
        Ok(Self { source: None, entries })
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries.get(field)
    }

    /// # Errors
    /// Will return a ``MissingField`` error if ``field`` is not in the archive
    pub fn require(&self, archive: &'static str, field: &str) -> Result<&Value> {
        self.get(field).ok_or_else(|| Error::MissingField {
            archive,
            field: field.to_string(),
        })
    }

    /// # Errors
    /// Will return an error if ``field`` is missing or not numeric
    pub fn require_numeric(&self, archive: &'static str, field: &str) -> Result<&NumericArray> {
        let value = self.require(archive, field)?;
        value.as_numeric().ok_or_else(|| Error::UnexpectedKind {
            field: field.to_string(),
            expected: "a numeric array",
            found: value.describe(),
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::npy_header::tests::unicode_npy;
    use ndarray::prelude::*;
    use ndarray_npy::NpzWriter;
    use std::io::Write;

    fn numeric_npz() -> Vec<u8> {
        let mut npz = NpzWriter::new(Cursor::new(Vec::new()));
        npz.add_array("betas", &array![0.5_f64, -1.0, 2.0]).unwrap();
        npz.add_array("f", &array![[0_u32, 1, 2], [2, 1, 3]]).unwrap();
        npz.add_array("weights", &Array2::<f32>::ones((4, 2))).unwrap();
        npz.finish().unwrap().into_inner()
    }

    #[test]
    fn test_numeric_entries_keep_dtype_and_order() {
        let archive = NpzArchive::from_buf(&numeric_npz()).unwrap();
        assert_eq!(archive.names().collect::<Vec<_>>(), vec!["betas", "f", "weights"]);
        let f = archive.require_numeric("model", "f").unwrap();
        assert_eq!(f.dtype(), DType::U32);
        assert_eq!(f.shape(), &[2, 3]);
        let weights = archive.require_numeric("model", "weights").unwrap();
        assert_eq!(weights.dtype(), DType::F32);
    }

    #[test]
    fn test_text_and_unsupported_entries() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("gender.npy", opts).unwrap();
        zip.write_all(&unicode_npy(&[], &["male"])).unwrap();
        zip.start_file("bs_type.npy", opts).unwrap();
        let mut object = unicode_npy(&[], &["x"]);
        // patch the dtype into an object dtype, the payload is never read
        let pos = object.windows(4).position(|w| w == b"<U1'").unwrap();
        object[pos..pos + 3].copy_from_slice(b"|O'");
        object[pos + 3] = b' ';
        zip.write_all(&object).unwrap();
        let buf = zip.finish().unwrap().into_inner();

        let archive = NpzArchive::from_buf(&buf).unwrap();
        let gender = archive.get("gender").unwrap().as_text().unwrap();
        assert_eq!(gender.first().unwrap(), "male");
        assert!(matches!(archive.get("bs_type"), Some(Value::Unsupported { descr, .. }) if descr == "|O"));
    }

    fn gender_only_npz(npy: &[u8]) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let opts = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("gender.npy", opts).unwrap();
        zip.write_all(npy).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_oversized_text_shape_is_an_entry_error() {
        let buf = gender_only_npz(&unicode_npy(&[1_000_000_000_000], &["male"]));
        match NpzArchive::from_buf(&buf) {
            Err(Error::Entry { field, .. }) => assert_eq!(field, "gender"),
            other => panic!("expected an entry error, got {other:?}"),
        }
        let buf = gender_only_npz(&unicode_npy(&[4_294_967_296, 4_294_967_296, 4_294_967_296], &["male"]));
        assert!(matches!(NpzArchive::from_buf(&buf), Err(Error::Entry { .. })));
    }

    #[test]
    fn test_missing_field() {
        let archive = NpzArchive::from_buf(&numeric_npz()).unwrap();
        assert!(matches!(archive.require("pose", "poses"), Err(Error::MissingField { .. })));
        assert!(matches!(archive.require_numeric("pose", "betas"), Ok(_)));
    }

    #[test]
    fn test_garbage_is_a_load_error() {
        assert!(matches!(NpzArchive::from_buf(b"definitely not a zip"), Err(Error::CorruptArchive { .. })));
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = NpzArchive::from_file(&dir.path().join("nope.npz"));
        assert!(matches!(res, Err(Error::Load { .. })));
    }
}
