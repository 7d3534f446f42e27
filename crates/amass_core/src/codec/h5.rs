use crate::{
    common::{
        record::Record,
        value::{for_each_numeric, NumericArray, Value},
    },
    error::{Error, Result},
};
use amass_utils::io::AtomicFile;
use hdf5::types::VarLenUnicode;
use log::info;
use ndarray as nd;
use std::path::Path;

fn to_unicode(field: &str, text: &nd::ArrayD<String>) -> Result<nd::ArrayD<VarLenUnicode>> {
    let mut out = Vec::with_capacity(text.len());
    for s in text {
        let v = s.parse::<VarLenUnicode>().map_err(|e| Error::Encoding {
            field: field.to_string(),
            reason: format!("cannot be stored as a variable-length string: {e}"),
        })?;
        out.push(v);
    }
    nd::ArrayD::from_shape_vec(text.raw_dim(), out).map_err(|e| Error::Encoding {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

fn write_dataset(file: &hdf5::File, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(arr) => for_each_numeric!(arr, a => {
            file.new_dataset_builder().with_data(a).create(name)?;
        }),
        Value::Text(text) => {
            let unicode = to_unicode(name, text)?;
            file.new_dataset_builder().with_data(&unicode).create(name)?;
        }
        Value::Unsupported { descr, .. } => {
            return Err(Error::Encoding {
                field: name.to_string(),
                reason: format!("has unsupported dtype {descr}"),
            })
        }
    }
    Ok(())
}

/// Writes every field of ``record`` as a top level dataset, keeping dtypes and
/// shapes. The dataset list is logged before anything is created. The file is
/// staged next to ``path`` and only renamed into place once it is closed.
/// # Errors
/// Will return an error if a field cannot be stored or the container cannot be
/// written
pub fn to_file(record: &Record, path: &Path) -> Result<()> {
    record.log_shapes();
    record.check_encodable(false)?;

    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let staged = AtomicFile::new(path).map_err(io_err)?;
    {
        let file = hdf5::File::create(staged.staging_path())?;
        for (name, value) in record {
            write_dataset(&file, name, value)?;
        }
        file.close()?;
    }
    staged.commit().map_err(io_err)?;
    info!("wrote {}", path.display());
    Ok(())
}
