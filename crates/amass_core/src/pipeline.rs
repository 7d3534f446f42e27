use crate::{
    codec::{json, npz::NpzArchive},
    common::{
        options::{PoseConverterConfig, RegressorConverterConfig},
        pose::PoseArchive,
        regressor::RegressorArchive,
    },
    error::Result,
};
use amass_utils::io::FileType;
use log::info;
use std::path::Path;

/// Converts an AMASS animation archive into a JSON document holding the
/// quaternion poses and the body shape fields
/// # Errors
/// Will return an error if the archive cannot be read, a field is missing or
/// malformed, or the document cannot be written. No file is left at ``dst``
/// on error.
pub fn convert_pose_archive(src: &Path, dst: &Path, config: &PoseConverterConfig) -> Result<()> {
    info!("reading pose archive {}", src.display());
    let archive = NpzArchive::from_file(src)?;
    let record = PoseArchive::from_npz(&archive)?.into_record(config)?;
    json::to_file(&record, dst)
}

/// Converts a regressor model archive. A destination with an ``h5``/``hdf5``
/// extension receives every archive entry plus the projected fields, anything
/// else receives a JSON document with just the projection.
/// # Errors
/// Will return an error if the archive cannot be read, its shapes disagree,
/// or the output cannot be written. No file is left at ``dst`` on error.
pub fn convert_regressor_archive(src: &Path, dst: &Path, config: &RegressorConverterConfig) -> Result<()> {
    info!("reading regressor archive {}", src.display());
    let archive = NpzArchive::from_file(src)?;
    let regressor = RegressorArchive::from_npz(&archive)?;
    let projection = regressor.project(config)?;
    match FileType::from_path(dst) {
        FileType::H5 => write_container(&regressor.container_record(&projection), dst),
        FileType::Json | FileType::Npz | FileType::Unknown => json::to_file(&regressor.document_record(&projection), dst),
    }
}

#[cfg(feature = "hdf5")]
fn write_container(record: &crate::common::record::Record, dst: &Path) -> Result<()> {
    crate::codec::h5::to_file(record, dst)
}

#[cfg(not(feature = "hdf5"))]
fn write_container(_record: &crate::common::record::Record, dst: &Path) -> Result<()> {
    Err(crate::error::Error::UnsupportedOutput(format!("hdf5 ({}), rebuild with the `hdf5` feature", dst.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_missing_source_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out.json");
        let res = convert_pose_archive(&dir.path().join("missing.npz"), &dst, &PoseConverterConfig::default());
        assert!(matches!(res, Err(Error::Load { .. })));
        assert!(!dst.exists());
    }

    #[cfg(not(feature = "hdf5"))]
    #[test]
    fn test_container_needs_feature() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("model.h5");
        let res = write_container(&crate::common::record::Record::new(), &dst);
        assert!(matches!(res, Err(Error::UnsupportedOutput(_))));
        assert!(!dst.exists());
    }
}
