use super::{
    options::RegressorConverterConfig,
    record::{ArchiveRecordBuilder, Record},
    types::shape_string,
};
use crate::{
    codec::npz::NpzArchive,
    conversions::joint_regressor::{JointSpaceProjection, RegressorModel},
    error::Result,
};
use log::log;

pub const REGRESSOR_ARCHIVE: &str = "regressor";

pub const V_TEMPLATE: &str = "v_template";
pub const J_REGRESSOR: &str = "J_regressor";
pub const SHAPEDIRS: &str = "shapedirs";

pub const JOINT_TEMPLATE: &str = "joint_template";
pub const JOINT_REGRESSOR: &str = "joint_regressor";
/// Names of the projected datasets when the whole model is written to a
/// container
pub const FBX_JOINT_TEMPLATE: &str = "fbx_joint_template";
pub const FBX_JOINT_REGRESSOR: &str = "fbx_joint_regressor";

/// Fields of a converted regressor document, in output order
pub const REGRESSOR_OUTPUT_FIELDS: [&str; 2] = [JOINT_TEMPLATE, JOINT_REGRESSOR];

/// A model archive together with the part of it the projection needs
pub struct RegressorArchive<'a> {
    archive: &'a NpzArchive,
    pub model: RegressorModel,
}
impl<'a> RegressorArchive<'a> {
    /// # Errors
    /// Will return an error if a field is missing, not numeric, or the shapes
    /// of the fields disagree
    pub fn from_npz(archive: &'a NpzArchive) -> Result<Self> {
        let v_template = archive.require_numeric(REGRESSOR_ARCHIVE, V_TEMPLATE)?.to_f64(V_TEMPLATE)?;
        let joint_regressor = archive.require_numeric(REGRESSOR_ARCHIVE, J_REGRESSOR)?.to_f64(J_REGRESSOR)?;
        let shape_dirs = archive.require_numeric(REGRESSOR_ARCHIVE, SHAPEDIRS)?.to_f64(SHAPEDIRS)?;
        let model = RegressorModel::from_dyn(v_template, joint_regressor, shape_dirs)?;
        Ok(Self { archive, model })
    }

    /// # Errors
    /// Will return an error if the projection fails
    pub fn project(&self, config: &RegressorConverterConfig) -> Result<JointSpaceProjection> {
        let projection = self.model.project()?;
        let level = config.message_level();
        log!(level, "{JOINT_TEMPLATE}: {}", shape_string(projection.joint_template.shape()));
        log!(level, "{JOINT_REGRESSOR}: {}", shape_string(projection.joint_regressor.shape()));
        Ok(projection)
    }

    /// The text document: only the projection, see [`REGRESSOR_OUTPUT_FIELDS`]
    pub fn document_record(&self, projection: &JointSpaceProjection) -> Record {
        ArchiveRecordBuilder::new(self.archive, REGRESSOR_ARCHIVE)
            .derived(JOINT_TEMPLATE, projection.joint_template.clone())
            .derived(JOINT_REGRESSOR, projection.joint_regressor.clone())
            .build()
    }

    /// The container: every archive entry verbatim followed by the projection
    pub fn container_record(&self, projection: &JointSpaceProjection) -> Record {
        ArchiveRecordBuilder::new(self.archive, REGRESSOR_ARCHIVE)
            .passthrough_all()
            .derived(FBX_JOINT_TEMPLATE, projection.joint_template.clone())
            .derived(FBX_JOINT_REGRESSOR, projection.joint_regressor.clone())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::value::Value, error::Error};
    use ndarray::prelude::*;

    fn model_archive() -> NpzArchive {
        NpzArchive {
            source: None,
            entries: Record::new()
                .with("f", array![[0_u32, 1, 2]])
                .with(V_TEMPLATE, Array2::from_shape_fn((4, 3), |(v, d)| (v + d) as f32))
                .with(J_REGRESSOR, array![[0.25_f64, 0.25, 0.25, 0.25], [1.0, 0.0, 0.0, 0.0]])
                .with(SHAPEDIRS, Array3::<f32>::ones((4, 3, 2))),
        }
    }

    #[test]
    fn test_document_record_has_only_projection() {
        let npz = model_archive();
        let regressor = RegressorArchive::from_npz(&npz).unwrap();
        let projection = regressor.project(&RegressorConverterConfig::default()).unwrap();
        let record = regressor.document_record(&projection);
        assert_eq!(record.names().collect::<Vec<_>>(), REGRESSOR_OUTPUT_FIELDS.to_vec());
        assert_eq!(record.get(JOINT_TEMPLATE).unwrap().shape(), &[2, 3]);
        assert_eq!(record.get(JOINT_REGRESSOR).unwrap().shape(), &[2, 3, 2]);
    }

    #[test]
    fn test_container_record_passes_everything_through() {
        let npz = model_archive();
        let regressor = RegressorArchive::from_npz(&npz).unwrap();
        let projection = regressor.project(&RegressorConverterConfig::default()).unwrap();
        let record = regressor.container_record(&projection);
        assert_eq!(
            record.names().collect::<Vec<_>>(),
            vec!["f", V_TEMPLATE, J_REGRESSOR, SHAPEDIRS, FBX_JOINT_TEMPLATE, FBX_JOINT_REGRESSOR]
        );
        // verbatim, dtype included
        assert_eq!(record.get(V_TEMPLATE), npz.get(V_TEMPLATE));
        assert_eq!(record.get(FBX_JOINT_TEMPLATE), Some(&Value::from(projection.joint_template.clone())));
    }

    #[test]
    fn test_missing_shapedirs() {
        let mut npz = model_archive();
        npz.entries = Record::new()
            .with(V_TEMPLATE, Array2::<f64>::zeros((4, 3)))
            .with(J_REGRESSOR, Array2::<f64>::zeros((2, 4)));
        assert!(matches!(RegressorArchive::from_npz(&npz), Err(Error::MissingField { .. })));
    }
}
