use super::{
    options::PoseConverterConfig,
    record::{ArchiveRecordBuilder, Record},
    types::shape_string,
    value::{NumericArray, Value},
};
use crate::{
    codec::npz::NpzArchive,
    conversions::pose_quaternion::PoseQuaternionConverter,
    error::{Error, Result},
};
use log::{log, warn};
use ndarray as nd;

pub const POSE_ARCHIVE: &str = "pose";

pub const GENDER: &str = "gender";
pub const BETAS: &str = "betas";
pub const POSES: &str = "poses";
pub const DMPLS: &str = "dmpls";
pub const TRANS: &str = "trans";

/// Fields of a converted pose document, in output order
pub const POSE_OUTPUT_FIELDS: [&str; 5] = [GENDER, TRANS, POSES, BETAS, DMPLS];

/// The fields of an AMASS animation archive the converter reads. Everything
/// but ``poses`` is opaque payload.
#[derive(Clone, Debug)]
pub struct PoseArchive<'a> {
    archive: &'a NpzArchive,
    pub gender: String,
    /// [``nr_frames``, ``num_joints`` * 3] rotation vectors
    pub poses: nd::ArrayD<f64>,
    pub trans: &'a NumericArray,
    pub dmpls: &'a NumericArray,
    pub betas: &'a NumericArray,
}

/// Gender is a categorical scalar. numpy may store it as a 0-d or a single
/// element string array; both collapse to the one string.
fn read_gender(archive: &NpzArchive) -> Result<String> {
    let value = archive.require(POSE_ARCHIVE, GENDER)?;
    let unexpected = || Error::UnexpectedKind {
        field: GENDER.to_string(),
        expected: "a single string",
        found: value.describe(),
    };
    match value {
        Value::Text(text) if text.len() == 1 => text.first().cloned().ok_or_else(unexpected),
        Value::Text(_) | Value::Array(_) | Value::Unsupported { .. } => Err(unexpected()),
    }
}

impl<'a> PoseArchive<'a> {
    /// # Errors
    /// Will return an error if a field is missing, of the wrong kind, or the
    /// translations do not cover every frame
    pub fn from_npz(archive: &'a NpzArchive) -> Result<Self> {
        let gender = read_gender(archive)?;
        let poses = archive.require_numeric(POSE_ARCHIVE, POSES)?.to_f64(POSES)?;
        let trans = archive.require_numeric(POSE_ARCHIVE, TRANS)?;
        let dmpls = archive.require_numeric(POSE_ARCHIVE, DMPLS)?;
        let betas = archive.require_numeric(POSE_ARCHIVE, BETAS)?;
        let pose_archive = Self {
            archive,
            gender,
            poses,
            trans,
            dmpls,
            betas,
        };
        pose_archive.check_frames()?;
        Ok(pose_archive)
    }

    pub fn nr_frames(&self) -> usize {
        self.poses.shape().first().copied().unwrap_or(0)
    }

    fn check_frames(&self) -> Result<()> {
        if self.poses.ndim() < 2 {
            return Err(Error::shape_mismatch(&[POSES], "(frames, joints * 3)", shape_string(self.poses.shape())));
        }
        let nr_frames = self.nr_frames();
        match self.trans.shape() {
            [n, 3] if *n == nr_frames => {}
            other => {
                return Err(Error::shape_mismatch(&[TRANS, POSES], format!("({nr_frames}, 3)"), shape_string(other)));
            }
        }
        if self.dmpls.shape().first() != Some(&nr_frames) {
            warn!(
                "dmpls has shape {} which does not match the {nr_frames} frames of poses",
                shape_string(self.dmpls.shape())
            );
        }
        Ok(())
    }

    /// Mirrors what gets printed when an archive is read
    pub fn log_summary(&self, config: &PoseConverterConfig) {
        let level = config.message_level();
        log!(level, "gender: {}", self.gender);
        log!(level, "betas: {}", shape_string(self.betas.shape()));
        log!(level, "poses: {}", shape_string(self.poses.shape()));
        log!(level, "dmpls: {}", shape_string(self.dmpls.shape()));
        log!(level, "trans: {}", shape_string(self.trans.shape()));
        log!(level, "frames detected: {}", self.nr_frames());
    }

    /// Converts the poses to quaternions and assembles the output record with
    /// the fields of [`POSE_OUTPUT_FIELDS`]
    /// # Errors
    /// Will return an error if the poses cannot be converted
    pub fn into_record(self, config: &PoseConverterConfig) -> Result<Record> {
        self.log_summary(config);
        let converter = PoseQuaternionConverter::new(config.num_joints);
        let poses_as_quaternion = converter.convert(&self.poses.view())?;
        log!(config.message_level(), "poses as quat shape {}", shape_string(poses_as_quaternion.shape()));
        let record = ArchiveRecordBuilder::new(self.archive, POSE_ARCHIVE)
            .derived(GENDER, Value::text(&self.gender))
            .passthrough_numeric(TRANS)?
            .derived(POSES, poses_as_quaternion)
            .passthrough_numeric(BETAS)?
            .passthrough_numeric(DMPLS)?
            .build();
        Ok(record)
    }
}
