use crate::{
    error::{Error, Result},
    smpl_h::smpl_h,
};
use amass_utils::numerical::batch_rotvec_to_quat;
use log::debug;
use ndarray as nd;

/// Re-encodes per frame, per joint exponential rotation vectors as unit
/// quaternions in (x, y, z, w) order
#[derive(Clone, Copy, Debug)]
pub struct PoseQuaternionConverter {
    num_joints: usize,
}
impl Default for PoseQuaternionConverter {
    fn default() -> Self {
        Self::new(smpl_h::NUM_JOINTS + 1)
    }
}
impl PoseQuaternionConverter {
    pub fn new(num_joints: usize) -> Self {
        Self { num_joints }
    }
    pub fn num_joints(&self) -> usize {
        self.num_joints
    }

    /// Takes ``poses`` either flattened as [``nr_frames``, ``num_joints`` * 3]
    /// (the AMASS layout) or already split as [``nr_frames``, ``num_joints``,
    /// 3] and returns [``nr_frames``, ``num_joints``, 4]. The input is not
    /// modified.
    /// # Errors
    /// Will return a ``ShapeMismatch`` if the pose width does not match the
    /// joint count and ``NonFinite`` if any component is NaN or infinite
    pub fn convert(&self, poses: &nd::ArrayViewD<f64>) -> Result<nd::Array3<f64>> {
        let rotvecs = self.split_joints(poses)?;
        if let Some(((frame, joint, _), _)) = rotvecs.indexed_iter().find(|(_, x)| !x.is_finite()) {
            return Err(Error::NonFinite {
                field: "poses".to_string(),
                frame,
                joint,
            });
        }
        let quats = batch_rotvec_to_quat(&rotvecs.view());
        debug_assert_eq!(quats.dim().2, smpl_h::QUATERNION_DIMS);
        debug!("converted {} frames of {} joints to quaternions", quats.dim().0, quats.dim().1);
        Ok(quats)
    }

    fn split_joints<'a>(&self, poses: &'a nd::ArrayViewD<'_, f64>) -> Result<nd::CowArray<'a, f64, nd::Ix3>> {
        let expected_width = self.num_joints * smpl_h::ROTATION_VECTOR_DIMS;
        let mismatch = || {
            Error::shape_mismatch(
                &["poses"],
                format!(
                    "(frames, {expected_width}) or (frames, {}, {})",
                    self.num_joints,
                    smpl_h::ROTATION_VECTOR_DIMS
                ),
                format!("{:?}", poses.shape()),
            )
        };
        match *poses.shape() {
            [nr_frames, width] if width == expected_width => {
                let shape = (nr_frames, self.num_joints, smpl_h::ROTATION_VECTOR_DIMS);
                poses.to_shape(shape).map_err(|_| mismatch())
            }
            [_, joints, dims] if joints == self.num_joints && dims == smpl_h::ROTATION_VECTOR_DIMS => {
                let view = poses.view().into_dimensionality::<nd::Ix3>().map_err(|_| mismatch())?;
                Ok(nd::CowArray::from(view))
            }
            _ => Err(mismatch()),
        }
    }
}
