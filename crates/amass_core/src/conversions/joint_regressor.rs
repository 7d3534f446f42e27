use crate::error::{Error, Result};
use amass_utils::numerical::{blend_basis, contract_vertex_axis};
use log::debug;
use ndarray as nd;

/// The vertex-space part of an SMPL-H model needed to locate joints
#[derive(Clone, Debug)]
pub struct RegressorModel {
    /// [``nr_verts``, 3]
    v_template: nd::Array2<f64>,
    /// [``nr_joints``, ``nr_verts``]
    joint_regressor: nd::Array2<f64>,
    /// [``nr_verts``, 3, ``shape_space_dim``]
    shape_dirs: nd::Array3<f64>,
}

/// The regressor re-expressed purely in terms of joints. Joint positions for
/// shape coefficients β are ``joint_template + joint_regressor·β``, no vertex
/// data required.
#[derive(Clone, Debug, PartialEq)]
pub struct JointSpaceProjection {
    /// [``nr_joints``, 3]
    pub joint_template: nd::Array2<f64>,
    /// [``nr_joints``, 3, ``shape_space_dim``]
    pub joint_regressor: nd::Array3<f64>,
}

fn into_rank<D: nd::Dimension>(arr: nd::ArrayD<f64>, field: &str) -> Result<nd::Array<f64, D>> {
    let found = format!("{:?}", arr.shape());
    arr.into_dimensionality::<D>().map_err(|_| {
        Error::shape_mismatch(&[field], format!("an array of rank {}", D::NDIM.unwrap_or(0)), found)
    })
}

impl RegressorModel {
    /// # Errors
    /// Will return a ``ShapeMismatch`` naming the offending fields if the
    /// vertex axes disagree or the spatial axes are not of length 3
    pub fn new(v_template: nd::Array2<f64>, joint_regressor: nd::Array2<f64>, shape_dirs: nd::Array3<f64>) -> Result<Self> {
        let (nr_verts, spatial) = v_template.dim();
        if spatial != 3 {
            return Err(Error::shape_mismatch(&["v_template"], "(vertices, 3)", format!("{:?}", v_template.shape())));
        }
        if joint_regressor.ncols() != nr_verts {
            return Err(Error::shape_mismatch(
                &["J_regressor", "v_template"],
                format!("(joints, {nr_verts})"),
                format!("{:?}", joint_regressor.shape()),
            ));
        }
        let (nr_verts_dirs, spatial_dirs, _) = shape_dirs.dim();
        if nr_verts_dirs != nr_verts || spatial_dirs != 3 {
            return Err(Error::shape_mismatch(
                &["shapedirs", "v_template"],
                format!("({nr_verts}, 3, shape_dims)"),
                format!("{:?}", shape_dirs.shape()),
            ));
        }
        Ok(Self {
            v_template,
            joint_regressor,
            shape_dirs,
        })
    }

    /// Same as ``new`` but from arrays of unchecked rank, as they come out of
    /// an archive
    /// # Errors
    /// Will return a ``ShapeMismatch`` if a rank is wrong or the axes disagree
    pub fn from_dyn(v_template: nd::ArrayD<f64>, joint_regressor: nd::ArrayD<f64>, shape_dirs: nd::ArrayD<f64>) -> Result<Self> {
        Self::new(
            into_rank(v_template, "v_template")?,
            into_rank(joint_regressor, "J_regressor")?,
            into_rank(shape_dirs, "shapedirs")?,
        )
    }

    pub fn v_template(&self) -> &nd::Array2<f64> {
        &self.v_template
    }
    pub fn joint_regressor(&self) -> &nd::Array2<f64> {
        &self.joint_regressor
    }
    pub fn shape_dirs(&self) -> &nd::Array3<f64> {
        &self.shape_dirs
    }
    pub fn num_verts(&self) -> usize {
        self.v_template.nrows()
    }
    pub fn num_joints(&self) -> usize {
        self.joint_regressor.nrows()
    }
    pub fn shape_space_dim(&self) -> usize {
        self.shape_dirs.dim().2
    }

    /// Projects template and shape basis through the joint regressor
    /// # Errors
    /// Will return a ``ShapeMismatch`` if the contraction cannot be reshaped,
    /// which only happens for inconsistent inputs
    pub fn project(&self) -> Result<JointSpaceProjection> {
        let joint_template = self.joint_regressor.dot(&self.v_template);
        let joint_regressor = contract_vertex_axis(&self.joint_regressor.view(), &self.shape_dirs.view())
            .map_err(|e| Error::shape_mismatch(&["J_regressor", "shapedirs"], "a contractible vertex axis", e))?;
        debug!("joint_template: {:?}", joint_template.shape());
        debug!("joint_regressor: {:?}", joint_regressor.shape());
        Ok(JointSpaceProjection {
            joint_template,
            joint_regressor,
        })
    }

    /// Joint locations computed the long way round: shape the vertices with
    /// ``betas`` and regress the joints from them
    /// # Errors
    /// Will return a ``ShapeMismatch`` if there are more betas than shape
    /// directions
    pub fn joint_locations(&self, betas: &nd::ArrayView1<f64>) -> Result<nd::Array2<f64>> {
        check_betas(betas, self.shape_space_dim())?;
        let verts_shaped = &self.v_template + &blend_basis(&self.shape_dirs.view(), betas);
        Ok(self.joint_regressor.dot(&verts_shaped))
    }
}

fn check_betas(betas: &nd::ArrayView1<f64>, shape_space_dim: usize) -> Result<()> {
    if betas.len() > shape_space_dim {
        return Err(Error::shape_mismatch(
            &["betas", "joint_regressor"],
            format!("at most {shape_space_dim} shape coefficients"),
            betas.len(),
        ));
    }
    Ok(())
}

impl JointSpaceProjection {
    pub fn num_joints(&self) -> usize {
        self.joint_template.nrows()
    }
    pub fn shape_space_dim(&self) -> usize {
        self.joint_regressor.dim().2
    }

    /// ``joint_template + joint_regressor·betas``. Fewer betas than shape
    /// directions is fine, the rest count as zero.
    /// # Errors
    /// Will return a ``ShapeMismatch`` if there are more betas than shape
    /// directions
    pub fn joint_locations(&self, betas: &nd::ArrayView1<f64>) -> Result<nd::Array2<f64>> {
        check_betas(betas, self.shape_space_dim())?;
        Ok(&self.joint_template + &blend_basis(&self.joint_regressor.view(), betas))
    }

    /// Joint locations relative to the root joint
    /// # Errors
    /// Will return a ``ShapeMismatch`` if there are more betas than shape
    /// directions
    pub fn joint_locations_recentered(&self, betas: &nd::ArrayView1<f64>) -> Result<nd::Array2<f64>> {
        let mut joints = self.joint_locations(betas)?;
        if joints.nrows() > 0 {
            let root = joints.row(0).to_owned();
            joints -= &root;
        }
        Ok(joints)
    }
}
