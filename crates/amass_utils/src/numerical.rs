use nalgebra as na;
use ndarray as nd;

/// Converts a single exponential rotation vector (axis scaled by the angle in
/// radians) into a unit quaternion. The zero vector maps to the identity.
pub fn rotvec_to_quat(x: f64, y: f64, z: f64) -> na::UnitQuaternion<f64> {
    na::UnitQuaternion::from_scaled_axis(na::Vector3::new(x, y, z))
}

/// Same as [`rotvec_to_quat`] but returns the raw components in (x, y, z, w)
/// order, which is what nalgebra stores in ``Quaternion::coords``
pub fn rotvec_to_quat_xyzw(x: f64, y: f64, z: f64) -> [f64; 4] {
    let q = rotvec_to_quat(x, y, z);
    let c = q.coords;
    [c.x, c.y, c.z, c.w]
}

/// Converts a batch of rotation vectors of shape [``nr_frames``,
/// ``nr_joints``, 3] into quaternions of shape [``nr_frames``, ``nr_joints``,
/// 4] in (x, y, z, w) order. Every (frame, joint) pair is independent so the
/// lanes are processed in parallel.
///
/// # Panics
/// Will panic if the last axis of ``rotvecs`` is not of length 3
pub fn batch_rotvec_to_quat(rotvecs: &nd::ArrayView3<f64>) -> nd::Array3<f64> {
    let (nr_frames, nr_joints, dims) = rotvecs.dim();
    assert_eq!(dims, 3, "rotation vectors need to have 3 components, got {dims}");
    let mut quats = nd::Array3::<f64>::zeros((nr_frames, nr_joints, 4));
    nd::Zip::from(quats.lanes_mut(nd::Axis(2)))
        .and(rotvecs.lanes(nd::Axis(2)))
        .par_for_each(|mut quat, rotvec| {
            let q = rotvec_to_quat_xyzw(rotvec[0], rotvec[1], rotvec[2]);
            quat.assign(&nd::aview1(&q));
        });
    quats
}

/// Contracts the vertex axis of a [``nr_joints``, ``nr_verts``] regressor
/// against the first axis of a [``nr_verts``, d, k] tensor, i.e.
/// ``out[i, d, k] = sum_v regressor[i, v] * tensor[v, d, k]``. Equivalent of
/// ``np.einsum('ij,jkl->ikl', regressor, tensor)``.
/// # Errors
/// Will return an ``IncompatibleShape`` error if the vertex axes of the two
/// inputs disagree
pub fn contract_vertex_axis(regressor: &nd::ArrayView2<f64>, tensor: &nd::ArrayView3<f64>) -> Result<nd::Array3<f64>, nd::ShapeError> {
    let (nr_joints, nr_verts) = regressor.dim();
    let (nr_verts_tensor, d, k) = tensor.dim();
    if nr_verts != nr_verts_tensor {
        return Err(nd::ShapeError::from_kind(nd::ErrorKind::IncompatibleShape));
    }
    //flatten the trailing axes so the contraction becomes a plain matmul
    let tensor_flat = tensor.to_shape((nr_verts, d * k))?;
    let res = regressor.dot(&tensor_flat);
    res.into_shape_with_order((nr_joints, d, k))
}

/// Evaluates a linear blend of a [v, 3, d] basis with ``coeffs`` of length at
/// most d, returning [v, 3]. Coefficients past ``coeffs.len()`` are treated as
/// zero.
///
/// # Panics
/// Will panic if there are more coefficients than basis directions
pub fn blend_basis(basis: &nd::ArrayView3<f64>, coeffs: &nd::ArrayView1<f64>) -> nd::Array2<f64> {
    let (nr_rows, nr_cols, nr_dirs) = basis.dim();
    let nr_coeffs = coeffs.len();
    assert!(nr_coeffs <= nr_dirs, "got {nr_coeffs} coefficients for a basis of {nr_dirs} directions");
    let mut res = nd::Array2::<f64>::zeros((nr_rows, nr_cols));
    for (idx, &c) in coeffs.iter().enumerate() {
        res.scaled_add(c, &basis.index_axis(nd::Axis(2), idx));
    }
    res
}
