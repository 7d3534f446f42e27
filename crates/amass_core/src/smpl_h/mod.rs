#[allow(clippy::module_inception)]
pub mod smpl_h;
