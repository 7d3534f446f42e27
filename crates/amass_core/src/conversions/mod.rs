pub mod joint_regressor;
pub mod pose_quaternion;
