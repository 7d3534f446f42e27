/// Joints after the root
pub const NUM_BODY_JOINTS: usize = 21;
pub const NUM_HAND_JOINTS: usize = 15;
/// Joints excluding the root, so a full pose has ``NUM_JOINTS + 1`` rotations
pub const NUM_JOINTS: usize = NUM_BODY_JOINTS + 2 * NUM_HAND_JOINTS;
pub const ROTATION_VECTOR_DIMS: usize = 3;
pub const QUATERNION_DIMS: usize = 4;
