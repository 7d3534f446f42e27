use crate::smpl_h::smpl_h;
use log::Level;

/// Options for converting an AMASS pose archive
#[derive(Clone, Debug)]
pub struct PoseConverterConfig {
    /// Rotations per frame, including the root
    pub num_joints: usize,
    /// Log the loaded fields at info level instead of debug
    pub show_messages: bool,
}
impl Default for PoseConverterConfig {
    fn default() -> Self {
        Self {
            num_joints: smpl_h::NUM_JOINTS + 1,
            show_messages: true,
        }
    }
}
impl PoseConverterConfig {
    pub fn message_level(&self) -> Level {
        message_level(self.show_messages)
    }
}

/// Options for converting a regressor model archive
#[derive(Clone, Debug)]
pub struct RegressorConverterConfig {
    pub show_messages: bool,
}
impl Default for RegressorConverterConfig {
    fn default() -> Self {
        Self { show_messages: true }
    }
}
impl RegressorConverterConfig {
    pub fn message_level(&self) -> Level {
        message_level(self.show_messages)
    }
}

fn message_level(show_messages: bool) -> Level {
    if show_messages {
        Level::Info
    } else {
        Level::Debug
    }
}
