pub mod options;
pub mod pose;
pub mod record;
pub mod regressor;
pub mod types;
pub mod value;
