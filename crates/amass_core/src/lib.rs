//! ## Crate Items Overview
//!
//! Conversion of AMASS motion archives and SMPL-H regressor models from
//! ``.npz`` into documents an engine can load.
//!
//! ### Modules
//! - [`codec`](crate::codec) - Reading ``.npz`` archives and writing JSON or HDF5.
//! - [`common`](crate::common) - Archive values, records and the per-archive field layouts.
//! - [`conversions`](crate::conversions) - Pose to quaternion conversion and the joint regressor projection.
//! - [`pipeline`](crate::pipeline) - Whole-file conversions used by the command line tools.
// #![warn(
//     clippy::all,
//     clippy::pedantic,
// )]
// //some lints are really just too pedantic
// #![allow(clippy::must_use_candidate)]
// #![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod common;
pub mod conversions;
pub mod error;
pub mod pipeline;
pub mod smpl_h;

pub use error::{Error, Result};
