#[cfg(feature = "hdf5")]
pub mod h5;
pub mod json;
pub mod npy_header;
pub mod npz;
