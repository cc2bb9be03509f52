//! The preimage module loads the preimages read by VM steps and uploads them to the preimage
//! oracle ahead of the step.

pub mod kzg;
pub use kzg::root_of_unity;

mod loader;
pub use loader::PreimageLoader;

mod kv;
pub use kv::DiskKv;

mod upload;
pub use upload::{
    DirectPreimageUploader, LargePreimageUploader, SplitPreimageUploader,
    DEFAULT_LARGE_PREIMAGE_THRESHOLD,
};
