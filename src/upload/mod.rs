/// Upload pipeline: decode, write blob, insert metadata, roll back on failure

pub mod coordinator;
pub mod models;

pub use coordinator::UploadCoordinator;
pub use models::*;
