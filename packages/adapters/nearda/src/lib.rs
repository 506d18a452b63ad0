mod error;
mod sidecar;

pub use error::{Error, Result};
pub use sidecar::SidecarClient;
