//! Configuration module
//!
//! Configuration comes from an optional YAML file, `.env` files and the
//! process environment, in that order of increasing precedence.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;


use crate::errors::StargazeError;
use std::path::Path;

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<StargazeConfig, StargazeError> {
    ConfigLoader::from_file(path).await
}
