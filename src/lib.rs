pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, LocalStorage};

#[cfg(feature = "lambda")]
pub use config::lambda::S3Storage;

pub use config::IngestConfig;
pub use crate::core::{etl::EtlEngine, http::HttpClient};
pub use utils::error::{EtlError, Result};
