pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{ApiCredentials, ApiTokenProvider, HttpContactStore};
pub use config::{toml_config::TomlConfig, AppConfig, PartialConfig};
pub use core::pipeline::{ContactPipeline, PipelineReport, PipelineSettings, PipelineState};
pub use domain::model::{Age, AuthContext, Contact, ContactFilter, Operation};
pub use domain::ports::{ContactStore, TokenProvider};
pub use utils::error::{ContactError, Result};
