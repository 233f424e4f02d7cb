pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::bedrock::BedrockClient;
pub use config::{cli::LocalStorage, toml_config::MarkerConfig};
pub use core::{engine::MarkingEngine, marker::Marker, pipeline::FolderPipeline};
pub use utils::error::{MarkerError, Result};
