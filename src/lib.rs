pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::cli::LocalStorage;
pub use config::toml_config::MigrationConfig;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::{etl::EtlEngine, migration_pipeline::MigrationPipeline, run_context::RunContext};
pub use utils::error::{EtlError, Result};
