pub mod assembler;
pub mod batch;
pub mod document;
pub mod etl;
pub mod locator;
pub mod mapping;
pub mod migration_pipeline;
pub mod run_context;
pub mod transformer;
pub mod validator;

pub use crate::domain::model::{MigrationInput, MigrationOutput, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
