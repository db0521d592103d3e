pub mod migration_pipeline;
