use crate::domain::model::{MigrationInput, MigrationOutput, RewriteRules, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn source_xml(&self) -> &str;
    fn mapping_csv(&self) -> &str;
    fn output_path(&self) -> &str;
    fn rules(&self) -> &RewriteRules;
    fn archive_outputs(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<MigrationInput>;
    async fn transform(&self, input: MigrationInput) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<MigrationOutput>;
}
