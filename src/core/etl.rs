use crate::core::{MigrationOutput, Pipeline};
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<MigrationOutput> {
        let started = Instant::now();
        tracing::info!("🚀 Starting customer migration...");

        // Extract
        let input = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Loaded {} mapping rows and source document <{}>",
            input.mapping.len(),
            input.source.root.name
        );

        // Transform
        let result = self.pipeline.transform(input).await?;
        tracing::info!(
            "🔧 Transformed {} customers ({} audit entries)",
            result.document.root.elements().count(),
            result.audit_log.len()
        );

        // Load
        let output = self.pipeline.load(result).await?;
        tracing::info!(
            "✅ Customer migration completed in {:?}",
            started.elapsed()
        );

        Ok(output)
    }
}
