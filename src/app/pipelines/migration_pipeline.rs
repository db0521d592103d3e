use crate::core::assembler::{assemble, audit_log_csv};
use crate::core::batch::BatchOrchestrator;
use crate::core::document::Document;
use crate::core::mapping::MappingTable;
use crate::core::run_context::RunContext;
use crate::core::{ConfigProvider, MigrationInput, MigrationOutput, Pipeline, Storage, TransformResult};
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// 客戶移轉 Pipeline：讀取匯出檔與對應表，轉換後寫出 XML 與稽核紀錄
pub struct MigrationPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) run: RunContext,
}

impl<S: Storage, C: ConfigProvider> MigrationPipeline<S, C> {
    pub fn new(storage: S, config: C, run: RunContext) -> Self {
        Self {
            storage,
            config,
            run,
        }
    }

    pub fn run_context(&self) -> &RunContext {
        &self.run
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MigrationPipeline<S, C> {
    async fn extract(&self) -> Result<MigrationInput> {
        // 先載入對應表，欄位不齊時在讀取大型 XML 前就中止
        tracing::info!("📄 Loading mapping file: '{}'", self.config.mapping_csv());
        let csv_data = self.storage.read_file(self.config.mapping_csv()).await?;
        let mapping = MappingTable::from_bytes(&csv_data)?;
        tracing::debug!("Mapping file contains {} rows", mapping.len());

        tracing::info!("📄 Loading customer source XML file: '{}'", self.config.source_xml());
        let xml_data = self.storage.read_file(self.config.source_xml()).await?;
        let source = Document::from_bytes(&xml_data)?;

        Ok(MigrationInput { source, mapping })
    }

    async fn transform(&self, input: MigrationInput) -> Result<TransformResult> {
        let batch = BatchOrchestrator::new(self.config.rules(), &self.run)
            .run(&input.source, &input.mapping);

        let document = assemble(&input.source, batch.records);

        Ok(TransformResult {
            document,
            audit_log: batch.audit_log,
            found: batch.found,
            total: batch.total,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<MigrationOutput> {
        let output_dir = self.run.output_dir(self.config.output_path());
        let xml_name = self.run.xml_file_name();
        let log_name = self.run.log_file_name();
        let xml_path = format!("{}/{}", output_dir, xml_name);
        let log_path = format!("{}/{}", output_dir, log_name);

        tracing::info!("💾 Creating output file...");
        let xml_data = result.document.to_xml()?;
        self.storage.write_file(&xml_path, &xml_data).await?;
        tracing::info!("📁 Output file: {}", xml_path);

        let log_data = audit_log_csv(&result.audit_log)?;
        self.storage.write_file(&log_path, &log_data).await?;
        tracing::info!("📝 Migration log saved to: {}", log_path);

        let archive_path = if self.config.archive_outputs() {
            let archive_path = format!("{}/{}", output_dir, self.run.archive_file_name());
            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

                zip.start_file::<_, ()>(xml_name.as_str(), FileOptions::default())?;
                zip.write_all(&xml_data)?;

                zip.start_file::<_, ()>(log_name.as_str(), FileOptions::default())?;
                zip.write_all(&log_data)?;

                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
            self.storage.write_file(&archive_path, &zip_data).await?;
            tracing::info!("🗜️ Archive saved to: {}", archive_path);
            Some(archive_path)
        } else {
            None
        };

        Ok(MigrationOutput {
            xml_path,
            log_path,
            archive_path,
            found: result.found,
            total: result.total,
        })
    }
}
