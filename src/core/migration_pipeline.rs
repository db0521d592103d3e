
pub use crate::app::pipelines::migration_pipeline::MigrationPipeline;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::run_context::RunContext;
    use crate::domain::model::{AuditStatus, RewriteRules};
    use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
    use crate::utils::error::{EtlError, Result};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_files(files: &[(&str, &str)]) -> Self {
            let files = files
                .iter()
                .map(|(path, content)| (path.to_string(), content.as_bytes().to_vec()))
                .collect();
            Self {
                files: Arc::new(Mutex::new(files)),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        async fn paths(&self) -> Vec<String> {
            let files = self.files.lock().await;
            let mut paths: Vec<String> = files.keys().cloned().collect();
            paths.sort();
            paths
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        rules: RewriteRules,
        archive: bool,
    }

    impl MockConfig {
        fn new(archive: bool) -> Self {
            Self {
                rules: RewriteRules::default(),
                archive,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn source_xml(&self) -> &str {
            "in/export.xml"
        }

        fn mapping_csv(&self) -> &str {
            "in/mapping.csv"
        }

        fn output_path(&self) -> &str {
            "out"
        }

        fn rules(&self) -> &RewriteRules {
            &self.rules
        }

        fn archive_outputs(&self) -> bool {
            self.archive
        }
    }

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<enfinity xmlns="http://www.intershop.com/xml/ns/intershop/customer/impex/7.3" xmlns:dt="http://www.intershop.com/xml/ns/enfinity/6.5/core/impex-dt" major="6">
  <customer id="1001"/>
</enfinity>"#;

    const MAPPING: &str = "current_customer_id,new_customer_id,new_store_id,new_store_name,new_source_id,mandatory_reference,delivery_day\n1001,9001,77,Store A,SRC1,true,-2D\n2002,9002,78,Store B,SRC2,,\n";

    #[tokio::test]
    async fn test_extract_reads_both_inputs() {
        let storage = MockStorage::with_files(&[("in/export.xml", EXPORT), ("in/mapping.csv", MAPPING)]);
        let pipeline = MigrationPipeline::new(storage, MockConfig::new(false), RunContext::new());

        let input = pipeline.extract().await.unwrap();
        assert_eq!(input.mapping.len(), 2);
        assert_eq!(input.source.root.local_name(), "enfinity");
    }

    #[tokio::test]
    async fn test_extract_fails_on_missing_source() {
        let storage = MockStorage::with_files(&[("in/mapping.csv", MAPPING)]);
        let pipeline = MigrationPipeline::new(storage, MockConfig::new(false), RunContext::new());

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::IoError(_)));
    }

    #[tokio::test]
    async fn test_extract_rejects_malformed_mapping_before_reading_xml() {
        let storage = MockStorage::with_files(&[("in/mapping.csv", "current_customer_id\n1001\n")]);
        let pipeline = MigrationPipeline::new(storage, MockConfig::new(false), RunContext::new());

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, EtlError::MalformedMapping { .. }));
    }

    #[tokio::test]
    async fn test_full_run_writes_both_artifacts() {
        let storage = MockStorage::with_files(&[("in/export.xml", EXPORT), ("in/mapping.csv", MAPPING)]);
        let run = RunContext::new();
        let out_dir = run.output_dir("out");
        let pipeline = MigrationPipeline::new(storage.clone(), MockConfig::new(false), run);

        let input = pipeline.extract().await.unwrap();
        let result = pipeline.transform(input).await.unwrap();
        assert_eq!(result.found, 1);
        assert_eq!(result.total, 2);
        assert_eq!(result.audit_log[1].status, AuditStatus::NotOk);

        let output = pipeline.load(result).await.unwrap();
        assert!(output.xml_path.starts_with(&out_dir));
        assert!(output.archive_path.is_none());

        let xml = String::from_utf8(storage.get_file(&output.xml_path).await.unwrap()).unwrap();
        assert!(xml.contains(r#"<customer id="9001">"#));

        let log = String::from_utf8(storage.get_file(&output.log_path).await.unwrap()).unwrap();
        assert_eq!(log.lines().count(), 3);
        assert_eq!(storage.paths().await.len(), 4);
    }

    #[tokio::test]
    async fn test_load_with_archive() {
        let storage = MockStorage::with_files(&[("in/export.xml", EXPORT), ("in/mapping.csv", MAPPING)]);
        let pipeline = MigrationPipeline::new(storage.clone(), MockConfig::new(true), RunContext::new());

        let input = pipeline.extract().await.unwrap();
        let result = pipeline.transform(input).await.unwrap();
        let output = pipeline.load(result).await.unwrap();

        let archive_path = output.archive_path.unwrap();
        let zip_bytes = storage.get_file(&archive_path).await.unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let run = pipeline.run_context();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec![run.log_file_name(), run.xml_file_name()]);
    }
}
