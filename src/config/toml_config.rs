use crate::core::validator::is_valid_delivery_day;
use crate::core::ConfigProvider;
use crate::domain::model::RewriteRules;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub migration: MigrationInfo,
    pub source: SourceConfig,
    pub rules: RewriteRules,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationInfo {
    pub name: String,
    pub description: Option<String>,
}

impl Default for MigrationInfo {
    fn default() -> Self {
        Self {
            name: "customer-migration".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// 搜尋最新輸入檔的資料夾
    pub input_dir: String,
    pub xml: Option<String>,
    pub csv: Option<String>,
    pub example_xml: String,
    pub example_csv: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            input_dir: "input".to_string(),
            xml: None,
            csv: None,
            example_xml: "input/examples/Example Full Customer Export.xml".to_string(),
            example_csv: "input/examples/Example Customer Migration List.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub output_path: String,
    pub compression: Option<CompressionConfig>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            output_path: "output".to_string(),
            compression: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
}

impl MigrationConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
            message: format!("cannot read '{}': {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${INPUT_DIR})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        let xml = validation::validate_required_field("source.xml", &self.source.xml)?;
        validation::validate_path("source.xml", xml)?;
        validation::validate_file_extension("source.xml", xml, &["xml"])?;

        let csv = validation::validate_required_field("source.csv", &self.source.csv)?;
        validation::validate_path("source.csv", csv)?;
        validation::validate_file_extension("source.csv", csv, &["csv"])?;

        validation::validate_path("load.output_path", &self.load.output_path)?;

        validation::validate_non_empty_string("rules.segment_id", &self.rules.segment_id)?;
        validation::validate_non_empty_string("rules.namespaces.core", &self.rules.namespaces.core)?;
        validation::validate_non_empty_string(
            "rules.namespaces.datatype",
            &self.rules.namespaces.datatype,
        )?;

        if !is_valid_delivery_day(&self.rules.default_delivery_day) {
            return Err(EtlError::InvalidConfigValueError {
                field: "rules.default_delivery_day".to_string(),
                value: self.rules.default_delivery_day.clone(),
                reason: "Must look like '-1D' (minus, one digit 1-9, 'D')".to_string(),
            });
        }

        Ok(())
    }

    /// 是否同時輸出 ZIP 壓縮檔
    pub fn compression_enabled(&self) -> bool {
        self.load
            .compression
            .as_ref()
            .map(|c| c.enabled)
            .unwrap_or(false)
    }
}

impl ConfigProvider for MigrationConfig {
    fn source_xml(&self) -> &str {
        self.source.xml.as_deref().unwrap_or(&self.source.example_xml)
    }

    fn mapping_csv(&self) -> &str {
        self.source.csv.as_deref().unwrap_or(&self.source.example_csv)
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn rules(&self) -> &RewriteRules {
        &self.rules
    }

    fn archive_outputs(&self) -> bool {
        self.compression_enabled()
    }
}

impl Validate for MigrationConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
