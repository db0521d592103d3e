use crate::core::document::{Document, Element};
use crate::core::mapping::MappingTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One migration directive as read from the mapping file; empty cells are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MappingRow {
    pub current_id: String,
    pub new_id: Option<String>,
    pub new_store_id: Option<String>,
    pub new_store_name: Option<String>,
    pub new_source_id: Option<String>,
    pub mandatory_reference: Option<String>,
    pub delivery_day: Option<String>,
}

/// A mapping row that passed validation, with every default applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub current_id: String,
    pub new_id: String,
    pub new_store_id: String,
    pub new_store_name: String,
    pub new_source_id: String,
    /// Lower-cased boolean text; `None` leaves the attribute untouched.
    pub mandatory_reference: Option<String>,
    pub delivery_day: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NOT_OK")]
    NotOk,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStatus::Ok => f.write_str("OK"),
            AuditStatus::NotOk => f.write_str("NOT_OK"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub current_id: String,
    pub new_id: String,
    pub status: AuditStatus,
    pub reason: String,
}

/// What happened to a single mapping row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Migrated,
    NotFound,
    Invalid(String),
    Duplicate,
}

impl RowOutcome {
    pub const FOUND_REASON: &'static str = "Found in source document";
    pub const NOT_FOUND_REASON: &'static str = "Not found in source document";
    pub const DUPLICATE_REASON: &'static str = "Duplicate of an earlier mapping row";

    pub fn status(&self) -> AuditStatus {
        match self {
            RowOutcome::Migrated => AuditStatus::Ok,
            _ => AuditStatus::NotOk,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            RowOutcome::Migrated => Self::FOUND_REASON,
            RowOutcome::NotFound => Self::NOT_FOUND_REASON,
            RowOutcome::Invalid(reason) => reason,
            RowOutcome::Duplicate => Self::DUPLICATE_REASON,
        }
    }
}

/// Namespace URIs of the customer impex format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpexNamespaces {
    pub core: String,
    pub datatype: String,
}

impl Default for ImpexNamespaces {
    fn default() -> Self {
        Self {
            core: "http://www.intershop.com/xml/ns/intershop/customer/impex/7.3".to_string(),
            datatype: "http://www.intershop.com/xml/ns/enfinity/6.5/core/impex-dt".to_string(),
        }
    }
}

/// Literals applied by the customer transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteRules {
    pub segment_id: String,
    pub source_brand: String,
    pub target_brand: String,
    pub system_id: String,
    pub default_delivery_day: String,
    pub namespaces: ImpexNamespaces,
}

impl Default for RewriteRules {
    fn default() -> Self {
        Self {
            segment_id: "CG_Mekonomen".to_string(),
            source_brand: "Mekonomen".to_string(),
            target_brand: "Meca".to_string(),
            system_id: "6".to_string(),
            default_delivery_day: "-3D".to_string(),
            namespaces: ImpexNamespaces::default(),
        }
    }
}

/// Extract 階段的輸出：來源文件與對應表
#[derive(Debug, Clone)]
pub struct MigrationInput {
    pub source: Document,
    pub mapping: MappingTable,
}

/// Transform 階段的輸出
#[derive(Debug, Clone)]
pub struct MigrationBatch {
    pub records: Vec<Element>,
    pub audit_log: Vec<AuditLogEntry>,
    pub found: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub document: Document,
    pub audit_log: Vec<AuditLogEntry>,
    pub found: usize,
    pub total: usize,
}

/// Load 階段寫出的檔案位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutput {
    pub xml_path: String,
    pub log_path: String,
    pub archive_path: Option<String>,
    pub found: usize,
    pub total: usize,
}
