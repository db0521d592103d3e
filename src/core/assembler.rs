use crate::core::document::{Document, Element, XSI_NS};
use crate::domain::model::AuditLogEntry;
use crate::utils::error::{EtlError, Result};

/// Root attributes carried over so the delta file passes import validation.
pub const VERSION_ATTRIBUTES: [&str; 5] = ["major", "minor", "family", "branch", "build"];

/// Builds the output document: the source root's name and namespace
/// declarations, its schema location and version attributes when present,
/// then the migrated records in order.
pub fn assemble(source: &Document, records: Vec<Element>) -> Document {
    let source_root = &source.root;
    let mut root = Element::new(source_root.name.clone(), source_root.namespace.clone());

    for (key, value) in source_root.namespace_declarations() {
        root.set_attribute(key, value);
    }

    if let Some((key, value)) = source_root.attribute_ns(XSI_NS, "schemaLocation") {
        root.set_attribute(key, value);
    }

    for name in VERSION_ATTRIBUTES {
        if let Some(value) = source_root.attribute(name).filter(|v| !v.is_empty()) {
            root.set_attribute(name, value);
        }
    }

    for record in records {
        root.push_child(record);
    }
    Document::new(root)
}

/// Audit log as CSV with header `current_id,new_id,status,reason`.
pub fn audit_log_csv(entries: &[AuditLogEntry]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(["current_id", "new_id", "status", "reason"])?;
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::ProcessingError {
            message: format!("failed to flush audit log: {}", e.error()),
        })
}
