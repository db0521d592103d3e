use crate::core::document::Document;
use crate::core::locator::locate;
use crate::core::mapping::MappingTable;
use crate::core::run_context::RunContext;
use crate::core::transformer::CustomerTransformer;
use crate::core::validator::{validate, Verdict};
use crate::domain::model::{AuditLogEntry, MappingRow, MigrationBatch, RewriteRules, RowOutcome};
use std::collections::HashSet;

/// Runs every mapping row through locate → validate → transform and keeps
/// one audit entry per row, in mapping order. A repeated row for a record an
/// earlier row already migrated is skipped. Row failures never stop the batch.
pub struct BatchOrchestrator<'a> {
    rules: &'a RewriteRules,
    run: &'a RunContext,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(rules: &'a RewriteRules, run: &'a RunContext) -> Self {
        Self { rules, run }
    }

    pub fn run(&self, source: &Document, mapping: &MappingTable) -> MigrationBatch {
        let processing_date = self.run.processing_date();
        let transformer = CustomerTransformer::new(self.rules, &processing_date, &source.root);

        let mut batch = MigrationBatch {
            records: Vec::new(),
            audit_log: Vec::with_capacity(mapping.len()),
            found: 0,
            total: mapping.len(),
        };

        tracing::info!("🔍 Checking if customers exist in source document...");

        // 已成功移轉的客戶編號，重複列不再處理
        let mut migrated: HashSet<&str> = HashSet::new();

        for (position, row) in mapping.rows().iter().enumerate() {
            let mut logged_new_id = row.new_id.clone().unwrap_or_default();

            let outcome = match locate(source, &self.rules.namespaces.core, &row.current_id) {
                None => {
                    tracing::warn!("❌ Customer not found in source document: {}", row.current_id);
                    RowOutcome::NotFound
                }
                Some(found) => {
                    batch.found += 1;
                    let repeated = mapping
                        .first_position(&row.current_id)
                        .is_some_and(|first| first < position);

                    if repeated && migrated.contains(row.current_id.as_str()) {
                        tracing::warn!(
                            "⏭️ Mapping row {} for customer '{}' duplicates an earlier row",
                            position + 1,
                            row.current_id
                        );
                        RowOutcome::Duplicate
                    } else {
                        tracing::info!("✅ Customer found: '{}' >> '{}'", row.current_id, logged_new_id);

                        // 先驗證再修改，無效列不會產生任何輸出
                        match validate(row, &self.rules.default_delivery_day) {
                            Verdict::Invalid(reason) => {
                                tracing::warn!(
                                    "⚠️ Invalid mapping row for customer '{}': {}",
                                    row.current_id,
                                    reason
                                );
                                RowOutcome::Invalid(reason)
                            }
                            Verdict::Valid(resolved) => {
                                let record = found.detached();
                                batch.records.push(transformer.transform(&record, &resolved));
                                migrated.insert(row.current_id.as_str());
                                logged_new_id = resolved.new_id;
                                RowOutcome::Migrated
                            }
                        }
                    }
                }
            };

            batch.audit_log.push(audit_entry(row, logged_new_id, &outcome));
        }

        tracing::info!(
            "📊 {}/{} customers found and will be included in output XML ({} migrated)",
            batch.found,
            batch.total,
            batch.records.len()
        );
        batch
    }
}

fn audit_entry(row: &MappingRow, new_id: String, outcome: &RowOutcome) -> AuditLogEntry {
    AuditLogEntry {
        current_id: row.current_id.clone(),
        new_id,
        status: outcome.status(),
        reason: outcome.reason().to_string(),
    }
}
