use chrono::{DateTime, Local};
use uuid::Uuid;

/// Identity of one migration run, created once by the caller and handed to
/// the orchestrator and the load stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::with(Uuid::new_v4(), Local::now())
    }

    pub fn with(run_id: Uuid, started_at: DateTime<Local>) -> Self {
        Self { run_id, started_at }
    }

    /// Value written into account `creation-date` fields.
    pub fn processing_date(&self) -> String {
        self.started_at.format("%Y-%m-%dT00:00:00+00:00").to_string()
    }

    /// Dated sub folder of `output_base`, e.g. `output/2026-10-16`.
    pub fn output_dir(&self, output_base: &str) -> String {
        let folder = self.started_at.format("%Y-%m-%d").to_string();
        let base = output_base.trim_end_matches(['/', '\\']);
        if base.is_empty() {
            folder
        } else {
            format!("{}/{}", base, folder)
        }
    }

    pub fn xml_file_name(&self) -> String {
        format!("output-{}.xml", self.run_id)
    }

    pub fn log_file_name(&self) -> String {
        format!("log-{}.csv", self.run_id)
    }

    pub fn archive_file_name(&self) -> String {
        format!("migration-{}.zip", self.run_id)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> RunContext {
        RunContext::with(
            Uuid::parse_str("6f1c2a4e-9b7d-4c3e-8a21-0d5f7e9b1c3a").unwrap(),
            Local.with_ymd_and_hms(2026, 10, 16, 14, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_processing_date_is_midnight_of_run_day() {
        assert_eq!(fixed().processing_date(), "2026-10-16T00:00:00+00:00");
    }

    #[test]
    fn test_output_names() {
        let ctx = fixed();
        assert_eq!(ctx.output_dir("output/"), "output/2026-10-16");
        assert_eq!(ctx.output_dir(""), "2026-10-16");
        assert_eq!(
            ctx.xml_file_name(),
            "output-6f1c2a4e-9b7d-4c3e-8a21-0d5f7e9b1c3a.xml"
        );
        assert_eq!(
            ctx.log_file_name(),
            "log-6f1c2a4e-9b7d-4c3e-8a21-0d5f7e9b1c3a.csv"
        );
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(RunContext::new().run_id, RunContext::new().run_id);
    }
}
