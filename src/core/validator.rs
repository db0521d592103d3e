use crate::domain::model::{MappingRow, ResolvedRow};
use regex::Regex;
use std::sync::OnceLock;

pub const MISSING_VALUES: &str = "Missing values!";
pub const INVALID_DELIVERY_DAY: &str = "Invalid delivery day format! - Eg: '-1D'";

/// Outcome of validating one mapping row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid(ResolvedRow),
    Invalid(String),
}

fn delivery_day_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-[1-9]D$").expect("delivery day pattern is valid"))
}

pub fn is_valid_delivery_day(value: &str) -> bool {
    delivery_day_pattern().is_match(value)
}

/// Checks a mapping row and resolves its defaults.
///
/// Rules run in order and the first failure decides the reason:
/// required values first, then the delivery-day format. An empty delivery
/// day becomes `default_delivery_day`. `mandatory_reference` is lower-cased
/// and left `None` when absent.
pub fn validate(row: &MappingRow, default_delivery_day: &str) -> Verdict {
    let required = (
        present(&row.new_id),
        present(&row.new_store_id),
        present(&row.new_store_name),
        present(&row.new_source_id),
    );
    let (Some(new_id), Some(new_store_id), Some(new_store_name), Some(new_source_id)) = required
    else {
        return Verdict::Invalid(MISSING_VALUES.to_string());
    };

    let delivery_day = match present(&row.delivery_day) {
        None => default_delivery_day.to_string(),
        Some(value) if is_valid_delivery_day(value) => value.to_string(),
        Some(_) => return Verdict::Invalid(INVALID_DELIVERY_DAY.to_string()),
    };

    Verdict::Valid(ResolvedRow {
        current_id: row.current_id.clone(),
        new_id: new_id.to_string(),
        new_store_id: new_store_id.to_string(),
        new_store_name: new_store_name.to_string(),
        new_source_id: new_source_id.to_string(),
        mandatory_reference: present(&row.mandatory_reference).map(str::to_lowercase),
        delivery_day,
    })
}

/// Trimmed value, treating blanks and spreadsheet NaN markers as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
}
