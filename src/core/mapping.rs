use crate::domain::model::MappingRow;
use crate::utils::error::{EtlError, Result};
use std::collections::HashMap;

pub const CURRENT_CUSTOMER_ID: &str = "current_customer_id";
pub const NEW_CUSTOMER_ID: &str = "new_customer_id";
pub const NEW_STORE_ID: &str = "new_store_id";
pub const NEW_STORE_NAME: &str = "new_store_name";
pub const NEW_SOURCE_ID: &str = "new_source_id";
pub const MANDATORY_REFERENCE: &str = "mandatory_reference";
pub const DELIVERY_DAY: &str = "delivery_day";

pub const REQUIRED_COLUMNS: [&str; 7] = [
    CURRENT_CUSTOMER_ID,
    NEW_CUSTOMER_ID,
    NEW_STORE_ID,
    NEW_STORE_NAME,
    NEW_SOURCE_ID,
    MANDATORY_REFERENCE,
    DELIVERY_DAY,
];

/// Migration directives in file order plus an index by current id.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    rows: Vec<MappingRow>,
    index: HashMap<String, usize>,
}

impl MappingTable {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_reader(data)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        // Excel 匯出的 CSV 可能帶 BOM
        let position = |column: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}') == column)
        };

        let mut columns = Vec::with_capacity(REQUIRED_COLUMNS.len());
        let mut missing = Vec::new();
        for column in REQUIRED_COLUMNS {
            match position(column) {
                Some(index) => columns.push(index),
                None => missing.push(column.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(EtlError::MalformedMapping { missing });
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let cell = |slot: usize| {
                record
                    .get(columns[slot])
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_owned)
            };

            // 整列空白（例如檔尾空行）直接略過
            if record.iter().all(|value| value.trim().is_empty()) {
                continue;
            }

            rows.push(MappingRow {
                current_id: normalize_id(&cell(0).unwrap_or_default()),
                new_id: cell(1),
                new_store_id: cell(2),
                new_store_name: cell(3),
                new_source_id: cell(4),
                mandatory_reference: cell(5),
                delivery_day: cell(6),
            });
        }

        Ok(Self::from_rows(rows))
    }

    pub fn from_rows(rows: Vec<MappingRow>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            let first = *index.entry(row.current_id.clone()).or_insert(position);
            if first != position {
                tracing::warn!(
                    "⚠️ Duplicate mapping for customer '{}' (rows {} and {}), the first row wins",
                    row.current_id,
                    first + 1,
                    position + 1
                );
            }
        }
        Self { rows, index }
    }

    pub fn rows(&self) -> &[MappingRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    fn get(&self, current_id: &str) -> Option<&MappingRow> {
        self.index
            .get(&normalize_id(current_id))
            .map(|position| &self.rows[*position])
    }

    /// Position of the first row naming `current_id`.
    pub fn first_position(&self, current_id: &str) -> Option<usize> {
        self.index.get(&normalize_id(current_id)).copied()
    }
}

/// Key form used to compare mapping ids with document ids.
pub fn normalize_id(id: &str) -> String {
    id.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "current_customer_id,new_customer_id,new_store_id,new_store_name,new_source_id,mandatory_reference,delivery_day";

    #[test]
    fn test_load_rows_with_optional_cells() {
        let csv = format!(
            "{}\n1001,9001,77,Store A,SRC1,True,-2D\n 1002 ,9002,78,\"Store, B\",SRC2,,\n",
            HEADER
        );
        let table = MappingTable::from_bytes(csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 2);
        let first = table.get("1001").unwrap();
        assert_eq!(first.new_id.as_deref(), Some("9001"));
        assert_eq!(first.mandatory_reference.as_deref(), Some("True"));
        assert_eq!(first.delivery_day.as_deref(), Some("-2D"));

        let second = table.get("1002").unwrap();
        assert_eq!(second.current_id, "1002");
        assert_eq!(second.new_store_name.as_deref(), Some("Store, B"));
        assert_eq!(second.mandatory_reference, None);
        assert_eq!(second.delivery_day, None);
    }

    #[test]
    fn test_columns_may_come_in_any_order_with_extras() {
        let csv = "delivery_day,note,new_source_id,new_store_name,new_store_id,new_customer_id,current_customer_id,mandatory_reference\n-1D,x,S,N,7,9,1,false\n";
        let table = MappingTable::from_bytes(csv.as_bytes()).unwrap();
        let row = table.get("1").unwrap();
        assert_eq!(row.new_id.as_deref(), Some("9"));
        assert_eq!(row.new_store_id.as_deref(), Some("7"));
        assert_eq!(row.delivery_day.as_deref(), Some("-1D"));
    }

    #[test]
    fn test_missing_columns_are_fatal() {
        let csv = "current_customer_id,new_customer_id,new_store_id\n1,2,3\n";
        let err = MappingTable::from_bytes(csv.as_bytes()).unwrap_err();
        match err {
            EtlError::MalformedMapping { missing } => {
                assert_eq!(
                    missing,
                    vec![
                        "new_store_name",
                        "new_source_id",
                        "mandatory_reference",
                        "delivery_day"
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_ids_first_row_wins() {
        let csv = format!("{}\n1,A,1,S,X,,\n1,B,2,S,X,,\n", HEADER);
        let table = MappingTable::from_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("1").unwrap().new_id.as_deref(), Some("A"));
        assert_eq!(table.first_position("1"), Some(0));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let csv = format!("{}\n1,A,1,S,X,,\n,,,,,,\n", HEADER);
        let table = MappingTable::from_bytes(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
    }
}
