use std::collections::HashMap;

use crate::core::SyncError;

/// Semantic fields a deck spreadsheet can carry. `Front` and `Back` are
/// required; everything else is optional and may appear in any column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Front,
    Back,
    Category,
    Priority,
    LastSeen,
    Interval,
    Status,
    Id,
    Updated,
}

// Case-insensitive alias accepted for the Priority column.
const PRIORITY_ALIAS: &str = "learning order";

/// Mapping from semantic field to zero-based column index, built from the
/// sheet's free-form header row.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    indices: HashMap<Column, usize>,
}

impl ColumnMap {
    /// Headers are trimmed and matched exactly, except for the documented
    /// Priority alias. When a name appears twice the later column wins; this
    /// is plain last-write-wins during construction, not curated precedence.
    pub fn from_headers(headers: &[String]) -> Result<Self, SyncError> {
        let mut indices = HashMap::new();

        for (index, raw) in headers.iter().enumerate() {
            let header = raw.trim();
            let column = match header {
                "Front" => Some(Column::Front),
                "Back" => Some(Column::Back),
                "Category" => Some(Column::Category),
                "Priority" => Some(Column::Priority),
                "Last Seen" => Some(Column::LastSeen),
                "Interval" => Some(Column::Interval),
                "Status" => Some(Column::Status),
                "ID" => Some(Column::Id),
                "Updated" => Some(Column::Updated),
                _ if header.eq_ignore_ascii_case(PRIORITY_ALIAS) => Some(Column::Priority),
                _ => None,
            };
            if let Some(column) = column {
                indices.insert(column, index);
            }
        }

        let missing: Vec<String> = [(Column::Front, "Front"), (Column::Back, "Back")]
            .iter()
            .filter(|(column, _)| !indices.contains_key(column))
            .map(|(_, name)| name.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(SyncError::Schema { missing });
        }

        Ok(Self { indices })
    }

    pub fn index_of(&self, column: Column) -> Option<usize> {
        self.indices.get(&column).copied()
    }

    /// Cell value for a semantic field in one data row, if the column exists
    /// and the row is wide enough.
    pub fn get<'a>(&self, row: &'a [String], column: Column) -> Option<&'a str> {
        self.index_of(column).and_then(|index| row.get(index)).map(|value| value.as_str())
    }
}
