use std::time::Duration;

use reqwest::Client;
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::SyncError;

const BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Remote calls are bounded: anything slower is treated as a transient
/// failure rather than left pending indefinitely.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: Option<String>,
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueUpdate {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

impl ValueUpdate {
    pub fn cell(column: usize, row: usize, value: String) -> Self {
        Self { range: cell_range(column, row), values: vec![vec![value]] }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateBody<'a> {
    value_input_option: &'a str,
    data: &'a [ValueUpdate],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    pub total_updated_cells: Option<u64>,
}

pub struct SheetsApi {
    client: Client,
    base_url: String,
}

impl SheetsApi {
    pub fn new(timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: BASE_URL.to_string() })
    }

    pub async fn get_values(
        &self,
        token: &str,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<ValueRange, SyncError> {
        let url = format!("{}/{}/values/{}", self.base_url, spreadsheet_id, range);
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        if !response.status().is_success() {
            return Err(SyncError::Transient(format!(
                "values get for {} failed: {}",
                spreadsheet_id,
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    /// One remote call carrying a list of `(range, value)` pairs.
    pub async fn batch_update(
        &self,
        token: &str,
        spreadsheet_id: &str,
        updates: &[ValueUpdate],
    ) -> Result<BatchUpdateResponse, SyncError> {
        let url = format!("{}/{}/values:batchUpdate", self.base_url, spreadsheet_id);
        let body = BatchUpdateBody { value_input_option: "RAW", data: updates };
        let response = self.client.post(&url).bearer_auth(token).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(SyncError::Transient(format!(
                "batch update for {} failed: {}",
                spreadsheet_id,
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

/// Zero-based column index to the A1-notation letter(s): 0 -> A, 25 -> Z,
/// 26 -> AA.
pub fn column_letter(index: usize) -> String {
    let mut letters = String::new();
    let mut remainder = index;
    loop {
        letters.insert(0, (b'A' + (remainder % 26) as u8) as char);
        if remainder < 26 {
            break;
        }
        remainder = remainder / 26 - 1;
    }
    letters
}

/// Single-cell range for a zero-based column and a one-based row.
pub fn cell_range(column: usize, row: usize) -> String {
    format!("{}{}", column_letter(column), row)
}
