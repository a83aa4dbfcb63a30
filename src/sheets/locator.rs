use regex::Regex;

use crate::core::SyncError;

/// Extract the spreadsheet id from a sharing URL of the form
/// `.../spreadsheets/d/<ID>/...`.
pub fn parse_spreadsheet_url(url: &str) -> Result<String, SyncError> {
    let pattern = Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)")?;

    pattern
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| SyncError::InvalidLocator(url.to_string()))
}
