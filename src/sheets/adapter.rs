use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    api::{
        SheetsApi,
        ValueUpdate,
        DEFAULT_TIMEOUT,
    },
    schema::{
        Column,
        ColumnMap,
    },
};
use crate::{
    auth::TokenProvider,
    core::{
        models::{
            format_timestamp,
            parse_timestamp,
            UNSET_PRIORITY,
        },
        Card,
        SyncError,
        WriteOutcome,
    },
};

// Wide enough for any sane deck sheet; row 1 is the header row.
const FETCH_RANGE: &str = "A1:ZZ";

/// The seam between the deck manager and whatever row/column store backs a
/// deck. Tests substitute an in-memory implementation.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn load_all(&self, source_id: &str) -> Result<Vec<Card>, SyncError>;
    async fn write(&self, source_id: &str, card: &Card) -> Result<WriteOutcome, SyncError>;
    async fn write_batch(&self, source_id: &str, cards: &[Card]) -> Result<(), SyncError>;
}

/// Google Sheets adapter. Stateless across calls: every operation re-fetches
/// the sheet and rebuilds the column mapping, which is cached only for the
/// duration of that one call.
pub struct SheetStore<A: TokenProvider> {
    api: SheetsApi,
    auth: A,
}

impl<A: TokenProvider> SheetStore<A> {
    pub fn new(auth: A) -> Result<Self, SyncError> {
        Ok(Self { api: SheetsApi::new(DEFAULT_TIMEOUT)?, auth })
    }

    async fn fetch_rows(&self, source_id: &str) -> Result<Vec<Vec<String>>, SyncError> {
        let token = self.auth.ensure_fresh_token().await?;
        let values = self.api.get_values(&token, source_id, FETCH_RANGE).await?;
        Ok(values.values)
    }

    /// Locate a card's row: exact ID match first, then trimmed `(front, back)`
    /// content as a fallback for sheets without an ID column. Returns the
    /// one-based row number.
    pub async fn find_row(&self, source_id: &str, card: &Card) -> Result<Option<usize>, SyncError> {
        let rows = self.fetch_rows(source_id).await?;
        let Some(headers) = rows.first() else {
            return Ok(None);
        };
        let map = ColumnMap::from_headers(headers)?;
        Ok(find_row_in(&map, &rows, card))
    }
}

fn find_row_in(map: &ColumnMap, rows: &[Vec<String>], card: &Card) -> Option<usize> {
    if map.index_of(Column::Id).is_some() {
        for (index, row) in rows.iter().enumerate().skip(1) {
            if map.get(row, Column::Id).map(str::trim) == Some(card.id.as_str()) {
                return Some(index + 1);
            }
        }
    }

    let front = card.front.trim();
    let back = card.back.trim();
    for (index, row) in rows.iter().enumerate().skip(1) {
        let row_front = map.get(row, Column::Front).map(str::trim).unwrap_or("");
        let row_back = map.get(row, Column::Back).map(str::trim).unwrap_or("");
        if !row_front.is_empty() && row_front == front && row_back == back {
            return Some(index + 1);
        }
    }

    None
}

/// Last-writer-wins keyed on the client-stamped logical timestamp. Remote wins
/// ties and anything newer-or-equal; this trusts reasonably synchronized
/// clocks across writers, which is an accepted weakness of the design.
fn remote_is_newer(map: &ColumnMap, remote_row: &[String], card: &Card) -> bool {
    let (Some(remote_raw), Some(local)) = (map.get(remote_row, Column::Updated), card.updated_at)
    else {
        return false;
    };

    match parse_timestamp(remote_raw) {
        Some(remote) => remote >= local,
        None => false,
    }
}

/// The single-cell updates for one card's row, covering only the columns the
/// sheet actually has. Absent columns are skipped silently.
fn cell_updates(map: &ColumnMap, row_number: usize, card: &Card) -> Vec<ValueUpdate> {
    let values = [
        (Column::LastSeen, card.last_seen.map(format_timestamp).unwrap_or_default()),
        (Column::Interval, card.interval.clone().unwrap_or_default()),
        (Column::Status, card.status.clone().unwrap_or_else(|| "Active".to_string())),
        (Column::Id, card.id.clone()),
        (Column::Updated, card.updated_at.map(format_timestamp).unwrap_or_default()),
    ];

    values
        .into_iter()
        .filter_map(|(column, value)| {
            map.index_of(column).map(|index| ValueUpdate::cell(index, row_number, value))
        })
        .collect()
}

fn parse_row(map: &ColumnMap, row: &[String], id: String) -> Card {
    Card {
        id,
        front: map.get(row, Column::Front).map(str::trim).unwrap_or("").to_string(),
        back: map.get(row, Column::Back).map(str::trim).unwrap_or("").to_string(),
        category: map.get(row, Column::Category).map(str::trim).unwrap_or("").to_string(),
        priority_level: map
            .get(row, Column::Priority)
            .and_then(|value| value.trim().parse::<i64>().ok())
            .unwrap_or(UNSET_PRIORITY),
        last_seen: map.get(row, Column::LastSeen).and_then(parse_timestamp),
        interval: map
            .get(row, Column::Interval)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
        status: map
            .get(row, Column::Status)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
        updated_at: map.get(row, Column::Updated).and_then(parse_timestamp),
    }
}

/// Normalize a fetched sheet into cards plus the ID-repair writes it needs:
/// rows with an empty front are skipped, rows with a missing or duplicate ID
/// get a freshly generated one (first occurrence of a duplicate keeps it),
/// and `Inactive` rows are excluded from the deck.
fn parse_sheet(rows: Vec<Vec<String>>) -> Result<(Vec<Card>, Vec<ValueUpdate>), SyncError> {
    let mut row_iter = rows.into_iter();
    let headers = row_iter.next().ok_or(SyncError::EmptyDeck)?;
    let map = ColumnMap::from_headers(&headers)?;

    let mut cards = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut repaired: Vec<ValueUpdate> = Vec::new();

    for (offset, row) in row_iter.enumerate() {
        let row_number = offset + 2; // data starts on row 2

        let front = map.get(&row, Column::Front).map(str::trim).unwrap_or("");
        if front.is_empty() {
            continue;
        }

        let raw_id = map.get(&row, Column::Id).map(str::trim).unwrap_or("");
        let id = if raw_id.is_empty() || !seen_ids.insert(raw_id.to_string()) {
            let generated = Uuid::new_v4().to_string();
            seen_ids.insert(generated.clone());
            if let Some(id_column) = map.index_of(Column::Id) {
                repaired.push(ValueUpdate::cell(id_column, row_number, generated.clone()));
            }
            generated
        } else {
            raw_id.to_string()
        };

        let card = parse_row(&map, &row, id);
        if card.is_inactive() {
            continue;
        }
        cards.push(card);
    }

    Ok((cards, repaired))
}

#[async_trait]
impl<A: TokenProvider> RemoteStore for SheetStore<A> {
    async fn load_all(&self, source_id: &str) -> Result<Vec<Card>, SyncError> {
        let rows = self.fetch_rows(source_id).await?;
        let (cards, repaired) = parse_sheet(rows)?;

        if !repaired.is_empty() {
            // Best effort: the in-memory set is already consistent, and a
            // later reload would regenerate the same fix.
            match self.auth.ensure_fresh_token().await {
                Ok(token) => {
                    if let Err(e) = self.api.batch_update(&token, source_id, &repaired).await {
                        eprintln!("Failed to write back {} repaired id(s): {}", repaired.len(), e);
                    }
                }
                Err(e) => eprintln!("Failed to write back repaired id(s): {}", e),
            }
        }

        Ok(cards)
    }

    async fn write(&self, source_id: &str, card: &Card) -> Result<WriteOutcome, SyncError> {
        let rows = self.fetch_rows(source_id).await?;
        let headers = rows.first().ok_or(SyncError::RowNotFound)?;
        let map = ColumnMap::from_headers(headers)?;

        let row_number = find_row_in(&map, &rows, card).ok_or(SyncError::RowNotFound)?;
        if remote_is_newer(&map, &rows[row_number - 1], card) {
            return Ok(WriteOutcome::ConflictSkipped);
        }

        let updates = cell_updates(&map, row_number, card);
        if !updates.is_empty() {
            let token = self.auth.ensure_fresh_token().await?;
            self.api.batch_update(&token, source_id, &updates).await?;
        }

        Ok(WriteOutcome::Written)
    }

    async fn write_batch(&self, source_id: &str, cards: &[Card]) -> Result<(), SyncError> {
        if cards.is_empty() {
            return Ok(());
        }

        let rows = self.fetch_rows(source_id).await?;
        let Some(headers) = rows.first() else {
            return Ok(());
        };
        let map = ColumnMap::from_headers(headers)?;

        // Best-effort batch semantics: cards whose row is gone or whose remote
        // copy is newer are dropped without a per-item signal.
        let mut updates = Vec::new();
        for card in cards {
            let Some(row_number) = find_row_in(&map, &rows, card) else {
                continue;
            };
            if remote_is_newer(&map, &rows[row_number - 1], card) {
                continue;
            }
            updates.extend(cell_updates(&map, row_number, card));
        }

        if updates.is_empty() {
            return Ok(());
        }

        let token = self.auth.ensure_fresh_token().await?;
        self.api.batch_update(&token, source_id, &updates).await?;
        Ok(())
    }
}
