use chrono::{
    DateTime,
    NaiveDateTime,
    SecondsFormat,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use uuid::Uuid;

/// Priority value for rows that never set one. Largest representable value so
/// "unset" always sorts behind every explicit priority tier.
pub const UNSET_PRIORITY: i64 = i64::MAX;

/// One study unit, backed by one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub front: String,
    pub back: String,
    pub category: String,
    pub priority_level: i64,
    pub last_seen: Option<DateTime<Utc>>,
    pub interval: Option<String>, // Catalog label chosen at the last review
    pub status: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Card {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            front: front.into(),
            back: back.into(),
            ..Self::default()
        }
    }

    pub fn is_inactive(&self) -> bool {
        self.status.as_deref() == Some("Inactive")
    }
}

impl Default for Card {
    fn default() -> Self {
        Self {
            id: String::new(),
            front: String::new(),
            back: String::new(),
            category: String::new(),
            priority_level: UNSET_PRIORITY,
            last_seen: None,
            interval: None,
            status: None,
            updated_at: None,
        }
    }
}

/// A write that failed to reach the remote store and must eventually be
/// retried. Only the fields a review mutates ride along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub id: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub interval: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PendingUpdate {
    /// Lay this update over a freshly loaded card. Local study state wins over
    /// the stale remote copy; the timestamp rides along so a later flush still
    /// carries the local stamp for the conflict check.
    pub fn apply_to(&self, card: &mut Card) {
        card.last_seen = self.last_seen;
        card.interval = self.interval.clone();
        card.updated_at = self.updated_at;
    }
}

impl From<&Card> for PendingUpdate {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            last_seen: card.last_seen,
            interval: card.interval.clone(),
            updated_at: card.updated_at,
        }
    }
}

/// Lenient timestamp parsing for spreadsheet cells. Anything unparseable is
/// `None`, which downstream code treats as "never" (fail-open).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
