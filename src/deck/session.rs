use chrono::{
    DateTime,
    Utc,
};

use crate::core::Card;

/// One review decision as a pure transformation: the chosen interval becomes
/// the card's study interval and the review time its last-seen stamp. Storage
/// is none of this function's business; hand the result to the deck manager.
pub fn review(card: &Card, chosen_interval: &str, now: DateTime<Utc>) -> Card {
    let mut updated = card.clone();
    updated.interval = Some(chosen_interval.to_string());
    updated.last_seen = Some(now);
    updated
}
