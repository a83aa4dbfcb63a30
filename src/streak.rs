use chrono::NaiveDate;
use serde::{
    Deserialize,
    Serialize,
};

/// Consecutive-study-day counter. Purely date arithmetic: reviewing twice in
/// one day is one day of streak, skipping a full day resets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    current: u32,
    last_study_day: Option<NaiveDate>,
}

impl Streak {
    pub fn record_study(&mut self, today: NaiveDate) {
        match self.last_study_day {
            Some(last) if last == today => {}
            Some(last) if (today - last).num_days() == 1 => {
                self.current += 1;
                self.last_study_day = Some(today);
            }
            _ => {
                self.current = 1;
                self.last_study_day = Some(today);
            }
        }
    }

    /// The streak as of `today`: still alive through the day after the last
    /// study day, zero once a full day has been missed.
    pub fn current_for(&self, today: NaiveDate) -> u32 {
        match self.last_study_day {
            Some(last) if (today - last).num_days() <= 1 => self.current,
            _ => 0,
        }
    }
}
