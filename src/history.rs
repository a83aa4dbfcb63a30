use std::{
    collections::VecDeque,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    core::SyncError,
    persistence::{
        load_json_from,
        save_json_to,
    },
};

const HISTORY_FILE: &str = "study_history.json";
const MAX_ENTRIES: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckVisit {
    pub source_id: String,
    pub display_name: String,
    pub last_opened: chrono::DateTime<chrono::Utc>,
    pub visit_count: u32,
}

impl DeckVisit {
    pub fn format_last_opened(&self) -> String {
        let local_time = self.last_opened.with_timezone(&chrono::Local);
        local_time.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Most-recently-studied decks, persisted as JSON. Independent of the
/// scheduling core; recording a visit is fire-and-forget for callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyHistory {
    visits: VecDeque<DeckVisit>,
    max_entries: usize,
    #[serde(skip)]
    file_path: Option<PathBuf>,
}

impl Default for StudyHistory {
    fn default() -> Self {
        Self { visits: VecDeque::new(), max_entries: MAX_ENTRIES, file_path: None }
    }
}

impl StudyHistory {
    pub fn load(data_dir: &Path) -> Self {
        let file_path = data_dir.join(HISTORY_FILE);
        let mut history: StudyHistory = load_json_from(&file_path);
        history.file_path = Some(file_path);
        history
    }

    pub fn record_visit(
        &mut self,
        source_id: &str,
        display_name: &str,
    ) -> Result<(), SyncError> {
        let visit_count = self
            .visits
            .iter()
            .find(|visit| visit.source_id == source_id)
            .map(|visit| visit.visit_count + 1)
            .unwrap_or(1);

        self.visits.retain(|visit| visit.source_id != source_id);
        self.visits.push_front(DeckVisit {
            source_id: source_id.to_string(),
            display_name: display_name.to_string(),
            last_opened: chrono::Utc::now(),
            visit_count,
        });

        while self.visits.len() > self.max_entries {
            self.visits.pop_back();
        }

        self.save()
    }

    pub fn visits(&self) -> &VecDeque<DeckVisit> {
        &self.visits
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn clear(&mut self) -> Result<(), SyncError> {
        self.visits.clear();
        self.save()
    }

    fn save(&self) -> Result<(), SyncError> {
        match &self.file_path {
            Some(path) => save_json_to(self, path),
            None => Ok(()), // in-memory only, nothing to persist
        }
    }
}
