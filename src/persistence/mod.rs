use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::SyncError;

const APP_NAME: &str = "cramsheet";

pub fn get_app_data_dir() -> PathBuf {
    if let Some(data_dir) = dirs::data_local_dir() {
        let app_dir = data_dir.join(APP_NAME);
        let _ = fs::create_dir_all(&app_dir);
        app_dir
    } else {
        PathBuf::from(".")
    }
}

/// Write-through helper: every durable structure persists through this before
/// its in-memory state is considered authoritative.
pub fn save_json_to<T: Serialize>(data: &T, path: &Path) -> Result<(), SyncError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_json_from<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }

    match fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str(&json) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                T::default()
            }
        },
        Err(e) => {
            eprintln!("Failed to read {}: {}. Using defaults.", path.display(), e);
            T::default()
        }
    }
}
