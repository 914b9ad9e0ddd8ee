// ── File-backed LocalCache ──
//
// One JSON document holding the roster and the time it was fetched. A
// missing, unreadable, or corrupt file reads as "nothing cached".

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use apwatch_core::{LocalCache, Roster, StoreError};

pub const CACHE_FILE_NAME: &str = "roster.json";

#[derive(Debug, Serialize, Deserialize)]
struct CacheDocument {
    fetched_at: DateTime<Utc>,
    access_points: Roster,
}

#[derive(Debug, Clone)]
pub struct FileRosterCache {
    path: PathBuf,
}

impl FileRosterCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Option<CacheDocument> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "roster cache unreadable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "roster cache corrupt, ignoring");
                None
            }
        }
    }
}

impl LocalCache for FileRosterCache {
    fn save(&self, roster: &Roster, fetched_at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let doc = CacheDocument {
            fetched_at,
            access_points: roster.clone(),
        };
        let json = serde_json::to_vec_pretty(&doc)?;

        // Write beside the target and rename so readers never see a torn file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), access_points = roster.len(), "roster cached");
        Ok(())
    }

    fn load(&self) -> Option<Roster> {
        self.read().map(|doc| doc.access_points)
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.read().map(|doc| doc.fetched_at)
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
