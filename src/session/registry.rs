// SPDX-License-Identifier: GPL-3.0-only

//! Registry of sessions keyed by their public hash
//!
//! The delivery side (download server, QR links) looks sessions up by
//! hash, never by folder. The registry is the one shared store; readers
//! get cloned records, never references into it.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

/// What the delivery side needs to know about a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    /// Per-session photo folder
    pub folder: PathBuf,
    /// Saved shots in capture order
    pub photos: Vec<PathBuf>,
    /// When the session started
    pub created_at: DateTime<Local>,
}

/// Thread-safe session store
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session under its hash
    pub fn register(&self, hash: &str, folder: PathBuf, created_at: DateTime<Local>) {
        let mut sessions = self.lock();
        if sessions.contains_key(hash) {
            warn!(hash, "Session hash already registered, replacing");
        }
        sessions.insert(
            hash.to_string(),
            SessionRecord {
                folder,
                photos: Vec::new(),
                created_at,
            },
        );
        debug!(hash, "Session registered");
    }

    /// Append a saved photo to a session's record
    pub fn append_photo(&self, hash: &str, photo: PathBuf) {
        let mut sessions = self.lock();
        match sessions.get_mut(hash) {
            Some(record) => record.photos.push(photo),
            None => warn!(hash, "Photo appended for unknown session"),
        }
    }

    /// Cloned record for a hash
    pub fn get(&self, hash: &str) -> Option<SessionRecord> {
        self.lock().get(hash).cloned()
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all records. Administrative use only; cancelled sessions stay
    /// registered so already-printed QR codes keep resolving.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionRecord>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
