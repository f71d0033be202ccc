//! File-backed notification store using JSON lines for durability.
//!
//! Every change is appended as one record before it is applied in memory, and the
//! file is replayed on open, so notifications for offline recipients survive a
//! restart.

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::memory::NotificationIndex;
use crate::core::{MarkRead, MatchError, Notification, NotificationStore};
use crate::util::ids::{NotificationId, UserId};

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Record {
    Created { notification: Notification },
    Read { id: NotificationId, recipient: UserId },
}

struct FileState {
    index: NotificationIndex,
    file: File,
}

/// Notification store persisted to `<dir>/<stream>_notifications.jsonl`.
pub struct FileNotificationStore {
    path: PathBuf,
    state: Mutex<FileState>,
}

fn io_err(err: impl std::fmt::Display) -> MatchError {
    MatchError::StoreUnavailable(err.to_string())
}

impl FileNotificationStore {
    /// Open (or create) the store under `dir`, replaying existing records.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the directory or file cannot be accessed or a
    /// record cannot be parsed.
    pub fn open(dir: impl AsRef<Path>, stream: &str) -> Result<Self, MatchError> {
        let dir = dir.as_ref();
        create_dir_all(dir).map_err(io_err)?;
        let path = dir.join(format!("{stream}_notifications.jsonl"));
        let index = Self::replay(&path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        tracing::debug!(path = %path.display(), "notification store opened");
        Ok(Self {
            path,
            state: Mutex::new(FileState { index, file }),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replay(path: &Path) -> Result<NotificationIndex, MatchError> {
        let mut index = NotificationIndex::default();
        if !path.exists() {
            return Ok(index);
        }
        let reader = BufReader::new(File::open(path).map_err(io_err)?);
        for line in reader.lines() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line).map_err(io_err)? {
                Record::Created { notification } => {
                    index.insert(notification);
                }
                Record::Read { id, recipient } => {
                    index.mark_read(id, recipient)?;
                }
            }
        }
        Ok(index)
    }

    fn append(file: &mut File, record: &Record) -> Result<(), MatchError> {
        let line = serde_json::to_string(record).map_err(io_err)?;
        writeln!(file, "{line}").map_err(io_err)?;
        file.flush().map_err(io_err)
    }
}

#[async_trait]
impl NotificationStore for FileNotificationStore {
    async fn insert_once(&self, notification: Notification) -> Result<bool, MatchError> {
        let mut state = self.state.lock();
        if state
            .index
            .contains(notification.event_id, notification.recipient_id)
        {
            return Ok(false);
        }
        let record = Record::Created {
            notification: notification.clone(),
        };
        Self::append(&mut state.file, &record)?;
        Ok(state.index.insert(notification))
    }

    async fn recent(&self, recipient: UserId, limit: usize) -> Result<Vec<Notification>, MatchError> {
        Ok(self.state.lock().index.recent(recipient, limit))
    }

    async fn unread(&self, recipient: UserId) -> Result<Vec<Notification>, MatchError> {
        Ok(self.state.lock().index.unread(recipient))
    }

    async fn unread_count(&self, recipient: UserId) -> Result<u64, MatchError> {
        Ok(self.state.lock().index.unread_count(recipient))
    }

    async fn mark_read(&self, id: NotificationId, recipient: UserId) -> Result<MarkRead, MatchError> {
        let mut state = self.state.lock();
        if state.index.check_read(id, recipient)? {
            return Ok(MarkRead::AlreadyRead);
        }
        Self::append(&mut state.file, &Record::Read { id, recipient })?;
        state.index.mark_read(id, recipient)
    }
}
