//! Session state store
//!
//! One JSON document per session at `sessions/{session_id}.json` holding
//! the current engine snapshot plus the embedded message log and report
//! history, so a step commits everything in one atomic replace. The
//! listing index at `sessions/index.json` also carries the internal
//! numeric id counter; index updates run under an advisory directory lock.
//!
//! A document that fails to parse surfaces as `StoreError::Corrupt`,
//! never as an empty session.

use super::{atomic_write, ensure_dir, read_json, with_dir_lock, FileResult};
use crate::models::{MessageView, ReportView, SessionSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version of the session file format
const SESSION_FILE_VERSION: u32 = 1;

/// Version of the index file format
const INDEX_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found")]
    NotFound,

    #[error("session file is corrupt: {0}")]
    Corrupt(String),

    #[error("storage error: {0}")]
    Io(String),
}

/// Session file structure with embedded messages and reports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    /// File format version
    pub version: u32,
    /// When this file was last updated
    pub updated_at: DateTime<Utc>,
    /// The session data
    pub session: SessionData,
    /// Versioned engine snapshot document (opaque to the store)
    pub snapshot: Value,
    /// Messages in canonical (timestamp) order
    pub messages: Vec<MessageData>,
    /// Reports, oldest first
    pub reports: Vec<ReportData>,
    /// Next per-session message id
    pub next_message_id: u64,
    /// Next per-session report id
    pub next_report_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    /// Internal numeric id, allocated from the index counter
    pub id: u64,
    /// Externally visible identifier
    pub session_id: String,
    pub topic_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    pub id: u64,
    pub role: String,
    pub content: String,
    pub msg_type: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Session index entry (minimal info for the topic-sessions listing)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIndexEntry {
    pub id: u64,
    pub session_id: String,
    pub topic_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: u32,
    pub last_message: Option<String>,
}

/// Index file: listing entries plus the internal id counter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub next_id: u64,
    pub entries: Vec<SessionIndexEntry>,
}

impl Default for IndexFile {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            updated_at: Utc::now(),
            next_id: 1,
            entries: Vec::new(),
        }
    }
}

impl SessionFile {
    /// Start a new session document around an initial snapshot
    pub fn new(id: u64, session_id: &str, topic_id: &str, snapshot: Value) -> Self {
        Self {
            version: SESSION_FILE_VERSION,
            updated_at: Utc::now(),
            session: SessionData {
                id,
                session_id: session_id.to_string(),
                topic_id: topic_id.to_string(),
                created_at: Utc::now(),
            },
            snapshot,
            messages: Vec::new(),
            reports: Vec::new(),
            next_message_id: 1,
            next_report_id: 1,
        }
    }

    /// Append a message, keeping timestamps non-decreasing even if the
    /// wall clock steps backwards between commits.
    pub fn append_message(&mut self, role: &str, content: &str, msg_type: &str) -> &MessageData {
        let now = Utc::now();
        let timestamp = match self.messages.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        let message = MessageData {
            id: self.next_message_id,
            role: role.to_string(),
            content: content.to_string(),
            msg_type: msg_type.to_string(),
            timestamp,
        };
        self.next_message_id += 1;
        self.messages.push(message);
        self.messages.last().expect("just pushed")
    }

    /// Append a report row, returning its id
    pub fn append_report(&mut self, content: &str) -> u64 {
        let id = self.next_report_id;
        self.next_report_id += 1;
        self.reports.push(ReportData {
            id,
            content: content.to_string(),
            created_at: Utc::now(),
        });
        id
    }

    pub fn to_summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.session.id,
            session_id: self.session.session_id.clone(),
            created_at: self.session.created_at,
            message_count: self.messages.len() as u32,
            last_message: self.messages.last().map(|m| m.content.clone()),
        }
    }

    /// Messages in canonical ascending-timestamp order
    pub fn message_views(&self) -> Vec<MessageView> {
        self.messages
            .iter()
            .map(|m| MessageView {
                id: m.id,
                role: m.role.clone(),
                content: m.content.clone(),
                msg_type: m.msg_type.clone(),
                timestamp: m.timestamp,
            })
            .collect()
    }

    /// Reports in descending creation order (latest is authoritative)
    pub fn report_views(&self) -> Vec<ReportView> {
        let mut views: Vec<ReportView> = self
            .reports
            .iter()
            .map(|r| ReportView {
                id: r.id,
                content: r.content.clone(),
                created_at: r.created_at,
            })
            .collect();
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        views
    }

    fn to_index_entry(&self) -> SessionIndexEntry {
        SessionIndexEntry {
            id: self.session.id,
            session_id: self.session.session_id.clone(),
            topic_id: self.session.topic_id.clone(),
            created_at: self.session.created_at,
            updated_at: self.updated_at,
            message_count: self.messages.len() as u32,
            last_message: self.messages.last().map(|m| m.content.clone()),
        }
    }
}

pub fn get_sessions_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("sessions")
}

pub fn get_session_file_path(data_dir: &Path, session_id: &str) -> PathBuf {
    get_sessions_dir(data_dir).join(format!("{}.json", session_id))
}

fn get_index_path(data_dir: &Path) -> PathBuf {
    get_sessions_dir(data_dir).join("index.json")
}

fn read_index(data_dir: &Path) -> FileResult<IndexFile> {
    let index_path = get_index_path(data_dir);
    if !index_path.exists() {
        return Ok(IndexFile::default());
    }
    read_json(&index_path)
}

fn write_index(data_dir: &Path, index: &IndexFile) -> FileResult<()> {
    let content = serde_json::to_string_pretty(index)
        .map_err(|e| format!("Failed to serialize session index: {}", e))?;
    atomic_write(&get_index_path(data_dir), &content)
}

/// Allocate the next internal session id from the index counter
pub fn allocate_session_id(data_dir: &Path) -> FileResult<u64> {
    let sessions_dir = get_sessions_dir(data_dir);
    with_dir_lock(&sessions_dir, || {
        let mut index = read_index(data_dir)?;
        let id = index.next_id;
        index.next_id += 1;
        index.updated_at = Utc::now();
        write_index(data_dir, &index)?;
        Ok(id)
    })
}

/// Read a session document. Missing file is `NotFound`; a document that
/// fails to parse is `Corrupt`.
pub fn read_session_file(data_dir: &Path, session_id: &str) -> Result<SessionFile, StoreError> {
    let file_path = get_session_file_path(data_dir, session_id);
    if !file_path.exists() {
        return Err(StoreError::NotFound);
    }

    let content = fs::read_to_string(&file_path)
        .map_err(|e| StoreError::Io(format!("Failed to read {:?}: {}", file_path, e)))?;

    serde_json::from_str(&content).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// Persist a session document atomically and refresh its index entry
pub fn save_session_file(data_dir: &Path, mut file: SessionFile) -> FileResult<SessionFile> {
    let sessions_dir = get_sessions_dir(data_dir);
    ensure_dir(&sessions_dir)?;

    file.updated_at = Utc::now();

    let file_path = get_session_file_path(data_dir, &file.session.session_id);
    let content = serde_json::to_string_pretty(&file)
        .map_err(|e| format!("Failed to serialize session: {}", e))?;
    atomic_write(&file_path, &content)?;

    let entry = file.to_index_entry();
    with_dir_lock(&sessions_dir, || {
        let mut index = read_index(data_dir)?;
        match index
            .entries
            .iter_mut()
            .find(|e| e.session_id == entry.session_id)
        {
            Some(existing) => *existing = entry.clone(),
            None => index.entries.push(entry.clone()),
        }
        index.updated_at = Utc::now();
        write_index(data_dir, &index)
    })?;

    log::debug!(
        "Saved session {} to {:?}",
        file.session.session_id,
        file_path
    );
    Ok(file)
}

/// Check if a session document exists
pub fn session_exists(data_dir: &Path, session_id: &str) -> bool {
    get_session_file_path(data_dir, session_id).exists()
}

/// Delete one session document and its index entry
pub fn delete_session_file(data_dir: &Path, session_id: &str) -> FileResult<()> {
    let file_path = get_session_file_path(data_dir, session_id);
    if file_path.exists() {
        fs::remove_file(&file_path)
            .map_err(|e| format!("Failed to delete session file: {}", e))?;
        log::info!("Deleted session file: {:?}", file_path);
    }

    let sessions_dir = get_sessions_dir(data_dir);
    with_dir_lock(&sessions_dir, || {
        let mut index = read_index(data_dir)?;
        let initial_len = index.entries.len();
        index.entries.retain(|e| e.session_id != session_id);
        if index.entries.len() != initial_len {
            index.updated_at = Utc::now();
            write_index(data_dir, &index)?;
        }
        Ok(())
    })
}

/// Cascade: delete every session belonging to a topic. Returns the
/// external ids of the deleted sessions so callers can drop their locks.
pub fn delete_sessions_for_topic(data_dir: &Path, topic_id: &str) -> FileResult<Vec<String>> {
    let index = read_index(data_dir)?;
    let doomed: Vec<String> = index
        .entries
        .iter()
        .filter(|e| e.topic_id == topic_id)
        .map(|e| e.session_id.clone())
        .collect();

    for session_id in &doomed {
        delete_session_file(data_dir, session_id)?;
    }
    Ok(doomed)
}

/// List a topic's sessions from the index, oldest first
pub fn list_sessions_for_topic(data_dir: &Path, topic_id: &str) -> FileResult<Vec<SessionSummary>> {
    let index = read_index(data_dir)?;
    let mut summaries: Vec<SessionSummary> = index
        .entries
        .iter()
        .filter(|e| e.topic_id == topic_id)
        .map(|e| SessionSummary {
            id: e.id,
            session_id: e.session_id.clone(),
            created_at: e.created_at,
            message_count: e.message_count,
            last_message: e.last_message.clone(),
        })
        .collect();
    summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Ok(summaries)
}
