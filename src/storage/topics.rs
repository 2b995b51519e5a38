//! Topic file storage
//!
//! Stores topics in `topics/{id}.json`. Topics are immutable once created
//! (there is no update path); deletion cascades to the topic's sessions.

use super::{atomic_write, ensure_dir, read_json, FileResult};
use crate::models::{Topic, TopicArgs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Version of the topic file format
const TOPIC_FILE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicFile {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
    pub topic: TopicData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicData {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub args: TopicArgs,
}

impl TopicFile {
    pub fn to_topic(&self) -> Topic {
        Topic {
            id: self.topic.id.clone(),
            user_id: self.topic.user_id.clone(),
            name: self.topic.name.clone(),
            created_at: self.topic.created_at,
            args: self.topic.args.clone(),
        }
    }
}

pub fn get_topics_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("topics")
}

pub fn get_topic_file_path(data_dir: &Path, topic_id: &str) -> PathBuf {
    get_topics_dir(data_dir).join(format!("{}.json", topic_id))
}

/// Save a topic to file
pub fn save_topic(data_dir: &Path, topic: &Topic) -> FileResult<PathBuf> {
    let topics_dir = get_topics_dir(data_dir);
    ensure_dir(&topics_dir)?;

    let file_path = get_topic_file_path(data_dir, &topic.id);
    let topic_file = TopicFile {
        version: TOPIC_FILE_VERSION,
        updated_at: Utc::now(),
        topic: TopicData {
            id: topic.id.clone(),
            user_id: topic.user_id.clone(),
            name: topic.name.clone(),
            created_at: topic.created_at,
            args: topic.args.clone(),
        },
    };

    let content = serde_json::to_string_pretty(&topic_file)
        .map_err(|e| format!("Failed to serialize topic: {}", e))?;
    atomic_write(&file_path, &content)?;

    log::debug!("Saved topic {} to {:?}", topic.id, file_path);
    Ok(file_path)
}

/// Read a topic, or None if it does not exist
pub fn read_topic(data_dir: &Path, topic_id: &str) -> FileResult<Option<Topic>> {
    let file_path = get_topic_file_path(data_dir, topic_id);
    if !file_path.exists() {
        return Ok(None);
    }
    let topic_file: TopicFile = read_json(&file_path)?;
    Ok(Some(topic_file.to_topic()))
}

/// Read a topic only if it belongs to `user_id`
pub fn read_owned_topic(
    data_dir: &Path,
    topic_id: &str,
    user_id: &str,
) -> FileResult<Option<Topic>> {
    Ok(read_topic(data_dir, topic_id)?.filter(|t| t.user_id == user_id))
}

/// List topics owned by a user, most recent first
pub fn list_topics(data_dir: &Path, user_id: &str) -> FileResult<Vec<Topic>> {
    let topics_dir = get_topics_dir(data_dir);
    if !topics_dir.exists() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(&topics_dir)
        .map_err(|e| format!("Failed to read topics directory: {}", e))?;

    let mut topics = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read directory entry: {}", e))?;
        let path = entry.path();
        if path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }

        match read_json::<TopicFile>(&path) {
            Ok(file) if file.topic.user_id == user_id => topics.push(file.to_topic()),
            Ok(_) => {}
            Err(e) => {
                log::warn!("Failed to read topic file {:?}: {}", path, e);
            }
        }
    }

    topics.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(topics)
}

/// Delete a topic file. Cascading session deletion is handled by the
/// caller via `sessions::delete_sessions_for_topic`.
pub fn delete_topic(data_dir: &Path, topic_id: &str) -> FileResult<()> {
    let file_path = get_topic_file_path(data_dir, topic_id);
    if file_path.exists() {
        fs::remove_file(&file_path).map_err(|e| format!("Failed to delete topic file: {}", e))?;
        log::info!("Deleted topic file: {:?}", file_path);
    }
    Ok(())
}
