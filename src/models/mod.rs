//! Shared data types for topics, sessions and API payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engine construction parameters stored on a topic.
///
/// These mirror the runner arguments the research engine accepts. A topic's
/// args are fixed at creation and reused for every session spawned under it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicArgs {
    /// Retrieval provider key, resolved to a concrete variant at
    /// session-creation time (unknown keys rejected there)
    #[serde(default = "default_retriever")]
    pub retriever: String,
    #[serde(default = "default_retrieve_top_k")]
    pub retrieve_top_k: u32,
    #[serde(default = "default_max_search_queries")]
    pub max_search_queries: u32,
    #[serde(default = "default_total_conv_turn")]
    pub total_conv_turn: u32,
    #[serde(default = "default_max_search_thread")]
    pub max_search_thread: u32,
    #[serde(default = "default_max_search_queries_per_turn")]
    pub max_search_queries_per_turn: u32,
    #[serde(default = "default_warmstart_max_num_experts")]
    pub warmstart_max_num_experts: u32,
    #[serde(default = "default_warmstart_max_turn_per_experts")]
    pub warmstart_max_turn_per_experts: u32,
    #[serde(default = "default_warmstart_max_thread")]
    pub warmstart_max_thread: u32,
    #[serde(default = "default_max_thread_num")]
    pub max_thread_num: u32,
    #[serde(default = "default_max_num_round_table_experts")]
    pub max_num_round_table_experts: u32,
    #[serde(default = "default_moderator_override")]
    pub moderator_override_n_consecutive_answering_turn: u32,
    #[serde(default = "default_node_expansion_trigger_count")]
    pub node_expansion_trigger_count: u32,
}

fn default_retriever() -> String {
    "you".to_string()
}
fn default_retrieve_top_k() -> u32 {
    10
}
fn default_max_search_queries() -> u32 {
    3
}
fn default_total_conv_turn() -> u32 {
    20
}
fn default_max_search_thread() -> u32 {
    5
}
fn default_max_search_queries_per_turn() -> u32 {
    3
}
fn default_warmstart_max_num_experts() -> u32 {
    3
}
fn default_warmstart_max_turn_per_experts() -> u32 {
    2
}
fn default_warmstart_max_thread() -> u32 {
    3
}
fn default_max_thread_num() -> u32 {
    10
}
fn default_max_num_round_table_experts() -> u32 {
    2
}
fn default_moderator_override() -> u32 {
    3
}
fn default_node_expansion_trigger_count() -> u32 {
    10
}

impl Default for TopicArgs {
    fn default() -> Self {
        // serde defaults are the single source of truth
        serde_json::from_value(serde_json::json!({})).expect("empty args must deserialize")
    }
}

/// A research topic owned by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub args: TopicArgs,
}

/// Topic listing entry returned by `GET /topics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicView {
    pub id: String,
    pub name: String,
    pub args: TopicArgs,
}

/// Session listing entry returned by `GET /topics/{id}/sessions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: u64,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub message_count: u32,
    pub last_message: Option<String>,
}

/// One conversation message as returned by `GET /sessions/{id}/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: u64,
    pub role: String,
    pub content: String,
    pub msg_type: String,
    pub timestamp: DateTime<Utc>,
}

/// One report as returned by `GET /sessions/{id}/reports`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportView {
    pub id: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Message type tags
pub mod msg_type {
    pub const TEXT: &str = "text";
    pub const NOTIFICATION: &str = "notification";
}

/// Well-known participant roles; engines may emit additional names
pub mod role {
    pub const USER: &str = "user";
    pub const SYSTEM: &str = "system";
    pub const MODERATOR: &str = "moderator";
    pub const EXPERT: &str = "expert";
}
