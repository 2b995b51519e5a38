//! Research engine abstraction
//!
//! The engine that plans turns, runs retrieval and drafts report text is an
//! external collaborator. This module defines the narrow contract we hold
//! it to (`ResearchEngine`), the working state we shuttle in and out of it
//! (`EngineState`), and the handle that couples state with a fresh runtime
//! configuration for the duration of one request (`EngineHandle`).

pub mod remote;
pub mod retriever;
pub mod snapshot;

pub use remote::RemoteEngine;
pub use retriever::{resolve_retriever, ResolvedRetriever, RetrieverError, RetrieverKind};
pub use snapshot::{SnapshotError, SNAPSHOT_VERSION};

use crate::models::{role, TopicArgs};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// One unit of conversation: a speaker and what they said
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvTurn {
    pub role: String,
    pub utterance: String,
}

/// The engine's complete working state for one session.
///
/// `knowledge_base` is carried as an opaque JSON value; its shape (the
/// discourse graph, accumulated snippets) belongs to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineState {
    pub topic: String,
    #[serde(default)]
    pub history: Vec<ConvTurn>,
    #[serde(default)]
    pub experts: Vec<String>,
    #[serde(default)]
    pub knowledge_base: Value,
}

impl EngineState {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            history: Vec::new(),
            experts: Vec::new(),
            knowledge_base: Value::Null,
        }
    }
}

/// Configuration handed to the engine on every call. Rebuilt from the
/// owning topic's args per request, never persisted with the snapshot, so
/// retriever or limit changes take effect without touching stored sessions.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeConfig {
    pub topic: String,
    pub args: TopicArgs,
    pub retriever: ResolvedRetriever,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine request failed: {0}")]
    Request(String),

    #[error("engine returned a malformed response: {0}")]
    Malformed(String),
}

/// The external engine contract. Calls are blocking and long-running
/// (retrieval rounds take seconds to minutes); callers run them on a
/// blocking task, never on the async runtime threads.
pub trait ResearchEngine: Send + Sync {
    /// Populate initial context before the first turn
    fn warm_start(&self, config: &RuntimeConfig, state: &mut EngineState)
        -> Result<(), EngineError>;

    /// Produce exactly one next turn; the engine decides who speaks
    fn next_turn(
        &self,
        config: &RuntimeConfig,
        state: &mut EngineState,
    ) -> Result<ConvTurn, EngineError>;

    /// Reorganize accumulated knowledge and synthesize a report
    fn generate_report(
        &self,
        config: &RuntimeConfig,
        state: &mut EngineState,
    ) -> Result<String, EngineError>;
}

/// A live engine handle for one request: decoded state plus the fresh
/// runtime configuration. Dropped after the snapshot is re-persisted.
pub struct EngineHandle {
    config: RuntimeConfig,
    state: EngineState,
    engine: Arc<dyn ResearchEngine>,
}

impl EngineHandle {
    /// Fresh handle for a new session (state starts empty, warm start pending)
    pub fn fresh(config: RuntimeConfig, engine: Arc<dyn ResearchEngine>) -> Self {
        let state = EngineState::new(&config.topic);
        Self {
            config,
            state,
            engine,
        }
    }

    /// Rehydrate a handle from a persisted snapshot document
    pub fn rehydrate(
        snapshot_doc: &Value,
        config: RuntimeConfig,
        engine: Arc<dyn ResearchEngine>,
    ) -> Result<Self, SnapshotError> {
        let state = snapshot::decode(snapshot_doc)?;
        Ok(Self {
            config,
            state,
            engine,
        })
    }

    pub fn warm_start(&mut self) -> Result<(), EngineError> {
        self.engine.warm_start(&self.config, &mut self.state)
    }

    /// Append a user-authored turn to the live conversation. Purely local;
    /// the engine sees it on the next `advance`.
    pub fn inject_utterance(&mut self, text: &str) {
        self.state.history.push(ConvTurn {
            role: role::USER.to_string(),
            utterance: text.to_string(),
        });
    }

    /// Ask the engine for exactly one generated turn
    pub fn advance(&mut self) -> Result<ConvTurn, EngineError> {
        self.engine.next_turn(&self.config, &mut self.state)
    }

    /// One-shot knowledge reorganization plus report synthesis
    pub fn finalize(&mut self) -> Result<String, EngineError> {
        self.engine.generate_report(&self.config, &mut self.state)
    }

    /// Encode the current state as a versioned snapshot document
    pub fn snapshot(&self) -> Value {
        snapshot::encode(&self.state)
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }
}
