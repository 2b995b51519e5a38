//! Versioned encoding of the engine's working state
//!
//! A snapshot is the opaque document persisted per session. The version
//! tag is checked before any field is interpreted; unknown versions are
//! rejected rather than guessed at.

use super::EngineState;
use serde_json::Value;
use thiserror::Error;

/// Version of the snapshot document format
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unrecognized snapshot version {0}")]
    UnknownVersion(u64),

    #[error("malformed snapshot: {0}")]
    Malformed(String),
}

/// Encode engine state into a versioned snapshot document
pub fn encode(state: &EngineState) -> Value {
    serde_json::json!({
        "version": SNAPSHOT_VERSION,
        "state": state,
    })
}

/// Decode a snapshot document, rejecting unknown versions
pub fn decode(snapshot: &Value) -> Result<EngineState, SnapshotError> {
    let version = snapshot
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| SnapshotError::Malformed("missing version tag".to_string()))?;

    if version != SNAPSHOT_VERSION as u64 {
        return Err(SnapshotError::UnknownVersion(version));
    }

    let state = snapshot
        .get("state")
        .ok_or_else(|| SnapshotError::Malformed("missing state".to_string()))?;

    serde_json::from_value(state.clone()).map_err(|e| SnapshotError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ConvTurn;

    fn sample_state() -> EngineState {
        EngineState {
            topic: "test topic".to_string(),
            history: vec![ConvTurn {
                role: "moderator".to_string(),
                utterance: "welcome".to_string(),
            }],
            experts: vec!["economist".to_string()],
            knowledge_base: serde_json::json!({"root": {"children": []}}),
        }
    }

    #[test]
    fn test_round_trip() {
        let state = sample_state();
        let decoded = decode(&encode(&state)).unwrap();
        assert_eq!(decoded.topic, state.topic);
        assert_eq!(decoded.history.len(), 1);
        assert_eq!(decoded.history[0].role, "moderator");
        assert_eq!(decoded.experts, state.experts);
        assert_eq!(decoded.knowledge_base, state.knowledge_base);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut doc = encode(&sample_state());
        doc["version"] = serde_json::json!(99);
        match decode(&doc) {
            Err(SnapshotError::UnknownVersion(99)) => {}
            other => panic!("expected UnknownVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_version_rejected() {
        let doc = serde_json::json!({"state": {}});
        assert!(matches!(decode(&doc), Err(SnapshotError::Malformed(_))));
    }

    #[test]
    fn test_garbage_state_rejected() {
        let doc = serde_json::json!({"version": 1, "state": {"topic": 42}});
        assert!(matches!(decode(&doc), Err(SnapshotError::Malformed(_))));
    }
}
