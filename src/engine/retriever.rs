//! Retrieval provider factory
//!
//! Topic args carry the provider as a string key. The key is resolved to a
//! closed enum variant once, at session-creation time; unknown keys and
//! missing API keys are rejected there instead of surfacing mid-turn.

use crate::config::SecretsConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrieverKind {
    Bing,
    You,
    Brave,
    DuckDuckGo,
    Serper,
    Tavily,
    SearxNg,
    Semantic,
}

/// Keys accepted in topic args, in the order reported to users
pub const RETRIEVER_KEYS: &[&str] = &[
    "bing",
    "you",
    "brave",
    "duckduckgo",
    "serper",
    "tavily",
    "searxng",
    "semantic",
];

#[derive(Debug, Error)]
pub enum RetrieverError {
    #[error("unsupported retriever '{key}', expected one of: {expected}")]
    UnknownKey { key: String, expected: String },

    #[error("retriever '{0}' requires an API key in secrets.toml")]
    MissingApiKey(&'static str),
}

impl RetrieverKind {
    pub fn from_key(key: &str) -> Result<Self, RetrieverError> {
        match key {
            "bing" => Ok(RetrieverKind::Bing),
            "you" => Ok(RetrieverKind::You),
            "brave" => Ok(RetrieverKind::Brave),
            "duckduckgo" => Ok(RetrieverKind::DuckDuckGo),
            "serper" => Ok(RetrieverKind::Serper),
            "tavily" => Ok(RetrieverKind::Tavily),
            "searxng" => Ok(RetrieverKind::SearxNg),
            "semantic" => Ok(RetrieverKind::Semantic),
            other => Err(RetrieverError::UnknownKey {
                key: other.to_string(),
                expected: RETRIEVER_KEYS.join(", "),
            }),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            RetrieverKind::Bing => "bing",
            RetrieverKind::You => "you",
            RetrieverKind::Brave => "brave",
            RetrieverKind::DuckDuckGo => "duckduckgo",
            RetrieverKind::Serper => "serper",
            RetrieverKind::Tavily => "tavily",
            RetrieverKind::SearxNg => "searxng",
            RetrieverKind::Semantic => "semantic",
        }
    }

    /// DuckDuckGo is the only keyless provider
    fn requires_api_key(&self) -> bool {
        !matches!(self, RetrieverKind::DuckDuckGo)
    }
}

/// A fully resolved retriever configuration, sent to the engine with every
/// call. Never persisted in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRetriever {
    pub kind: RetrieverKind,
    pub top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Resolve a retriever key against the secrets table
pub fn resolve_retriever(
    key: &str,
    top_k: u32,
    secrets: &SecretsConfig,
) -> Result<ResolvedRetriever, RetrieverError> {
    let kind = RetrieverKind::from_key(key)?;

    let api_key = secrets.get_token(kind.key()).cloned();
    if kind.requires_api_key() && api_key.is_none() {
        return Err(RetrieverError::MissingApiKey(kind.key()));
    }

    Ok(ResolvedRetriever { kind, top_k, api_key })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets_with(key: &str, value: &str) -> SecretsConfig {
        let mut secrets = SecretsConfig::default();
        secrets.api_tokens.insert(key.to_string(), value.to_string());
        secrets
    }

    #[test]
    fn test_all_keys_resolve_to_kinds() {
        for key in RETRIEVER_KEYS {
            assert_eq!(RetrieverKind::from_key(key).unwrap().key(), *key);
        }
    }

    #[test]
    fn test_unknown_key_rejected_with_expected_list() {
        let err = RetrieverKind::from_key("google").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("google"));
        assert!(message.contains("duckduckgo"));
    }

    #[test]
    fn test_resolve_requires_api_key() {
        let err = resolve_retriever("bing", 10, &SecretsConfig::default()).unwrap_err();
        assert!(matches!(err, RetrieverError::MissingApiKey("bing")));
    }

    #[test]
    fn test_resolve_with_api_key() {
        let resolved = resolve_retriever("bing", 7, &secrets_with("bing", "k")).unwrap();
        assert_eq!(resolved.kind, RetrieverKind::Bing);
        assert_eq!(resolved.top_k, 7);
        assert_eq!(resolved.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_duckduckgo_needs_no_key() {
        let resolved = resolve_retriever("duckduckgo", 10, &SecretsConfig::default()).unwrap();
        assert_eq!(resolved.kind, RetrieverKind::DuckDuckGo);
        assert!(resolved.api_key.is_none());
    }
}
