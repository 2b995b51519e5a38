//! HTTP transport to the research engine service
//!
//! The engine runs as its own service; we exchange the full working state
//! with every call. Endpoints:
//!
//! - `POST {base}/warm-start`  {config, state}            -> {state}
//! - `POST {base}/next-turn`   {config, state}            -> {state, turn}
//! - `POST {base}/report`      {config, state}            -> {state, content}
//!
//! Calls are blocking with a long timeout; the controller runs them on a
//! blocking task. Any transport or decode failure maps to `EngineError`
//! and surfaces as 502 upstream failure, leaving the persisted snapshot
//! untouched.

use super::{ConvTurn, EngineError, EngineState, ResearchEngine, RuntimeConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct RemoteEngine {
    client: reqwest::blocking::Client,
    base_url: String,
}

#[derive(Serialize)]
struct EngineRequest<'a> {
    config: &'a RuntimeConfig,
    state: &'a EngineState,
}

#[derive(Deserialize)]
struct WarmStartResponse {
    state: EngineState,
}

#[derive(Deserialize)]
struct NextTurnResponse {
    state: EngineState,
    turn: ConvTurn,
}

#[derive(Deserialize)]
struct ReportResponse {
    state: EngineState,
    content: String,
}

impl RemoteEngine {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn post<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        config: &RuntimeConfig,
        state: &EngineState,
    ) -> Result<T, EngineError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .post(&url)
            .json(&EngineRequest { config, state })
            .send()
            .map_err(|e| EngineError::Request(format!("POST {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(EngineError::Request(format!(
                "POST {} returned {}: {}",
                url, status, detail
            )));
        }

        response
            .json::<T>()
            .map_err(|e| EngineError::Malformed(format!("POST {}: {}", url, e)))
    }
}

impl ResearchEngine for RemoteEngine {
    fn warm_start(
        &self,
        config: &RuntimeConfig,
        state: &mut EngineState,
    ) -> Result<(), EngineError> {
        let response: WarmStartResponse = self.post("warm-start", config, state)?;
        *state = response.state;
        Ok(())
    }

    fn next_turn(
        &self,
        config: &RuntimeConfig,
        state: &mut EngineState,
    ) -> Result<ConvTurn, EngineError> {
        let response: NextTurnResponse = self.post("next-turn", config, state)?;
        *state = response.state;
        Ok(response.turn)
    }

    fn generate_report(
        &self,
        config: &RuntimeConfig,
        state: &mut EngineState,
    ) -> Result<String, EngineError> {
        let response: ReportResponse = self.post("report", config, state)?;
        *state = response.state;
        Ok(response.content)
    }
}
