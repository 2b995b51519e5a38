//! Server application state shared across handlers

use crate::session::StepController;
use std::sync::Arc;

/// Shared state for the server. The controller owns the data directory,
/// the session lock registry, and the engine client.
#[derive(Clone)]
pub struct ServerAppState {
    pub controller: Arc<StepController>,
}

impl ServerAppState {
    pub fn new(controller: StepController) -> Self {
        Self {
            controller: Arc::new(controller),
        }
    }
}
