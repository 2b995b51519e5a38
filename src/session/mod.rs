//! Session lifecycle: the per-session lock registry and the step controller

pub mod registry;
pub mod step;

pub use registry::SessionRegistry;
pub use step::{CreatedSession, FinalizedReport, StepController, StepOutcome};
