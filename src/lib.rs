// Clippy allows for reasonable defaults
#![allow(clippy::too_many_arguments)] // Handlers often need many params
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::collapsible_if)] // Separate ifs can be more readable
#![allow(clippy::needless_borrow)] // Explicit borrows can clarify ownership

// Module declarations
pub mod citations;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;

// Server module (HTTP API)
pub mod server;

pub use error::ApiError;
pub use models::*;
