//! Configuration module for the dashboard orchestration layer.

// Can all be private now because we have a public re-export.
mod backend;
mod dashboard;
mod debug;

// Re-export commonly used items
pub use backend::{BACKEND, BackendConfig};
pub use dashboard::{DASHBOARD, EngineConfig};
pub use debug::DF;
