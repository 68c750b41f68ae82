mod core;
mod messages;
mod state;
mod worker;

pub use self::core::DashboardEngine;
pub use state::{AppState, Resource, ResourceState, ResourceStates};
