// Domain types and value objects
mod forecast;
mod metrics;
mod portfolio;
pub mod ticker;

// Re-export commonly used types to the world
pub use forecast::{CandlestickPoint, ForecastEvaluation};
pub use metrics::{ErrorMetrics, ForecasterMetrics, compute_accuracy};
pub use portfolio::{AllocationSlice, PerformancePoint, PortfolioSummary, Position};
pub use ticker::{to_display_form, to_wire_form};
