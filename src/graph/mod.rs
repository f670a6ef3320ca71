pub mod builder;
pub mod types;
pub mod weight;

// Re-exports for external use
pub use builder::{BuildHistory, BuildObserver, BuildReport, GraphBuilder, GraphStats, TokenGraph};
pub use types::Edge;
pub use weight::{adjusted_weight, path_adjusted_weight};
