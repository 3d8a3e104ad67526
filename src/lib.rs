pub mod agent;
pub mod backend;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod geo;
pub mod map;
pub mod orchestrator;
pub mod panels;
pub mod tracker;

// Re-export commonly used types
pub use config::Config;
pub use dashboard::{Dashboard, DashboardCommand};
pub use error::{DashboardError, DashboardResult};
pub use orchestrator::SearchOrchestrator;
