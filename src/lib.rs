pub mod config;
pub mod dataset;
pub mod error;
pub mod output;
pub mod plan;
pub mod runner;

pub use config::Config;
pub use dataset::{load_dataset, parse_dataset};
pub use error::{AppError, AppResult};
pub use output::{write_results, ResultFormat};
pub use plan::QueryPlan;
pub use runner::{execute, run, RunOptions, RunSummary};

// Re-export the engine
pub use tripleflow_core;
