pub mod browser;
pub mod cli;
pub mod config;
pub mod exporter;
pub mod fetcher;
pub mod harvester;
pub mod models;
pub mod navigation;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use harvester::Harvester;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
