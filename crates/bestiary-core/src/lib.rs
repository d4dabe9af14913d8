pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod report;

pub use config::AppConfig;
pub use error::{BestiaryError, ExitCode, Result};
pub use models::*;
pub use normalize::{normalize_name, sanitize_filename};
pub use report::render_report;
