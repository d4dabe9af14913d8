//! Reference-page image resolution, name fallbacks and concurrent fetching.

pub mod cache;
pub mod error;
pub mod fallback;
pub mod http;
pub mod orchestrator;
pub mod page;
pub mod resolver;
pub mod source;
pub mod store;
pub mod table;

#[cfg(test)]
mod fixtures;

pub use cache::PageCache;
pub use error::{Result, ScrapeError};
pub use fallback::FallbackStrategy;
pub use orchestrator::{FetchOrchestrator, ResolutionSummary};
pub use resolver::{FailureReason, Outcome, PageResolver};
pub use source::{PageSource, WikiClient};
pub use store::ImageStore;
pub use table::extract_adjective_index;
