// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! # pagechain
//!
//! A cancellable pagination engine that chains several paged sources into one
//! continuously growing list.
//!
//! ## Features
//!
//! - **Multiple sources**: an exhausted source hands over to the next one
//! - **Single in-flight fetch**: a newer request always supersedes an older one
//! - **Observable state**: every transition is published, the latest is replayable
//! - **Retryable errors**: failed loads keep prior content and can be retried
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagechain::engine::PaginationEngine;
//! use pagechain::pagination::{Page, Source};
//! use pagechain::request::request_fn;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> pagechain::Result<()> {
//!     let factory = request_fn(|limit, offset, _source| async move {
//!         let items: Vec<u64> = (offset..offset + u64::from(limit)).collect();
//!         Ok(Page::new(items, 3))
//!     });
//!     let engine = PaginationEngine::new(vec![Source::new(1, 20)], Arc::new(factory))?;
//!
//!     let mut states = engine.transitions();
//!     engine.start(None);
//!     while let Ok(state) = states.recv().await {
//!         println!("{state}");
//!         engine.on_item_reached(state.content().len().saturating_sub(1));
//!         if state.is_terminal() {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       PaginationEngine                          │
//! │  start()   on_item_reached()   refresh()   retry()   clear()    │
//! │  state() → watch      transitions() → broadcast                 │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────┬──────────────────────────┐
//! │  Pagination  │    RequestFactory     │         Catalog          │
//! ├──────────────┼───────────────────────┼──────────────────────────┤
//! │ Page         │ create(limit, offset, │ CatalogRequestFactory    │
//! │ Source       │        source_index)  │ HttpClient (reqwest)     │
//! │ States       │ Scripted (tests)      │ CatalogConfig (YAML)     │
//! └──────────────┴───────────────────────┴──────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Pages, sources and pagination states
pub mod pagination;

/// Request factory seam
pub mod request;

/// Pagination engine
pub mod engine;

/// HTTP client
pub mod http;

/// Movie catalog request factory
pub mod catalog;

/// Catalog session configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

// Re-export commonly used types
pub use engine::{EngineConfig, PaginationEngine};
pub use pagination::{Page, PaginationState, Source, StateKind};
pub use request::{request_fn, RequestFactory};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
