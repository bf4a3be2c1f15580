//! Pagination module
//!
//! Value types shared by the engine and its collaborators.
//!
//! # Overview
//!
//! - `Page` - one fetched batch plus the source's total page count
//! - `Source` - one entry of the ordered source chain
//! - `PaginationState` - what a consumer should currently display

mod types;

pub use types::{validate_sources, Page, PaginationState, Source, StateKind};
