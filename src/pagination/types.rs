//! Pagination types
//!
//! Pages, sources and the state union published by the engine.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One fetched batch of items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in source order
    pub items: Vec<T>,
    /// Total page count reported by the source
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Create a new page
    pub fn new(items: Vec<T>, total_pages: u32) -> Self {
        Self { items, total_pages }
    }

    /// A page with no items from a source with no pages
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_pages: 0,
        }
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the page carries no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One entry of the ordered source chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// First page number requested from this source
    pub initial_page: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl Source {
    /// Create a new source
    pub const fn new(initial_page: u32, page_size: u32) -> Self {
        Self {
            initial_page,
            page_size,
        }
    }

    /// Offset of the first item of `page`
    pub fn offset(&self, page: u32) -> u64 {
        u64::from(page) * u64::from(self.page_size)
    }
}

/// Validate a source chain before handing it to the engine
pub fn validate_sources(sources: &[Source]) -> Result<()> {
    if sources.is_empty() {
        return Err(Error::config("at least one source is required"));
    }
    if let Some(index) = sources.iter().position(|s| s.page_size == 0) {
        return Err(Error::invalid_value(
            format!("sources[{index}].page_size"),
            "page size must be greater than zero",
        ));
    }
    Ok(())
}

/// Discriminant of [`PaginationState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Empty,
    EmptyLoading,
    EmptyData,
    EmptyError,
    Content,
    FullContent,
    Refreshing,
    LoadingPage,
    LoadingPageError,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::EmptyLoading => "empty_loading",
            Self::EmptyData => "empty_data",
            Self::EmptyError => "empty_error",
            Self::Content => "content",
            Self::FullContent => "full_content",
            Self::Refreshing => "refreshing",
            Self::LoadingPage => "loading_page",
            Self::LoadingPageError => "loading_page_error",
        };
        f.write_str(name)
    }
}

/// What a consumer should currently display.
///
/// Every variant carries the accumulated content and the last page the
/// content corresponds to. Content is shared between snapshots and never
/// mutated once published.
#[derive(Debug, Clone)]
pub enum PaginationState<T> {
    /// Nothing requested yet
    Empty { content: Arc<[T]>, page: u32 },
    /// First page of the current source in flight, no content yet
    EmptyLoading { content: Arc<[T]>, page: u32 },
    /// First page of the current source returned nothing
    EmptyData { content: Arc<[T]>, page: u32 },
    /// First page of the current source failed, no content yet
    EmptyError {
        error: Arc<Error>,
        content: Arc<[T]>,
        page: u32,
    },
    /// At least one page loaded, more may exist
    Content {
        content: Arc<[T]>,
        page: u32,
        is_last_page: bool,
    },
    /// Every source exhausted
    FullContent { content: Arc<[T]>, page: u32 },
    /// Reset in progress, previous content discarded
    Refreshing { content: Arc<[T]>, page: u32 },
    /// Next page in flight, content retained
    LoadingPage { content: Arc<[T]>, page: u32 },
    /// A page fetch failed, content retained
    LoadingPageError {
        error: Arc<Error>,
        content: Arc<[T]>,
        page: u32,
    },
}

impl<T> PaginationState<T> {
    /// Initial state for a chain starting at `page`
    pub fn empty(page: u32) -> Self {
        Self::Empty {
            content: Arc::from(Vec::new()),
            page,
        }
    }

    /// Variant of this state
    pub fn kind(&self) -> StateKind {
        match self {
            Self::Empty { .. } => StateKind::Empty,
            Self::EmptyLoading { .. } => StateKind::EmptyLoading,
            Self::EmptyData { .. } => StateKind::EmptyData,
            Self::EmptyError { .. } => StateKind::EmptyError,
            Self::Content { .. } => StateKind::Content,
            Self::FullContent { .. } => StateKind::FullContent,
            Self::Refreshing { .. } => StateKind::Refreshing,
            Self::LoadingPage { .. } => StateKind::LoadingPage,
            Self::LoadingPageError { .. } => StateKind::LoadingPageError,
        }
    }

    /// Accumulated content
    pub fn content(&self) -> &[T] {
        self.shared_content()
    }

    /// Accumulated content as a shared handle
    pub fn shared_content(&self) -> &Arc<[T]> {
        match self {
            Self::Empty { content, .. }
            | Self::EmptyLoading { content, .. }
            | Self::EmptyData { content, .. }
            | Self::EmptyError { content, .. }
            | Self::Content { content, .. }
            | Self::FullContent { content, .. }
            | Self::Refreshing { content, .. }
            | Self::LoadingPage { content, .. }
            | Self::LoadingPageError { content, .. } => content,
        }
    }

    /// Last page the content corresponds to
    pub fn page(&self) -> u32 {
        match self {
            Self::Empty { page, .. }
            | Self::EmptyLoading { page, .. }
            | Self::EmptyData { page, .. }
            | Self::EmptyError { page, .. }
            | Self::Content { page, .. }
            | Self::FullContent { page, .. }
            | Self::Refreshing { page, .. }
            | Self::LoadingPage { page, .. }
            | Self::LoadingPageError { page, .. } => *page,
        }
    }

    /// Error attached to an error state
    pub fn error(&self) -> Option<&Arc<Error>> {
        match self {
            Self::EmptyError { error, .. } | Self::LoadingPageError { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether a fetch is expected to be in flight
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Self::EmptyLoading { .. } | Self::Refreshing { .. } | Self::LoadingPage { .. }
        )
    }

    /// Whether `retry()` is valid in this state
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EmptyError { .. } | Self::LoadingPageError { .. })
    }

    /// Whether no further fetch will be issued until refresh
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FullContent { .. })
    }
}

impl<T> fmt::Display for PaginationState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}(items={}, page={})",
            self.kind(),
            self.content().len(),
            self.page()
        )?;
        if let Self::Content { is_last_page, .. } = self {
            write!(f, " last_page={is_last_page}")?;
        }
        if let Some(error) = self.error() {
            write!(f, " error={error}")?;
        }
        Ok(())
    }
}
