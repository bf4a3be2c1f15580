//! Request factory module
//!
//! The engine's only effectful boundary: "fetch one page".
//!
//! # Overview
//!
//! - `RequestFactory` - the capability the engine consumes
//! - `request_fn` - adapts an async closure into a factory
//! - `ScriptedRequestFactory` - scripted test double

mod scripted;

pub use scripted::{RecordedRequest, ScriptedRequestFactory};

use crate::error::Result;
use crate::pagination::Page;
use async_trait::async_trait;
use std::future::Future;

/// Fetches one page of a source.
///
/// Implementations must tolerate being dropped mid-call: the engine aborts
/// the task awaiting a superseded request.
#[async_trait]
pub trait RequestFactory<T>: Send + Sync {
    /// Fetch `limit` items starting at `offset` from the source at `source_index`
    async fn create(&self, limit: u32, offset: u64, source_index: usize) -> Result<Page<T>>;
}

/// Request factory backed by a closure
pub struct FnRequestFactory<F> {
    f: F,
}

/// Wrap an async closure as a [`RequestFactory`]
///
/// ```ignore
/// let factory = request_fn(|limit, offset, _source| async move {
///     let items = (offset..offset + u64::from(limit)).collect();
///     Ok(Page::new(items, 10))
/// });
/// ```
pub fn request_fn<F, Fut, T>(f: F) -> FnRequestFactory<F>
where
    F: Fn(u32, u64, usize) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Page<T>>> + Send + 'static,
{
    FnRequestFactory { f }
}

#[async_trait]
impl<F, Fut, T> RequestFactory<T> for FnRequestFactory<F>
where
    F: Fn(u32, u64, usize) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Page<T>>> + Send + 'static,
    T: Send + 'static,
{
    async fn create(&self, limit: u32, offset: u64, source_index: usize) -> Result<Page<T>> {
        (self.f)(limit, offset, source_index).await
    }
}

impl<F> std::fmt::Debug for FnRequestFactory<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnRequestFactory").finish_non_exhaustive()
    }
}
