//! Scripted request factory
//!
//! Replays canned outcomes per `(source_index, page)` and records every call.
//! Used by the engine tests and handy for downstream consumers that want to
//! drive an engine without a network.

use super::RequestFactory;
use crate::error::{Error, Result};
use crate::pagination::Page;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One call observed by [`ScriptedRequestFactory`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedRequest {
    pub limit: u32,
    pub offset: u64,
    pub source_index: usize,
    /// `offset / limit`
    pub page: u32,
}

#[derive(Debug)]
struct Scripted<T> {
    outcome: std::result::Result<Page<T>, String>,
    delay: Duration,
}

#[derive(Debug)]
struct Script<T> {
    responses: HashMap<(usize, u32), VecDeque<Scripted<T>>>,
    calls: Vec<RecordedRequest>,
}

/// Request factory answering from a script.
///
/// Each `(source, page)` key holds a queue of outcomes consumed in order; the
/// last outcome of a queue is replayed once the rest are used up. A request
/// with nothing scripted fails with a fetch error.
#[derive(Debug)]
pub struct ScriptedRequestFactory<T> {
    script: Mutex<Script<T>>,
}

impl<T> Default for ScriptedRequestFactory<T> {
    fn default() -> Self {
        Self {
            script: Mutex::new(Script {
                responses: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }
}

impl<T: Clone> ScriptedRequestFactory<T> {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `page` of `source_index` with `items`
    #[must_use]
    pub fn page(self, source_index: usize, page: u32, items: Vec<T>, total_pages: u32) -> Self {
        self.push(source_index, page, Ok(Page::new(items, total_pages)), Duration::ZERO)
    }

    /// Answer `page` of `source_index` with `items` after `delay`
    #[must_use]
    pub fn delayed_page(
        self,
        source_index: usize,
        page: u32,
        items: Vec<T>,
        total_pages: u32,
        delay: Duration,
    ) -> Self {
        self.push(source_index, page, Ok(Page::new(items, total_pages)), delay)
    }

    /// Fail `page` of `source_index` with a fetch error
    #[must_use]
    pub fn failure(self, source_index: usize, page: u32, message: impl Into<String>) -> Self {
        self.push(source_index, page, Err(message.into()), Duration::ZERO)
    }

    /// Fail `page` of `source_index` after `delay`
    #[must_use]
    pub fn delayed_failure(
        self,
        source_index: usize,
        page: u32,
        message: impl Into<String>,
        delay: Duration,
    ) -> Self {
        self.push(source_index, page, Err(message.into()), delay)
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<RecordedRequest> {
        self.lock().calls.clone()
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn push(
        self,
        source_index: usize,
        page: u32,
        outcome: std::result::Result<Page<T>, String>,
        delay: Duration,
    ) -> Self {
        self.lock()
            .responses
            .entry((source_index, page))
            .or_default()
            .push_back(Scripted { outcome, delay });
        self
    }

    fn lock(&self) -> MutexGuard<'_, Script<T>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_outcome(&self, request: RecordedRequest) -> Option<Scripted<T>> {
        let mut script = self.lock();
        script.calls.push(request);
        let queue = script
            .responses
            .get_mut(&(request.source_index, request.page))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().map(|s| Scripted {
                outcome: s.outcome.clone(),
                delay: s.delay,
            })
        }
    }
}

#[async_trait]
impl<T> RequestFactory<T> for ScriptedRequestFactory<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn create(&self, limit: u32, offset: u64, source_index: usize) -> Result<Page<T>> {
        let page = if limit == 0 {
            0
        } else {
            (offset / u64::from(limit)) as u32
        };
        let request = RecordedRequest {
            limit,
            offset,
            source_index,
            page,
        };

        let Some(scripted) = self.next_outcome(request) else {
            return Err(Error::fetch(format!(
                "no scripted response for source {source_index} page {page}"
            )));
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.outcome.map_err(Error::fetch)
    }
}
