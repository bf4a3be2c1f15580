//! Pagination engine module
//!
//! Orchestrates paged fetches across an ordered chain of sources and
//! publishes every resulting [`PaginationState`].
//!
//! # Overview
//!
//! - At most one fetch is in flight. Issuing a new one aborts the previous
//!   task and bumps a generation counter, so a late result is never folded.
//! - Folds run under a single mutex and never across an await.
//! - The active source index, the cleared flag and the counters are mirrored
//!   into atomics, so accessors never wait on the fold lock.
//! - States are published to a `watch` channel (latest value) and a
//!   `broadcast` channel (every transition, in order).

mod types;

pub use types::{EngineConfig, EngineStats};

use types::StatsCounters;

use crate::error::{Error, Result};
use crate::pagination::{validate_sources, Page, PaginationState, Source};
use crate::request::RequestFactory;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Multi-source pagination engine.
///
/// Fetch tasks run on the tokio runtime that was current when the engine was
/// built. Dropping the engine has the same effect as [`clear`](Self::clear).
pub struct PaginationEngine<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    sources: Vec<Source>,
    factory: Arc<dyn RequestFactory<T>>,
    config: EngineConfig,
    runtime: Handle,
    core: Mutex<Core<T>>,
    // Written under `core`, read without it
    source_index: AtomicUsize,
    cleared: AtomicBool,
    stats: StatsCounters,
    state_tx: watch::Sender<PaginationState<T>>,
    transitions_tx: broadcast::Sender<PaginationState<T>>,
}

struct Core<T> {
    state: PaginationState<T>,
    source_index: usize,
    /// Page the next fetch of the current source asks for
    next_page: u32,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    cleared: bool,
}

#[derive(Debug, Clone, Copy)]
struct PageRequest {
    generation: u64,
    source_index: usize,
    page: u32,
}

enum Prefetch<T> {
    NextPage { content: Arc<[T]>, page: u32 },
    Checkout,
}

impl<T> PaginationEngine<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an engine with the default configuration
    pub fn new(sources: Vec<Source>, factory: Arc<dyn RequestFactory<T>>) -> Result<Self> {
        Self::with_config(sources, factory, EngineConfig::default())
    }

    /// Create an engine with a custom configuration
    pub fn with_config(
        sources: Vec<Source>,
        factory: Arc<dyn RequestFactory<T>>,
        config: EngineConfig,
    ) -> Result<Self> {
        validate_sources(&sources)?;
        let runtime = Handle::try_current()
            .map_err(|e| Error::config(format!("pagination engine needs a tokio runtime: {e}")))?;

        let initial = PaginationState::empty(sources[0].initial_page);
        let (state_tx, _) = watch::channel(initial.clone());
        let (transitions_tx, _) = broadcast::channel(config.history_capacity.max(1));

        let core = Core {
            state: initial,
            source_index: 0,
            next_page: sources[0].initial_page,
            generation: 0,
            in_flight: None,
            cleared: false,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                sources,
                factory,
                config,
                runtime,
                core: Mutex::new(core),
                source_index: AtomicUsize::new(0),
                cleared: AtomicBool::new(false),
                stats: StatsCounters::default(),
                state_tx,
                transitions_tx,
            }),
        })
    }

    /// Begin the session.
    ///
    /// With `initial`, the page is folded as if it were the first source's
    /// first response and no request is made for it.
    pub fn start(&self, initial: Option<Page<T>>) {
        let mut core = self.inner.lock();
        if core.cleared {
            return;
        }

        let source = self.inner.sources[0];
        self.inner.set_source_index(&mut core, 0);
        core.next_page = source.initial_page;

        match initial {
            None => {
                let content = Arc::clone(core.state.shared_content());
                self.inner.publish(
                    &mut core,
                    PaginationState::EmptyLoading {
                        content,
                        page: source.initial_page,
                    },
                );
                self.inner.load_page(&mut core);
            }
            Some(page) => {
                debug!(items = page.len(), "starting from a precomputed page");
                self.inner.fold_page(&mut core, source.initial_page, page);
            }
        }
    }

    /// Report that the consumer is rendering item `position`
    pub fn on_item_reached(&self, position: usize) {
        let mut core = self.inner.lock();
        if core.cleared {
            return;
        }

        let has_next_source = core.source_index + 1 < self.inner.sources.len();
        let threshold = self
            .inner
            .config
            .prefetch_threshold(&self.inner.sources[core.source_index]);

        let action = match &core.state {
            PaginationState::Content {
                content,
                page,
                is_last_page,
            } => {
                if content.len().saturating_sub(position) >= threshold {
                    return;
                }
                if *is_last_page {
                    Prefetch::Checkout
                } else {
                    Prefetch::NextPage {
                        content: Arc::clone(content),
                        page: *page,
                    }
                }
            }
            PaginationState::EmptyData { .. } if has_next_source => Prefetch::Checkout,
            _ => return,
        };

        match action {
            Prefetch::NextPage { content, page } => {
                self.inner
                    .publish(&mut core, PaginationState::LoadingPage { content, page });
                self.inner.load_page(&mut core);
            }
            Prefetch::Checkout => self.inner.checkout(&mut core),
        }
    }

    /// Drop all content and reload from the first source
    pub fn refresh(&self) {
        let mut core = self.inner.lock();
        if core.cleared {
            return;
        }

        let source = self.inner.sources[0];
        self.inner.set_source_index(&mut core, 0);
        core.next_page = source.initial_page;
        info!("refreshing pagination");
        self.inner.publish(
            &mut core,
            PaginationState::Refreshing {
                content: Arc::from(Vec::new()),
                page: source.initial_page,
            },
        );
        self.inner.load_page(&mut core);
    }

    /// Re-issue the fetch that failed.
    ///
    /// # Panics
    ///
    /// Panics unless the current state is `EmptyError` or `LoadingPageError`.
    pub fn retry(&self) {
        let mut core = self.inner.lock();
        if core.cleared {
            return;
        }

        let next = match &core.state {
            PaginationState::EmptyError { content, .. } => Ok(PaginationState::EmptyLoading {
                content: Arc::clone(content),
                page: self.inner.sources[core.source_index].initial_page,
            }),
            PaginationState::LoadingPageError { content, page, .. } => {
                Ok(PaginationState::LoadingPage {
                    content: Arc::clone(content),
                    page: *page,
                })
            }
            other => Err(other.kind()),
        };
        let next = match next {
            Ok(state) => state,
            Err(kind) => {
                drop(core);
                panic!("retry() called in non-retryable state `{kind}`");
            }
        };

        debug!(page = core.next_page, "retrying failed page");
        self.inner.publish(&mut core, next);
        self.inner.load_page(&mut core);
    }

    /// Cancel the in-flight fetch and stop publishing transitions
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Receiver that always holds the latest state
    pub fn state(&self) -> watch::Receiver<PaginationState<T>> {
        self.inner.state_tx.subscribe()
    }

    /// Snapshot of the latest state
    pub fn current(&self) -> PaginationState<T> {
        self.inner.state_tx.borrow().clone()
    }

    /// Receiver of every transition published from now on
    pub fn transitions(&self) -> broadcast::Receiver<PaginationState<T>> {
        self.inner.transitions_tx.subscribe()
    }

    /// Stream of the latest state followed by each change.
    ///
    /// Intermediate states may be coalesced; use [`transitions`](Self::transitions)
    /// to observe all of them. Ends when the engine is dropped.
    pub fn states(&self) -> BoxStream<'static, PaginationState<T>> {
        stream::unfold((self.state(), true), |(mut rx, first)| async move {
            if !first {
                rx.changed().await.ok()?;
            }
            let state = rx.borrow_and_update().clone();
            Some((state, (rx, false)))
        })
        .boxed()
    }

    /// Index of the active source
    pub fn source_index(&self) -> usize {
        self.inner.source_index.load(Ordering::Acquire)
    }

    /// The configured source chain
    pub fn sources(&self) -> &[Source] {
        &self.inner.sources
    }

    /// Engine counters
    pub fn stats(&self) -> EngineStats {
        self.inner.stats.snapshot()
    }

    /// Whether `clear` has run
    pub fn is_cleared(&self) -> bool {
        self.inner.cleared.load(Ordering::Acquire)
    }
}

impl<T> Drop for PaginationEngine<T> {
    fn drop(&mut self) {
        self.inner.clear();
    }
}

impl<T> std::fmt::Debug for PaginationEngine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationEngine")
            .field("sources", &self.inner.sources)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, Core<T>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn clear(&self) {
        let mut core = self.lock();
        if core.cleared {
            return;
        }
        core.cleared = true;
        self.cleared.store(true, Ordering::Release);
        core.generation += 1;
        if let Some(handle) = core.in_flight.take() {
            handle.abort();
        }
        debug!("pagination cleared");
    }

    fn set_source_index(&self, core: &mut Core<T>, index: usize) {
        core.source_index = index;
        self.source_index.store(index, Ordering::Release);
    }
}

impl<T> Inner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn publish(&self, core: &mut Core<T>, state: PaginationState<T>) {
        debug!(source = core.source_index, state = %state, "pagination transition");
        core.state = state.clone();
        // No subscribers is fine; the watch channel still holds the value.
        let _ = self.transitions_tx.send(state.clone());
        self.state_tx.send_replace(state);
    }

    /// Issue a fetch for `core.next_page` of the active source
    fn load_page(self: &Arc<Self>, core: &mut Core<T>) {
        if core.state.is_terminal() {
            return;
        }
        if let Some(handle) = core.in_flight.take() {
            handle.abort();
        }

        core.generation += 1;
        StatsCounters::bump(&self.stats.requests_issued);
        let source = self.sources[core.source_index];
        let request = PageRequest {
            generation: core.generation,
            source_index: core.source_index,
            page: core.next_page,
        };
        let offset = source.offset(request.page);
        debug!(
            source = request.source_index,
            page = request.page,
            offset,
            limit = source.page_size,
            "fetching page"
        );

        let factory = Arc::clone(&self.factory);
        let engine: Weak<Self> = Arc::downgrade(self);
        core.in_flight = Some(self.runtime.spawn(async move {
            let outcome = factory
                .create(source.page_size, offset, request.source_index)
                .await;
            if let Some(engine) = engine.upgrade() {
                engine.complete(request, outcome);
            }
        }));
    }

    fn complete(self: &Arc<Self>, request: PageRequest, outcome: Result<Page<T>>) {
        let mut core = self.lock();
        if core.cleared || core.generation != request.generation {
            StatsCounters::bump(&self.stats.stale_results);
            trace!(
                source = request.source_index,
                page = request.page,
                "discarding superseded page result"
            );
            return;
        }
        core.in_flight = None;

        match outcome {
            Ok(page) => self.fold_page(&mut core, request.page, page),
            Err(error) => self.fold_error(&mut core, request.page, error),
        }
    }

    fn fold_page(self: &Arc<Self>, core: &mut Core<T>, requested: u32, page: Page<T>) {
        let source = self.sources[core.source_index];
        let is_last_source = core.source_index + 1 == self.sources.len();
        let prior = Arc::clone(core.state.shared_content());

        // An empty first page exhausts the source; it may report zero pages.
        if page.is_empty() && requested == source.initial_page {
            if is_last_source && !prior.is_empty() {
                self.publish(
                    core,
                    PaginationState::FullContent {
                        content: prior,
                        page: requested,
                    },
                );
            } else {
                self.publish(
                    core,
                    PaginationState::EmptyData {
                        content: prior,
                        page: requested,
                    },
                );
                if !is_last_source {
                    self.checkout(core);
                }
            }
            return;
        }

        if page.total_pages < requested {
            let error = Error::TotalPagesMismatch {
                requested,
                total_pages: page.total_pages,
            };
            self.fold_error(core, requested, error);
            return;
        }

        let is_last_page = page.total_pages == requested;
        let content: Arc<[T]> = prior.iter().cloned().chain(page.items).collect();
        core.next_page = requested.saturating_add(1);
        StatsCounters::bump(&self.stats.pages_loaded);

        let state = if is_last_page && is_last_source {
            info!(items = content.len(), "all sources exhausted");
            PaginationState::FullContent {
                content,
                page: requested,
            }
        } else {
            PaginationState::Content {
                content,
                page: requested,
                is_last_page,
            }
        };
        self.publish(core, state);
    }

    fn fold_error(&self, core: &mut Core<T>, requested: u32, error: Error) {
        warn!(
            source = core.source_index,
            page = requested,
            error = %error,
            "page fetch failed"
        );
        StatsCounters::bump(&self.stats.failures);
        core.next_page = requested;

        let content = Arc::clone(core.state.shared_content());
        let error = Arc::new(error);
        let state = if content.is_empty() {
            PaginationState::EmptyError {
                error,
                content,
                page: self.sources[core.source_index].initial_page,
            }
        } else {
            PaginationState::LoadingPageError {
                error,
                content,
                page: requested.saturating_sub(1),
            }
        };
        self.publish(core, state);
    }

    /// Move to the next source and fetch its first page
    fn checkout(self: &Arc<Self>, core: &mut Core<T>) {
        assert!(
            core.source_index + 1 < self.sources.len(),
            "cannot check out past the last source (index {}, {} sources)",
            core.source_index,
            self.sources.len()
        );

        let next = core.source_index + 1;
        self.set_source_index(core, next);
        StatsCounters::bump(&self.stats.checkouts);
        let source = self.sources[core.source_index];
        core.next_page = source.initial_page;
        info!(source = core.source_index, "checking out next source");

        let content = Arc::clone(core.state.shared_content());
        let state = if content.is_empty() {
            PaginationState::EmptyLoading {
                content,
                page: source.initial_page,
            }
        } else {
            PaginationState::LoadingPage {
                content,
                page: core.state.page(),
            }
        };
        self.publish(core, state);
        self.load_page(core);
    }
}
