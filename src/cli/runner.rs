//! CLI runner - executes commands

use crate::catalog::{CatalogRequestFactory, Film};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::CatalogConfig;
use crate::engine::PaginationEngine;
use crate::error::{Error, Result};
use crate::pagination::{PaginationState, StateKind};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, warn};

/// Serializable view of one pagination state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    pub state: StateKind,
    pub page: u32,
    pub items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the error looks like a transient transport failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transient: Option<bool>,
}

impl<T> From<&PaginationState<T>> for StateSummary {
    fn from(state: &PaginationState<T>) -> Self {
        let last_page = match state {
            PaginationState::Content { is_last_page, .. } => Some(*is_last_page),
            _ => None,
        };
        Self {
            state: state.kind(),
            page: state.page(),
            items: state.content().len(),
            last_page,
            error: state.error().map(ToString::to_string),
            transient: state.error().map(|e| e.is_retryable()),
        }
    }
}

/// Limits for a browse session
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowseOptions {
    /// Stop once this many items are loaded
    pub max_items: Option<usize>,
    /// Retries allowed for failed page loads
    pub retries: usize,
}

/// Scroll an engine to the end of its source chain.
///
/// Starts the engine, reports reaching the last item of every `Content`, and
/// retries error states while the retry budget lasts. Every observed
/// transition is handed to `emit`. Returns the final state.
pub async fn browse<T, F>(
    engine: &PaginationEngine<T>,
    options: BrowseOptions,
    mut emit: F,
) -> Result<PaginationState<T>>
where
    T: Clone + Send + Sync + 'static,
    F: FnMut(&PaginationState<T>),
{
    let mut rx = engine.transitions();
    let last_source = engine.sources().len() - 1;
    let mut retries_left = options.retries;
    engine.start(None);

    loop {
        let state = match rx.recv().await {
            Ok(state) => state,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "browse fell behind, transitions skipped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        emit(&state);

        match &state {
            PaginationState::Content { content, .. } => {
                if options.max_items.is_some_and(|max| content.len() >= max) {
                    info!(items = content.len(), "item limit reached");
                    break;
                }
                engine.on_item_reached(content.len().saturating_sub(1));
            }
            PaginationState::FullContent { .. } => break,
            PaginationState::EmptyData { .. } => {
                let current = engine.current();
                if engine.source_index() == last_source && current.kind() == StateKind::EmptyData
                {
                    // Print whatever the final fold published after this one
                    loop {
                        match rx.try_recv() {
                            Ok(state) => emit(&state),
                            Err(TryRecvError::Lagged(_)) => {}
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
            PaginationState::EmptyError { error, .. }
            | PaginationState::LoadingPageError { error, .. } => {
                if retries_left == 0 || !engine.current().is_retryable() {
                    // LoadingPageError reports the last page loaded, not the failed one
                    let failed_page = match &state {
                        PaginationState::LoadingPageError { page, .. } => page.saturating_add(1),
                        _ => state.page(),
                    };
                    engine.clear();
                    return Err(Error::fetch(format!("page {failed_page} failed: {error}")));
                }
                retries_left -= 1;
                debug!(retries_left, "retrying failed page");
                engine.retry();
            }
            PaginationState::Empty { .. }
            | PaginationState::EmptyLoading { .. }
            | PaginationState::Refreshing { .. }
            | PaginationState::LoadingPage { .. } => {}
        }
    }

    let last = engine.current();
    engine.clear();
    Ok(last)
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Validate => self.validate(),
            Commands::Sources => self.sources(),
            Commands::Browse {
                max_items,
                retries,
                prefetch_distance,
            } => {
                let options = BrowseOptions {
                    max_items: *max_items,
                    retries: *retries,
                };
                self.browse(options, *prefetch_distance).await
            }
        }
    }

    /// Load the catalog config, applying command-line overrides
    fn load_config(&self) -> Result<CatalogConfig> {
        let mut config = match &self.cli.config {
            Some(path) => CatalogConfig::from_file(path)?,
            None => CatalogConfig::tmdb()?,
        };
        if let Some(key) = &self.cli.api_key {
            config.api_key = Some(key.clone());
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Catalog at {} is valid with {} sources",
                    config.base_url,
                    config.sources.len()
                )
            }
        }));

        Ok(())
    }

    /// List configured sources
    fn sources(&self) -> Result<()> {
        let config = self.load_config()?;

        let sources: Vec<Value> = config
            .sources
            .iter()
            .enumerate()
            .map(|(index, source)| {
                json!({
                    "index": index,
                    "name": source.display_name(),
                    "path": source.path,
                    "language": source.language,
                    "initial_page": source.initial_page,
                    "page_size": source.page_size
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "SOURCES",
            "base_url": config.base_url,
            "sources": sources
        }));

        Ok(())
    }

    /// Browse the catalog to the end of the source chain
    async fn browse(&self, options: BrowseOptions, prefetch_distance: Option<usize>) -> Result<()> {
        let start = Instant::now();
        let mut config = self.load_config()?;
        if prefetch_distance.is_some() {
            config.prefetch_distance = prefetch_distance;
        }

        let factory = Arc::new(CatalogRequestFactory::from_config(&config)?);
        let engine: PaginationEngine<Film> =
            PaginationEngine::with_config(config.engine_sources(), factory, config.engine_config())?;

        let mut shown = 0;
        let last = browse(&engine, options, |state| {
            self.output_state(state, shown);
            shown = shown.max(state.content().len());
        })
        .await?;

        let stats = engine.stats();
        self.output_message(&json!({
            "type": "SUMMARY",
            "state": last.kind(),
            "items": last.content().len(),
            "requests": stats.requests_issued,
            "pages": stats.pages_loaded,
            "failures": stats.failures,
            "checkouts": stats.checkouts,
            "duration_ms": start.elapsed().as_millis()
        }));

        Ok(())
    }

    /// Output one transition; pretty output also lists films not shown yet
    fn output_state(&self, state: &PaginationState<Film>, shown: usize) {
        match self.cli.format {
            OutputFormat::Json => {
                let summary = StateSummary::from(state);
                self.output_message(&json!({ "type": "STATE", "state": summary }));
            }
            OutputFormat::Pretty => {
                println!("{state}");
                for film in state.content().iter().skip(shown) {
                    println!("  {:>8}  {}", film.id, film.title);
                }
            }
        }
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
