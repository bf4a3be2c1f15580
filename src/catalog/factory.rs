//! Catalog request factory
//!
//! Maps `(limit, offset, source_index)` onto the catalog's page-numbered
//! endpoints.

use super::types::{CatalogSource, Film, FilmsPageDto};
use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::Page;
use crate::request::RequestFactory;
use async_trait::async_trait;
use tracing::debug;

/// Request factory backed by the catalog HTTP API.
///
/// Each engine source maps to the catalog source with the same index. The
/// catalog pages by number, so the page requested is `offset / limit`.
#[derive(Debug, Clone)]
pub struct CatalogRequestFactory {
    client: HttpClient,
    sources: Vec<CatalogSource>,
}

impl CatalogRequestFactory {
    /// Create a factory over an existing client
    pub fn new(client: HttpClient, sources: Vec<CatalogSource>) -> Self {
        Self { client, sources }
    }

    /// Build the client and source list from a catalog config
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let client = HttpClient::with_config(config.http_config())?;
        Ok(Self::new(client, config.catalog_sources()))
    }

    /// Configured catalog sources
    pub fn sources(&self) -> &[CatalogSource] {
        &self.sources
    }

    /// Fetch one numbered page of a source
    pub async fn fetch_page(&self, source_index: usize, page: u32) -> Result<Page<Film>> {
        let source = self
            .sources
            .get(source_index)
            .ok_or(Error::SourceOutOfRange {
                index: source_index,
                count: self.sources.len(),
            })?;

        let request = RequestConfig::new()
            .query("page", page.to_string())
            .query("language", &source.language);
        let dto: FilmsPageDto = self
            .client
            .get_json_with_config(&source.path, request)
            .await?;

        debug!(
            source = source_index,
            page = dto.page,
            total_pages = dto.total_pages,
            items = dto.results.len(),
            "catalog page received"
        );
        Ok(dto.into())
    }
}

#[async_trait]
impl RequestFactory<Film> for CatalogRequestFactory {
    async fn create(&self, limit: u32, offset: u64, source_index: usize) -> Result<Page<Film>> {
        if limit == 0 {
            return Err(Error::invalid_value("limit", "page size must be greater than zero"));
        }
        let page = u32::try_from(offset / u64::from(limit))
            .map_err(|_| Error::invalid_value("offset", format!("offset {offset} is out of range")))?;
        self.fetch_page(source_index, page).await
    }
}
