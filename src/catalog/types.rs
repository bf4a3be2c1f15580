//! Catalog types
//!
//! Wire DTOs of the page-based movie catalog and the domain model they map to.

use crate::pagination::Page;
use serde::{Deserialize, Serialize};

/// A film as shown to consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Film {
    pub id: u64,
    pub title: String,
    pub overview: String,
    /// Poster path relative to the catalog's image host
    pub image_link: Option<String>,
}

/// A film as returned by the catalog API
#[derive(Debug, Clone, Deserialize)]
pub struct FilmDto {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// One page of catalog results
#[derive(Debug, Clone, Deserialize)]
pub struct FilmsPageDto {
    pub page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub results: Vec<FilmDto>,
}

impl From<FilmDto> for Film {
    fn from(dto: FilmDto) -> Self {
        Self {
            id: dto.id,
            title: dto.title,
            overview: dto.overview,
            image_link: dto.poster_path,
        }
    }
}

impl From<FilmsPageDto> for Page<Film> {
    fn from(dto: FilmsPageDto) -> Self {
        Page::new(
            dto.results.into_iter().map(Film::from).collect(),
            dto.total_pages,
        )
    }
}

/// One catalog endpoint queried in a given language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSource {
    /// Path relative to the catalog base URL (e.g. `3/movie/popular`)
    pub path: String,
    /// Language tag sent with every request to this source
    pub language: String,
}

impl CatalogSource {
    /// Create a new catalog source
    pub fn new(path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
        }
    }
}
