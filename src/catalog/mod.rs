//! Catalog module
//!
//! A [`RequestFactory`](crate::request::RequestFactory) for page-based REST
//! movie catalogs.
//!
//! # Overview
//!
//! - `Film` - domain model, mapped from `FilmDto`
//! - `CatalogSource` - endpoint path + language of one engine source
//! - `CatalogRequestFactory` - issues `GET {path}?page=&language=` calls
//!
//! The language is configured per source and sent explicitly with every
//! request; there is no shared session language.

mod factory;
mod types;

pub use factory::CatalogRequestFactory;
pub use types::{CatalogSource, Film, FilmDto, FilmsPageDto};

#[cfg(test)]
mod tests;
