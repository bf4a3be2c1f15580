//! HTTP client module
//!
//! Transport used by the catalog request factory.
//!
//! # Features
//!
//! - **Base URL joining**: relative paths resolve against a configured base
//! - **Default parameters**: headers and query parameters sent on every call
//! - **Status mapping**: non-2xx responses become `Error::HttpStatus`

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
