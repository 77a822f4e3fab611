//! # Research Hub
//!
//! MCP tools over PubMed, Semantic Scholar, arXiv, CrossRef and Reddit, with
//! every provider's response normalized into a common [`Record`].
//!
//! ## Architecture
//!
//! - [`models`]: normalized records, search parameters, identifier classification
//! - [`sources`]: one adapter per provider behind the [`Source`] trait
//! - [`aggregate`]: cross-provider identifier resolution and multi-database search
//! - [`hub`]: wiring of every adapter from a [`config::Config`]
//! - [`mcp`]: tool registry and the MCP server
//! - [`utils`]: HTTP client, rate limiter, XML tree, text helpers
//! - [`config`]: configuration management

pub mod aggregate;
pub mod config;
pub mod hub;
pub mod mcp;
pub mod models;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use hub::ResearchHub;
pub use models::{classify, IdType, Record};
pub use sources::{Source, SourceError, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
