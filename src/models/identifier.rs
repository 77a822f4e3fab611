//! Heuristic classification of free-form paper identifiers.
//!
//! The classifier is best-effort and never validates: a string is routed to
//! the provider it most likely belongs to and any mistake surfaces later as a
//! "not found" from that provider.

use serde::{Deserialize, Serialize};

use crate::sources::SourceError;

/// The kind of identifier a string was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    #[serde(rename = "doi")]
    Doi,
    #[serde(rename = "pmid")]
    Pmid,
    #[serde(rename = "arxiv")]
    Arxiv,
    /// Opaque provider id, resolved as a Semantic Scholar paper id
    #[serde(rename = "provider-native")]
    ProviderNative,
}

impl IdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Doi => "doi",
            IdType::Pmid => "pmid",
            IdType::Arxiv => "arxiv",
            IdType::ProviderNative => "provider-native",
        }
    }
}

impl std::fmt::Display for IdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IdType {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "doi" => Ok(IdType::Doi),
            "pmid" | "pubmed" => Ok(IdType::Pmid),
            "arxiv" => Ok(IdType::Arxiv),
            "provider-native" | "provider_native" | "s2" | "semantic_scholar" => {
                Ok(IdType::ProviderNative)
            }
            other => Err(SourceError::InvalidRequest(format!(
                "Unknown identifier type: {}",
                other
            ))),
        }
    }
}

/// Classify an identifier. First match wins:
///
/// 1. `doi`: starts with `10.` and contains `/`
/// 2. `pmid`: only ASCII digits, at least 7 of them
/// 3. `arxiv`: contains `.` and at least one digit
/// 4. `provider-native`: anything else
pub fn classify(identifier: &str) -> IdType {
    if identifier.starts_with("10.") && identifier.contains('/') {
        IdType::Doi
    } else if identifier.len() >= 7 && identifier.bytes().all(|b| b.is_ascii_digit()) {
        IdType::Pmid
    } else if identifier.contains('.') && identifier.bytes().any(|b| b.is_ascii_digit()) {
        IdType::Arxiv
    } else {
        IdType::ProviderNative
    }
}
