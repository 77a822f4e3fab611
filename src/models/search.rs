//! Search request and response models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Record;
use crate::sources::SourceError;

/// Sort field for arXiv searches (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Relevance,
    LastUpdatedDate,
    SubmittedDate,
}

impl SortBy {
    /// Value of the arXiv `sortBy` parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::LastUpdatedDate => "lastUpdatedDate",
            SortBy::SubmittedDate => "submittedDate",
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relevance" => Ok(SortBy::Relevance),
            "lastUpdatedDate" | "last_updated_date" | "updated" => Ok(SortBy::LastUpdatedDate),
            "submittedDate" | "submitted_date" | "date" => Ok(SortBy::SubmittedDate),
            other => Err(SourceError::InvalidRequest(format!(
                "Unknown sort_by '{}': expected relevance, lastUpdatedDate or submittedDate",
                other
            ))),
        }
    }
}

/// Search query parameters shared by every searchable source.
///
/// Sources ignore the filters they have no notion of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Main search query string
    pub query: String,

    /// Maximum number of results to return
    pub max_results: usize,

    /// Year filter in Semantic Scholar syntax ("2020", "2018-2022", "2010-", "-2015")
    pub year: Option<String>,

    /// Client-side minimum citation count (Semantic Scholar)
    pub min_citations: Option<u64>,

    /// Fields of study filter (Semantic Scholar)
    pub fields_of_study: Vec<String>,

    /// Sort field (arXiv)
    pub sort_by: Option<SortBy>,

    /// Field-specific filters (CrossRef `filter`)
    pub filters: BTreeMap<String, String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_results: 10,
            year: None,
            min_citations: None,
            fields_of_study: Vec::new(),
            sort_by: None,
            filters: BTreeMap::new(),
        }
    }
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn min_citations(mut self, min: u64) -> Self {
        self.min_citations = Some(min);
        self
    }

    pub fn fields_of_study(mut self, fields: Vec<String>) -> Self {
        self.fields_of_study = fields;
        self
    }

    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort_by = Some(sort);
        self
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

/// A page of CrossRef works
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksPage {
    pub total_results: u64,
    pub items: Vec<Record>,
}

/// A page of works published in one journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalWorks {
    pub journal_title: String,
    pub total_results: u64,
    pub items: Vec<Record>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = SearchQuery::new("crispr")
            .max_results(5)
            .year("2020-2024")
            .min_citations(10)
            .filter("type", "journal-article");

        assert_eq!(query.query, "crispr");
        assert_eq!(query.max_results, 5);
        assert_eq!(query.year.as_deref(), Some("2020-2024"));
        assert_eq!(query.min_citations, Some(10));
        assert_eq!(query.filters.get("type").map(String::as_str), Some("journal-article"));
    }

    #[test]
    fn test_sort_by_parse() {
        assert_eq!("relevance".parse::<SortBy>().unwrap(), SortBy::Relevance);
        assert_eq!(
            "lastUpdatedDate".parse::<SortBy>().unwrap().as_param(),
            "lastUpdatedDate"
        );
        assert_eq!(
            "submittedDate".parse::<SortBy>().unwrap(),
            SortBy::SubmittedDate
        );
        assert!("citations".parse::<SortBy>().is_err());
    }
}
