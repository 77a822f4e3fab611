//! Normalized record shared by every scholarly provider.

use serde::{Deserialize, Serialize};

use crate::utils::author_list;

/// The provider a record was normalized from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceType {
    #[serde(rename = "pubmed")]
    PubMed,
    #[serde(rename = "semantic_scholar")]
    SemanticScholar,
    #[serde(rename = "arxiv")]
    Arxiv,
    #[serde(rename = "crossref")]
    CrossRef,
    #[serde(rename = "reddit")]
    Reddit,
}

impl SourceType {
    /// Returns the display name of the source
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::PubMed => "PubMed",
            SourceType::SemanticScholar => "Semantic Scholar",
            SourceType::Arxiv => "arXiv",
            SourceType::CrossRef => "CrossRef",
            SourceType::Reddit => "Reddit",
        }
    }

    /// Returns the source identifier (used as registry key and fan-out key)
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::PubMed => "pubmed",
            SourceType::SemanticScholar => "semantic_scholar",
            SourceType::Arxiv => "arxiv",
            SourceType::CrossRef => "crossref",
            SourceType::Reddit => "reddit",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// External identifiers attached to a record. Absent ids are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    pub doi: String,
    pub pmid: String,
    pub arxiv: String,
    /// Provider-native id (S2 paperId, arXiv versioned id, PMID, DOI for CrossRef)
    pub native_id: String,
}

/// Citation counts reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationMetrics {
    pub total: u64,
    /// `None` when the provider has no notion of influential citations
    pub influential: Option<u64>,
}

/// A paper or work from any provider, in one provider-agnostic shape.
///
/// Every field is always serialized: missing strings are `""`, missing lists
/// are `[]` and the optional fields are `null`. `authors` keeps the order the
/// provider returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub source: SourceType,
    pub title: String,
    pub authors: Vec<String>,
    /// First three authors joined by ", ", plus " et al." when there are more
    pub author_list: String,
    pub year: String,
    /// Full publication date when the provider has one (ISO-ish, may be partial)
    pub published_date: String,
    /// Venue, journal or container title
    pub venue: String,
    pub r#abstract: String,
    pub identifiers: Identifiers,
    pub url: String,
    pub pdf_url: Option<String>,
    pub has_pdf: bool,
    pub citation_metrics: Option<CitationMetrics>,
    /// Keywords, subjects, categories or fields of study
    pub keywords: Vec<String>,
}

impl Record {
    /// Create an empty record for a source
    pub fn new(source: SourceType) -> Self {
        Self {
            source,
            title: String::new(),
            authors: Vec::new(),
            author_list: String::new(),
            year: String::new(),
            published_date: String::new(),
            venue: String::new(),
            r#abstract: String::new(),
            identifiers: Identifiers::default(),
            url: String::new(),
            pdf_url: None,
            has_pdf: false,
            citation_metrics: None,
            keywords: Vec::new(),
        }
    }
}

/// Builder for constructing Record objects
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    pub fn new(source: SourceType, title: impl Into<String>) -> Self {
        let mut record = Record::new(source);
        record.title = title.into();
        Self { record }
    }

    pub fn authors(mut self, authors: Vec<String>) -> Self {
        self.record.authors = authors;
        self
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.record.year = year.into();
        self
    }

    pub fn published_date(mut self, date: impl Into<String>) -> Self {
        self.record.published_date = date.into();
        self
    }

    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.record.venue = venue.into();
        self
    }

    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.record.r#abstract = abstract_text.into();
        self
    }

    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.record.identifiers.doi = doi.into();
        self
    }

    pub fn pmid(mut self, pmid: impl Into<String>) -> Self {
        self.record.identifiers.pmid = pmid.into();
        self
    }

    pub fn arxiv_id(mut self, arxiv_id: impl Into<String>) -> Self {
        self.record.identifiers.arxiv = arxiv_id.into();
        self
    }

    pub fn native_id(mut self, id: impl Into<String>) -> Self {
        self.record.identifiers.native_id = id.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.record.url = url.into();
        self
    }

    /// Set the PDF URL; empty strings are treated as "no PDF"
    pub fn pdf_url(mut self, url: Option<String>) -> Self {
        self.record.pdf_url = url.filter(|u| !u.is_empty());
        self
    }

    pub fn citation_metrics(mut self, total: u64, influential: Option<u64>) -> Self {
        self.record.citation_metrics = Some(CitationMetrics { total, influential });
        self
    }

    pub fn keywords(mut self, keywords: Vec<String>) -> Self {
        self.record.keywords = keywords;
        self
    }

    /// Build the Record, deriving `author_list` and `has_pdf`
    pub fn build(mut self) -> Record {
        self.record.author_list = author_list(&self.record.authors);
        self.record.has_pdf = self.record.pdf_url.is_some();
        self.record
    }
}
