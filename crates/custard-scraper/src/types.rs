use chrono::NaiveDate;
use custard_core::FlavorRecord;

/// Loosely-typed fields as an extractor found them, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFlavor {
    pub location: String,
    pub flavor: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub url: Option<String>,
}

/// The outcome of one extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(Vec<FlavorRecord>),
    /// The page was understood but today's flavor is not published.
    NotFound,
    /// The page did not have the expected shape.
    StructuralMismatch(String),
}

impl Extraction {
    /// `Found` with at least one record.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        matches!(self, Extraction::Found(records) if !records.is_empty())
    }

    #[must_use]
    pub fn into_records(self) -> Vec<FlavorRecord> {
        match self {
            Extraction::Found(records) => records,
            Extraction::NotFound | Extraction::StructuralMismatch(_) => Vec::new(),
        }
    }

    /// `Found` when `records` is non-empty, otherwise `NotFound`.
    #[must_use]
    pub fn from_records(records: Vec<FlavorRecord>) -> Self {
        if records.is_empty() {
            Extraction::NotFound
        } else {
            Extraction::Found(records)
        }
    }
}

/// Fallback strategies an extractor can try, in the order it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// A JSON document embedded in the page or served by an API.
    StructuredData,
    /// Known container classes or heading elements.
    DomHeading,
    /// Regex over heading or body text.
    TextPattern,
    /// Broad scan of loosely-matching elements.
    RawScan,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::StructuredData => write!(f, "structured_data"),
            Strategy::DomHeading => write!(f, "dom_heading"),
            Strategy::TextPattern => write!(f, "text_pattern"),
            Strategy::RawScan => write!(f, "raw_scan"),
        }
    }
}
