use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One shop location's flavor for a day.
///
/// Serializes with exactly the field names `location`, `flavor`,
/// `description`, `date` (`YYYY-MM-DD` or `null`) and `url` (string or
/// `null`). `flavor` and `description` are never null; a missing value is
/// the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorRecord {
    location: String,
    flavor: String,
    #[serde(default)]
    description: String,
    date: Option<NaiveDate>,
    url: Option<String>,
}

impl FlavorRecord {
    #[must_use]
    pub fn new(
        location: String,
        flavor: String,
        description: String,
        date: Option<NaiveDate>,
        url: Option<String>,
    ) -> Self {
        Self {
            location,
            flavor,
            description,
            date,
            url,
        }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub fn flavor(&self) -> &str {
        &self.flavor
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
