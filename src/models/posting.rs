//! Posting data structures.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role scope of a posting or a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Intern,
    NewGrad,
    /// Either role; resolved to a concrete role before routing.
    Both,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Intern => "intern",
            Role::NewGrad => "new_grad",
            Role::Both => "both",
        }
    }

    /// Parse a role label, defaulting unknown input to `Both`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "intern" | "internship" => Role::Intern,
            "new_grad" | "newgrad" | "new-grad" => Role::NewGrad,
            _ => Role::Both,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category bucket for a posting.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    SoftwareEngineering,
    DataAnalysis,
    DataScienceEngineer,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::SoftwareEngineering => "software_engineering",
            Category::DataAnalysis => "data_analysis",
            Category::DataScienceEngineer => "data_science_engineer",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recency window for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day,
    ThreeDays,
    Week,
    Month,
    ThreeMonths,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::ThreeDays => "three_days",
            Period::Week => "week",
            Period::Month => "month",
            Period::ThreeMonths => "three_months",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw posting as produced by a site-specific scraper.
///
/// Only `title` and `source` are mandatory; scrapers differ widely in
/// what they can extract, so every other field is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPosting {
    /// Posting title
    pub title: String,

    /// Company name
    #[serde(default)]
    pub company: Option<String>,

    /// Location string as scraped
    #[serde(default)]
    pub location: Option<String>,

    /// Link to the posting
    #[serde(default)]
    pub url: Option<String>,

    /// Free-form "posted" timestamp ("2 days ago", "Aug 24", "1d", ...)
    #[serde(default)]
    pub posted_date: Option<String>,

    /// Posting body, when the scraper fetched it
    #[serde(default)]
    pub description: Option<String>,

    /// Scraper identifier (e.g. "linkedin")
    pub source: String,

    /// Role scope reported by the scraper
    #[serde(default)]
    pub role: Option<Role>,

    /// Producer category hint (e.g. a feed tagged "data_analysis")
    #[serde(default)]
    pub category: Option<String>,
}

/// Resolution of a free-form posted-date string.
///
/// `Recent` is the inclusive fallback: a date we could not parse must
/// never cause a posting to be excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedDate {
    /// Concrete resolved timestamp
    Date(DateTime<Utc>),
    /// Unparseable; treated as recent for every period
    Recent,
}

/// A `(role, category)` pair identifying one destination's content stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BucketKey {
    pub role: Role,
    pub category: Category,
}

impl BucketKey {
    pub fn new(role: Role, category: Category) -> Self {
        Self { role, category }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.role, self.category)
    }
}

/// The canonical, deduplicatable representation of a posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Content-addressable id: sha256 of the normalized identity tuple
    pub id: String,

    /// The hash pre-image, kept for debuggability
    pub normalized_id: String,

    /// Trimmed original title (for display)
    pub title: String,

    /// Trimmed original company (empty if missing)
    pub company: String,

    /// Trimmed original location (empty if missing)
    pub location: String,

    /// Lowercased trimmed title (for matching)
    pub normalized_title: String,

    /// Lowercased trimmed company
    pub normalized_company: String,

    /// Lowercased trimmed location
    pub normalized_location: String,

    /// Link to the posting (empty if missing)
    pub url: String,

    /// Raw posted-date string as scraped
    pub posted_date: String,

    /// Resolved posted-date
    pub posted_at: ResolvedDate,

    /// Posting body (empty if missing)
    pub description: String,

    /// Producer category hint, if any
    pub category_hint: Option<String>,

    /// Role scope reported by the scraper, if any
    pub role: Option<Role>,

    /// Category assigned by the classifier
    pub category: Category,

    /// Every scraper that reported this record
    pub sources: BTreeSet<String>,

    /// When this record first entered the pipeline
    pub first_seen: DateTime<Utc>,
}

impl CanonicalRecord {
    /// Short id prefix used in notification summaries.
    pub fn id_prefix(&self) -> &str {
        &self.id[..self.id.len().min(8)]
    }

    /// Format the record for display using a template.
    ///
    /// Supported placeholders:
    /// - `{title}`, `{company}`, `{location}`, `{url}`
    /// - `{date}`, `{sources}`, `{id}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{title}", &self.title)
            .replace("{company}", &self.company)
            .replace("{location}", &self.location)
            .replace("{url}", &self.url)
            .replace("{date}", &self.posted_date)
            .replace(
                "{sources}",
                &self.sources.iter().cloned().collect::<Vec<_>>().join(","),
            )
            .replace("{id}", self.id_prefix())
    }
}
