//! Application configuration structures.
//!
//! Configuration is data, not behavior: every rule list the pipeline
//! evaluates (excluded terms, role markers, category keywords, the
//! aggregator blacklist) lives here and ships with working defaults.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Category;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relevance rule lists
    #[serde(default)]
    pub rules: RulesConfig,

    /// Category keyword lists and hint aliases
    #[serde(default)]
    pub classify: ClassifyConfig,

    /// Batching, pacing and destination settings
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Seen-cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.rules.required_terms.is_empty() {
            return Err(AppError::validation("rules.required_terms is empty"));
        }
        if self.rules.intern_markers.is_empty() {
            return Err(AppError::validation("rules.intern_markers is empty"));
        }
        if self.rules.new_grad_markers.is_empty() {
            return Err(AppError::validation("rules.new_grad_markers is empty"));
        }
        for pattern in &self.rules.level_patterns {
            regex::Regex::new(pattern).map_err(|e| AppError::pattern(pattern, e))?;
        }
        if self.dispatch.batch_size == 0 {
            return Err(AppError::validation("dispatch.batch_size must be > 0"));
        }
        if self.dispatch.timeout_secs == 0 {
            return Err(AppError::validation("dispatch.timeout_secs must be > 0"));
        }
        if self.dispatch.user_agent.trim().is_empty() {
            return Err(AppError::validation("dispatch.user_agent is empty"));
        }
        for (bucket, destination) in &self.dispatch.destinations {
            url::Url::parse(destination).map_err(|e| {
                AppError::validation(format!(
                    "dispatch.destinations[{}] is not a valid URL: {}",
                    bucket, e
                ))
            })?;
        }
        if self.cache.max_size == 0 {
            return Err(AppError::validation("cache.max_size must be > 0"));
        }
        Ok(())
    }
}

/// Relevance rule lists, evaluated in the engine's fixed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Title terms that reject a posting outright (case-insensitive substring)
    #[serde(default = "defaults::excluded_terms")]
    pub excluded_terms: Vec<String>,

    /// At least one of these must appear in the title (or, on the
    /// secondary pass, in title + description + company)
    #[serde(default = "defaults::required_terms")]
    pub required_terms: Vec<String>,

    /// Markers identifying an internship posting
    #[serde(default = "defaults::intern_markers")]
    pub intern_markers: Vec<String>,

    /// Markers identifying a new-grad posting
    #[serde(default = "defaults::new_grad_markers")]
    pub new_grad_markers: Vec<String>,

    /// Level-indicator regexes (e.g. titles ending in "Engineer I",
    /// "SDE 1") counted as new-grad signals
    #[serde(default = "defaults::level_patterns")]
    pub level_patterns: Vec<String>,

    /// Aggregator placeholder company names to reject
    #[serde(default = "defaults::company_blacklist")]
    pub company_blacklist: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            excluded_terms: defaults::excluded_terms(),
            required_terms: defaults::required_terms(),
            intern_markers: defaults::intern_markers(),
            new_grad_markers: defaults::new_grad_markers(),
            level_patterns: defaults::level_patterns(),
            company_blacklist: defaults::company_blacklist(),
        }
    }
}

/// Category keyword lists, checked most-specific first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyConfig {
    /// data_science_engineer keywords (checked first)
    #[serde(default = "defaults::data_science_keywords")]
    pub data_science_keywords: Vec<String>,

    /// data_analysis keywords (checked second)
    #[serde(default = "defaults::data_analysis_keywords")]
    pub data_analysis_keywords: Vec<String>,

    /// software_engineering keywords (checked last)
    #[serde(default = "defaults::software_keywords")]
    pub software_keywords: Vec<String>,

    /// Producer hint to category mappings
    #[serde(default = "defaults::aliases")]
    pub aliases: Vec<CategoryAlias>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            data_science_keywords: defaults::data_science_keywords(),
            data_analysis_keywords: defaults::data_analysis_keywords(),
            software_keywords: defaults::software_keywords(),
            aliases: defaults::aliases(),
        }
    }
}

/// Mapping from a producer category hint to a pipeline category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryAlias {
    /// Hint string as emitted by a scraper (lowercased for matching)
    pub hint: String,

    /// Category the hint maps to
    pub category: Category,
}

/// Batching, pacing and destination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum records per notification batch
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Delay before every send, in milliseconds (the rate-limit mechanism)
    #[serde(default = "defaults::inter_send_delay")]
    pub inter_send_delay_ms: u64,

    /// User-Agent header for webhook requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Webhook request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Bucket key ("role::category") to destination URL
    #[serde(default)]
    pub destinations: HashMap<String, String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::batch_size(),
            inter_send_delay_ms: defaults::inter_send_delay(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            destinations: HashMap::new(),
        }
    }
}

/// Seen-cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum records retained per source; oldest beyond this are pruned
    #[serde(default = "defaults::max_cache_size")]
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: defaults::max_cache_size(),
        }
    }
}

mod defaults {
    use super::CategoryAlias;
    use crate::models::Category;

    // Dispatch defaults
    pub fn batch_size() -> usize {
        10
    }
    pub fn inter_send_delay() -> u64 {
        2000
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; jobring/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Cache defaults
    pub fn max_cache_size() -> usize {
        1000
    }

    // Relevance rule defaults
    pub fn excluded_terms() -> Vec<String> {
        [
            "senior",
            "staff ",
            "principal",
            "lead ",
            "manager",
            "director",
            "architect",
            "distinguished",
            "phd required",
            "10+ years",
            "7+ years",
            "5+ years",
        ]
        .map(String::from)
        .to_vec()
    }

    pub fn required_terms() -> Vec<String> {
        [
            "engineer",
            "engineering",
            "developer",
            "software",
            "swe",
            "sde",
            "data",
            "analyst",
            "analytics",
            "scientist",
            "machine learning",
            "programmer",
        ]
        .map(String::from)
        .to_vec()
    }

    pub fn intern_markers() -> Vec<String> {
        ["intern", "internship", "co-op", "coop", "student"]
            .map(String::from)
            .to_vec()
    }

    pub fn new_grad_markers() -> Vec<String> {
        [
            "new grad",
            "new graduate",
            "university grad",
            "recent graduate",
            "entry level",
            "entry-level",
            "early career",
            "early in career",
            "campus hire",
        ]
        .map(String::from)
        .to_vec()
    }

    pub fn level_patterns() -> Vec<String> {
        [
            // Titles ending in a junior level suffix are a common
            // new-grad signal not captured by plain keyword lists.
            r"(?i)\b(engineer|developer|analyst|scientist)\s+(i|1)\s*$",
            r"(?i)\bsde\s*[-\s]?(i|1)\s*$",
            r"(?i)\bswe\s*[-\s]?(i|1)\s*$",
            r"(?i)\blevel\s*1\b",
        ]
        .map(String::from)
        .to_vec()
    }

    pub fn company_blacklist() -> Vec<String> {
        [
            "unknown company",
            "multiple companies",
            "various companies",
            "confidential",
            "company name",
            "n/a",
        ]
        .map(String::from)
        .to_vec()
    }

    // Classification defaults
    pub fn data_science_keywords() -> Vec<String> {
        [
            "data scientist",
            "data science",
            "machine learning",
            "ml engineer",
            "mlops",
            "ai engineer",
            "applied scientist",
            "research scientist",
            "deep learning",
            "nlp",
            "computer vision",
        ]
        .map(String::from)
        .to_vec()
    }

    pub fn data_analysis_keywords() -> Vec<String> {
        [
            "data analyst",
            "data analytics",
            "business intelligence",
            "bi analyst",
            "business analyst",
            "reporting analyst",
            "analytics engineer",
        ]
        .map(String::from)
        .to_vec()
    }

    pub fn software_keywords() -> Vec<String> {
        [
            "software engineer",
            "software developer",
            "swe",
            "sde",
            "frontend",
            "front end",
            "backend",
            "back end",
            "full stack",
            "fullstack",
            "web developer",
            "mobile engineer",
            "ios",
            "android",
            "devops",
            "site reliability",
            "embedded",
            "platform engineer",
            "qa engineer",
            "test engineer",
            "developer",
            "engineer",
            "programmer",
        ]
        .map(String::from)
        .to_vec()
    }

    pub fn aliases() -> Vec<CategoryAlias> {
        vec![
            CategoryAlias {
                hint: "business_analyst".to_string(),
                category: Category::DataAnalysis,
            },
            CategoryAlias {
                hint: "data_analyst".to_string(),
                category: Category::DataAnalysis,
            },
            CategoryAlias {
                hint: "data_analysis".to_string(),
                category: Category::DataAnalysis,
            },
            CategoryAlias {
                hint: "data_science".to_string(),
                category: Category::DataScienceEngineer,
            },
            CategoryAlias {
                hint: "machine_learning".to_string(),
                category: Category::DataScienceEngineer,
            },
            CategoryAlias {
                hint: "ml".to_string(),
                category: Category::DataScienceEngineer,
            },
            CategoryAlias {
                hint: "software".to_string(),
                category: Category::SoftwareEngineering,
            },
            CategoryAlias {
                hint: "software_engineering".to_string(),
                category: Category::SoftwareEngineering,
            },
            CategoryAlias {
                hint: "swe".to_string(),
                category: Category::SoftwareEngineering,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let mut config = Config::default();
        config.dispatch.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_required_terms() {
        let mut config = Config::default();
        config.rules.required_terms.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_level_pattern() {
        let mut config = Config::default();
        config.rules.level_patterns.push("[[invalid".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_destination_url() {
        let mut config = Config::default();
        config
            .dispatch
            .destinations
            .insert("intern::software_engineering".into(), "not a url".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [dispatch]
            batch_size = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.dispatch.batch_size, 5);
        assert_eq!(config.dispatch.inter_send_delay_ms, 2000);
        assert!(!config.rules.intern_markers.is_empty());
    }
}
