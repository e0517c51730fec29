// src/pipeline/classify.rs

//! Role-category classification.
//!
//! Title matching takes priority over the producer hint so that a
//! "Data Scientist" posting sourced from a feed tagged `data_analysis`
//! is reclassified correctly. Keyword lists are checked most-specific
//! first: data_science_engineer, then data_analysis, then
//! software_engineering.

use crate::models::{CanonicalRecord, Category, ClassifyConfig};

/// Keyword classifier built from configuration.
pub struct Classifier {
    config: ClassifyConfig,
}

impl Classifier {
    pub fn new(config: &ClassifyConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Classify a record into a category.
    ///
    /// 1. keyword passes over the title;
    /// 2. producer hint through the alias table;
    /// 3. keyword passes over title + description + company;
    /// 4. default software_engineering.
    pub fn classify(&self, record: &CanonicalRecord) -> Category {
        if let Some(category) = self.match_keywords(&record.normalized_title) {
            return category;
        }

        if let Some(hint) = &record.category_hint {
            if let Some(category) = self.resolve_hint(hint) {
                return category;
            }
        }

        let combined = format!(
            "{} {} {}",
            record.normalized_title,
            record.description.to_lowercase(),
            record.normalized_company
        );
        if let Some(category) = self.match_keywords(&combined) {
            return category;
        }

        Category::SoftwareEngineering
    }

    /// Keyword pass in fixed specificity order.
    fn match_keywords(&self, text: &str) -> Option<Category> {
        if self.contains_any(text, &self.config.data_science_keywords) {
            return Some(Category::DataScienceEngineer);
        }
        if self.contains_any(text, &self.config.data_analysis_keywords) {
            return Some(Category::DataAnalysis);
        }
        if self.contains_any(text, &self.config.software_keywords) {
            return Some(Category::SoftwareEngineering);
        }
        None
    }

    /// Map a producer hint through the alias table.
    fn resolve_hint(&self, hint: &str) -> Option<Category> {
        let hint = hint.trim().to_lowercase();
        self.config
            .aliases
            .iter()
            .find(|alias| alias.hint == hint)
            .map(|alias| alias.category)
    }

    fn contains_any(&self, text: &str, keywords: &[String]) -> bool {
        keywords.iter().any(|kw| text.contains(&kw.to_lowercase()))
    }
}
