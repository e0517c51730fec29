// src/pipeline/relevance.rs

//! Ordered relevance rule table.
//!
//! Evaluation is a short-circuit sequence of hard gates; the order is
//! part of the contract (it decides which reason is logged and which
//! rule wins for ambiguous titles):
//!
//! 1. company on the aggregator blacklist
//! 2. excluded term in the title (title only, never the description)
//! 3. no required term in the title, then in title + description + company
//! 4. requested role scope not satisfied
//! 5. accept

use regex::Regex;

use crate::error::Result;
use crate::models::{CanonicalRecord, Role, RulesConfig};

/// Outcome of evaluating the rule table for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

/// The rule that rejected a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Company matched the aggregator placeholder blacklist
    BlacklistedCompany,
    /// Title contained an excluded term
    ExcludedTerm(String),
    /// No required term anywhere in title/description/company
    MissingRequiredTerm,
    /// Requested role scope not satisfied
    RoleMismatch(Role),
}

impl RejectReason {
    pub fn describe(&self) -> String {
        match self {
            RejectReason::BlacklistedCompany => "blacklisted company".to_string(),
            RejectReason::ExcludedTerm(term) => format!("excluded term '{}'", term),
            RejectReason::MissingRequiredTerm => "no required term".to_string(),
            RejectReason::RoleMismatch(role) => format!("no {} marker", role),
        }
    }
}

/// Relevance rule engine with pre-compiled level-indicator patterns.
pub struct RelevanceEngine {
    rules: RulesConfig,
    level_patterns: Vec<Regex>,
}

impl RelevanceEngine {
    /// Build an engine from rule lists, compiling the level patterns.
    pub fn new(rules: &RulesConfig) -> Result<Self> {
        let level_patterns = rules
            .level_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| crate::error::AppError::pattern(p, e)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules: rules.clone(),
            level_patterns,
        })
    }

    /// Evaluate the ordered rule table for one record.
    ///
    /// `scope` of `None` skips the role gate entirely; `Some(Both)`
    /// requires either the intern or the new-grad condition.
    pub fn evaluate(&self, record: &CanonicalRecord, scope: Option<Role>) -> Verdict {
        // Rule 1: aggregator placeholder companies
        if self
            .rules
            .company_blacklist
            .iter()
            .any(|name| record.normalized_company == name.to_lowercase())
        {
            return Verdict::Reject(RejectReason::BlacklistedCompany);
        }

        // Rule 2: excluded terms, matched against the title only to
        // avoid false positives from long descriptions
        if let Some(term) = self
            .rules
            .excluded_terms
            .iter()
            .find(|term| record.normalized_title.contains(&term.to_lowercase()))
        {
            return Verdict::Reject(RejectReason::ExcludedTerm(term.clone()));
        }

        // Rule 3: at least one required term, title first, then the
        // combined text as a secondary pass
        let title_hit = self.contains_any(&record.normalized_title, &self.rules.required_terms);
        if !title_hit {
            let combined = format!(
                "{} {} {}",
                record.normalized_title,
                record.description.to_lowercase(),
                record.normalized_company
            );
            if !self.contains_any(&combined, &self.rules.required_terms) {
                return Verdict::Reject(RejectReason::MissingRequiredTerm);
            }
        }

        // Rule 4: role scope
        if let Some(role) = scope {
            let satisfied = match role {
                Role::Intern => self.has_intern_marker(&record.normalized_title),
                Role::NewGrad => self.has_new_grad_marker(&record.normalized_title),
                Role::Both => {
                    self.has_intern_marker(&record.normalized_title)
                        || self.has_new_grad_marker(&record.normalized_title)
                }
            };
            if !satisfied {
                return Verdict::Reject(RejectReason::RoleMismatch(role));
            }
        }

        Verdict::Accept
    }

    /// Convenience predicate that logs the rejecting rule.
    pub fn is_relevant(&self, record: &CanonicalRecord, scope: Option<Role>) -> bool {
        match self.evaluate(record, scope) {
            Verdict::Accept => true,
            Verdict::Reject(reason) => {
                log::debug!("Rejected '{}': {}", record.title, reason.describe());
                false
            }
        }
    }

    /// Whether the text carries an intern marker.
    pub fn has_intern_marker(&self, text: &str) -> bool {
        self.contains_any(text, &self.rules.intern_markers)
    }

    /// Whether the text carries a new-grad marker or a level-indicator
    /// suffix ("Engineer I", "SDE 1").
    pub fn has_new_grad_marker(&self, text: &str) -> bool {
        self.contains_any(text, &self.rules.new_grad_markers)
            || self.level_patterns.iter().any(|re| re.is_match(text))
    }

    fn contains_any(&self, text: &str, terms: &[String]) -> bool {
        terms.iter().any(|term| text.contains(&term.to_lowercase()))
    }
}
