//! Search query construction.
//!
//! Engines weight earlier terms more, so the query runs from most to
//! least specific:
//!
//! ```text
//! "Grade 8" "Physics" "Gravity" ["Subtopic"] keyword keyword -exclusions (site:a OR site:b)
//! ```

use tracing::debug;

use crate::types::config::{QueryVocabulary, KEYWORDS_PER_CONTENT_TYPE};
use crate::types::grade::Grade;

/// Inputs for one query.
#[derive(Debug, Clone, Copy)]
pub struct QueryParts<'a> {
    pub grade: &'a Grade,
    pub subject: &'a str,
    pub topic: &'a str,
    pub subtopic: Option<&'a str>,
    pub content_types: &'a [String],
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    vocabulary: QueryVocabulary,
}

impl QueryBuilder {
    pub fn new(vocabulary: QueryVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &QueryVocabulary {
        &self.vocabulary
    }

    /// Build the query. `domains` adds a site filter when non-empty.
    pub fn build(&self, parts: &QueryParts<'_>, domains: Option<&[String]>) -> String {
        let mut terms: Vec<String> = vec![
            quoted(&format!("Grade {}", parts.grade.label())),
            quoted(parts.subject),
            quoted(parts.topic),
        ];
        if let Some(subtopic) = parts.subtopic {
            terms.push(quoted(subtopic));
        }

        for tag in parts.content_types {
            match self.vocabulary.content_keywords.get(tag.trim()) {
                Some(keywords) => terms.extend(
                    keywords
                        .iter()
                        .take(KEYWORDS_PER_CONTENT_TYPE)
                        .cloned(),
                ),
                None => debug!(tag = %tag, "Unknown content type; no keyword hints"),
            }
        }

        if let Some(exclusions) = self.vocabulary.grade_exclusions.get(&parts.grade.band()) {
            terms.push(exclusions.clone());
        }

        if let Some(domains) = domains {
            terms.push(site_filter(domains));
        }

        let query = terms
            .into_iter()
            .filter(|t| !t.trim().is_empty() && t != "\"\"")
            .collect::<Vec<_>>()
            .join(" ");

        debug!(query = %query, "Built query");
        query
    }
}

/// `site:a` for one domain, `(site:a OR site:b)` for several, empty for none.
pub fn site_filter(domains: &[String]) -> String {
    match domains {
        [] => String::new(),
        [only] => format!("site:{}", only),
        many => format!(
            "({})",
            many.iter()
                .map(|d| format!("site:{}", d))
                .collect::<Vec<_>>()
                .join(" OR ")
        ),
    }
}

fn quoted(text: &str) -> String {
    format!("\"{}\"", text.trim())
}
