//! Structured result of parsing a pasted job posting.

use serde::{Deserialize, Serialize};

/// Where a posting came from. Parsed postings are always pasted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostingSource {
    #[default]
    #[serde(rename = "PASTED")]
    Pasted,
}

/// A field an extraction rule can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostingField {
    JobTitle,
    Company,
    Location,
    JobType,
    Salary,
    JobPostUrl,
}

/// Fields extracted from a pasted job description.
///
/// Serializes with camelCase names so it can prefill the job form as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedJobPosting {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    /// Free text, kept byte-exact (e.g. `$100k-$120k`)
    pub salary: Option<String>,
    pub job_post_url: Option<String>,
    pub source: PostingSource,
    pub is_pasted: bool,
}

impl ParsedJobPosting {
    /// A result with nothing extracted.
    pub fn empty() -> Self {
        Self {
            job_title: None,
            company: None,
            location: None,
            job_type: None,
            salary: None,
            job_post_url: None,
            source: PostingSource::Pasted,
            is_pasted: true,
        }
    }

    /// Get the value of a field.
    pub fn field(&self, field: PostingField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub(crate) fn set(&mut self, field: PostingField, value: String) {
        *self.slot_mut(field) = Some(value);
    }

    /// Whether nothing could be extracted; callers ask the user to fill
    /// the form manually.
    pub fn is_empty(&self) -> bool {
        self.extracted_count() == 0
    }

    /// Number of fields that were extracted.
    pub fn extracted_count(&self) -> usize {
        ALL_FIELDS
            .iter()
            .filter(|field| self.field(**field).is_some())
            .count()
    }

    /// Whether the location mentions remote work, ignoring case.
    pub fn is_remote(&self) -> bool {
        self.location
            .as_deref()
            .map(|location| location.to_lowercase().contains("remote"))
            .unwrap_or(false)
    }

    fn slot(&self, field: PostingField) -> &Option<String> {
        match field {
            PostingField::JobTitle => &self.job_title,
            PostingField::Company => &self.company,
            PostingField::Location => &self.location,
            PostingField::JobType => &self.job_type,
            PostingField::Salary => &self.salary,
            PostingField::JobPostUrl => &self.job_post_url,
        }
    }

    fn slot_mut(&mut self, field: PostingField) -> &mut Option<String> {
        match field {
            PostingField::JobTitle => &mut self.job_title,
            PostingField::Company => &mut self.company,
            PostingField::Location => &mut self.location,
            PostingField::JobType => &mut self.job_type,
            PostingField::Salary => &mut self.salary,
            PostingField::JobPostUrl => &mut self.job_post_url,
        }
    }
}

impl Default for ParsedJobPosting {
    fn default() -> Self {
        Self::empty()
    }
}

const ALL_FIELDS: [PostingField; 6] = [
    PostingField::JobTitle,
    PostingField::Company,
    PostingField::Location,
    PostingField::JobType,
    PostingField::Salary,
    PostingField::JobPostUrl,
];
