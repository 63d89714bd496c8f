//! Extraction rules for pasted job postings.
//!
//! Each rule fills one field. The parser runs them in order and skips a
//! rule once its field is filled, so earlier rules take precedence.

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::PostingField;

/// Longest line accepted as a company name when there is no label.
const MAX_COMPANY_FALLBACK_LEN: usize = 60;

static JOB_TITLE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:job\s+)?title:\s*(.+)").unwrap());
static COMPANY_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^company:\s*(.+)").unwrap());
static LOCATION_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^location:\s*(.+)").unwrap());
static JOB_TYPE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^job type:\s*(.+)").unwrap());
static SALARY_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^salary:\s*(.+)").unwrap());

/// Any known label, with or without a value.
static ANY_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:job\s+)?title|company|location|job type|salary):").unwrap()
});

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bhttps?://\S+").unwrap());

/// A `Label: value` line the parser recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// `Job Title:` or `Title:`
    JobTitle,
    Company,
    Location,
    JobType,
    Salary,
}

impl Label {
    /// The label as written in a posting.
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::JobTitle => "Job Title",
            Label::Company => "Company",
            Label::Location => "Location",
            Label::JobType => "Job Type",
            Label::Salary => "Salary",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Label::JobTitle => &JOB_TITLE_LABEL,
            Label::Company => &COMPANY_LABEL,
            Label::Location => &LOCATION_LABEL,
            Label::JobType => &JOB_TYPE_LABEL,
            Label::Salary => &SALARY_LABEL,
        }
    }
}

/// Input text split into trimmed, non-blank lines.
#[derive(Debug, Clone)]
pub struct PostingText<'a> {
    raw: &'a str,
    lines: Vec<&'a str>,
}

impl<'a> PostingText<'a> {
    /// Split pasted text into trimmed lines, dropping blank ones.
    pub fn new(raw: &'a str) -> Self {
        let lines = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        Self { raw, lines }
    }

    /// The text as pasted.
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Trimmed, non-blank lines.
    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }
}

/// A heuristic that extracts a single field.
pub trait ExtractionRule: Send + Sync {
    /// The field this rule fills.
    fn field(&self) -> PostingField;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Try to extract the field from the text.
    fn extract(&self, text: &PostingText<'_>) -> Option<String>;
}

/// Value of a `Label: value` line, matching the label case-insensitively.
///
/// Returns `None` if the line has another label or the value is blank.
pub fn label_value<'a>(line: &'a str, label: Label) -> Option<&'a str> {
    let captures = label.pattern().captures(line)?;
    let value = captures.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Whether the line starts with any known label, value or not.
pub fn is_label_line(line: &str) -> bool {
    ANY_LABEL.is_match(line)
}

/// Find the first `http://` or `https://` URL in the text.
pub fn find_url(text: &str) -> Option<&str> {
    URL.find_iter(text)
        .map(|m| trim_url_tail(m.as_str()))
        .find(|url| url.find("://").is_some_and(|i| url.len() > i + 3))
}

/// Drop trailing sentence punctuation, and closing brackets that have no
/// opener inside the URL.
fn trim_url_tail(mut url: &str) -> &str {
    while let Some(last) = url.chars().last() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '"' | '\'' => true,
            ')' => unbalanced(url, '(', ')'),
            ']' => unbalanced(url, '[', ']'),
            '}' => unbalanced(url, '{', '}'),
            '>' => unbalanced(url, '<', '>'),
            _ => false,
        };
        if !strip {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    url
}

fn unbalanced(url: &str, open: char, close: char) -> bool {
    url.matches(open).count() < url.matches(close).count()
}

/// Whether the first line can stand as an unlabelled title.
fn is_title_line(line: &str) -> bool {
    !is_label_line(line) && find_url(line) != Some(line)
}

/// Title: the first line, unless it is a label line or a bare URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleRule;

impl ExtractionRule for TitleRule {
    fn field(&self) -> PostingField {
        PostingField::JobTitle
    }

    fn name(&self) -> &'static str {
        "title"
    }

    fn extract(&self, text: &PostingText<'_>) -> Option<String> {
        let first = *text.lines().first()?;
        is_title_line(first).then(|| first.to_string())
    }
}

/// The value of the first `Label: value` line for a given label.
#[derive(Debug, Clone, Copy)]
pub struct LabelRule {
    field: PostingField,
    label: Label,
}

impl LabelRule {
    /// Fill `field` from the first line carrying `label`.
    pub fn new(field: PostingField, label: Label) -> Self {
        Self { field, label }
    }
}

impl ExtractionRule for LabelRule {
    fn field(&self) -> PostingField {
        self.field
    }

    fn name(&self) -> &'static str {
        self.label.as_str()
    }

    fn extract(&self, text: &PostingText<'_>) -> Option<String> {
        text.lines()
            .iter()
            .find_map(|line| label_value(line, self.label))
            .map(str::to_string)
    }
}

/// Company without a label: a short plain line directly after the title.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompanyFallbackRule;

impl ExtractionRule for CompanyFallbackRule {
    fn field(&self) -> PostingField {
        PostingField::Company
    }

    fn name(&self) -> &'static str {
        "company-fallback"
    }

    fn extract(&self, text: &PostingText<'_>) -> Option<String> {
        let lines = text.lines();
        let title = *lines.first()?;
        let candidate = *lines.get(1)?;

        if !is_title_line(title)
            || candidate.contains(':')
            || candidate.ends_with('.')
            || candidate.chars().count() > MAX_COMPANY_FALLBACK_LEN
        {
            return None;
        }
        Some(candidate.to_string())
    }
}

/// The first URL anywhere in the text.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlRule;

impl ExtractionRule for UrlRule {
    fn field(&self) -> PostingField {
        PostingField::JobPostUrl
    }

    fn name(&self) -> &'static str {
        "url"
    }

    fn extract(&self, text: &PostingText<'_>) -> Option<String> {
        find_url(text.raw()).map(str::to_string)
    }
}
