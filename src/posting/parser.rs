//! Pasted job posting parser.

use tracing::{debug, trace};

use super::model::{ParsedJobPosting, PostingField};
use super::rules::{
    CompanyFallbackRule, ExtractionRule, Label, LabelRule, PostingText, TitleRule, UrlRule,
};

/// Runs an ordered pipeline of extraction rules over pasted text.
///
/// The first rule to produce a value for a field wins; later rules for the
/// same field are skipped. Parsing never fails: anything not found is left
/// as `None`.
pub struct JobPostingParser {
    rules: Vec<Box<dyn ExtractionRule>>,
}

impl JobPostingParser {
    /// Create a parser with the default rule pipeline.
    pub fn new() -> Self {
        Self::with_rules(Self::default_rules())
    }

    /// Create a parser with a custom rule pipeline.
    pub fn with_rules(rules: Vec<Box<dyn ExtractionRule>>) -> Self {
        Self { rules }
    }

    /// The default pipeline, in precedence order.
    pub fn default_rules() -> Vec<Box<dyn ExtractionRule>> {
        vec![
            Box::new(LabelRule::new(PostingField::JobTitle, Label::JobTitle)),
            Box::new(TitleRule),
            Box::new(LabelRule::new(PostingField::Company, Label::Company)),
            Box::new(CompanyFallbackRule),
            Box::new(LabelRule::new(PostingField::Location, Label::Location)),
            Box::new(LabelRule::new(PostingField::JobType, Label::JobType)),
            Box::new(LabelRule::new(PostingField::Salary, Label::Salary)),
            Box::new(UrlRule),
        ]
    }

    /// Extract structured fields from a pasted job description.
    pub fn parse(&self, raw: &str) -> ParsedJobPosting {
        let text = PostingText::new(raw);
        let mut parsed = ParsedJobPosting::empty();

        for rule in &self.rules {
            let field = rule.field();
            if parsed.field(field).is_some() {
                continue;
            }
            if let Some(value) = rule.extract(&text) {
                trace!(rule = rule.name(), field = ?field, "Extraction rule matched");
                parsed.set(field, value);
            }
        }

        debug!(
            lines = text.lines().len(),
            extracted = parsed.extracted_count(),
            "Parsed pasted job posting"
        );
        parsed
    }
}

impl Default for JobPostingParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a pasted job description with the default rules.
pub fn parse_job_posting(raw: &str) -> ParsedJobPosting {
    JobPostingParser::new().parse(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posting::model::PostingSource;

    const ACME_POSTING: &str = "Senior QA Engineer\nCompany: ACME Corp\nLocation: Remote\nJob Type: Full-time\nSalary: $100k-$120k\n\n...\nhttps://example.com/jobs/123";

    #[test]
    fn test_full_labelled_posting() {
        let parsed = parse_job_posting(ACME_POSTING);

        assert_eq!(
            parsed,
            ParsedJobPosting {
                job_title: Some("Senior QA Engineer".to_string()),
                company: Some("ACME Corp".to_string()),
                location: Some("Remote".to_string()),
                job_type: Some("Full-time".to_string()),
                salary: Some("$100k-$120k".to_string()),
                job_post_url: Some("https://example.com/jobs/123".to_string()),
                source: PostingSource::Pasted,
                is_pasted: true,
            }
        );
        assert!(parsed.is_remote());
    }

    #[test]
    fn test_empty_input() {
        let parsed = parse_job_posting("");
        assert_eq!(parsed, ParsedJobPosting::empty());
        assert!(parsed.is_empty());
        assert_eq!(parsed.source, PostingSource::Pasted);
        assert!(parsed.is_pasted);
    }

    #[test]
    fn test_whitespace_only_input() {
        assert!(parse_job_posting("  \n\t\n   ").is_empty());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let parser = JobPostingParser::new();
        assert_eq!(parser.parse(ACME_POSTING), parser.parse(ACME_POSTING));
    }

    #[test]
    fn test_labels_case_insensitive_with_padding() {
        let text = "  Staff Engineer  \n\n  COMPANY:     Initech \nlocation:\t  Austin, TX\njob type:   Contract\nSALARY:  €80.000 - €95.000 \n";
        let parsed = parse_job_posting(text);

        assert_eq!(parsed.job_title.as_deref(), Some("Staff Engineer"));
        assert_eq!(parsed.company.as_deref(), Some("Initech"));
        assert_eq!(parsed.location.as_deref(), Some("Austin, TX"));
        assert_eq!(parsed.job_type.as_deref(), Some("Contract"));
        assert_eq!(parsed.salary.as_deref(), Some("€80.000 - €95.000"));
        assert_eq!(parsed.job_post_url, None);
    }

    #[test]
    fn test_first_candidate_wins() {
        let text = "Data Analyst\nCompany: First Co\nCompany: Second Co\nLocation: remote\nLocation: Paris\nSee https://first.example/a and https://second.example/b";
        let parsed = parse_job_posting(text);

        assert_eq!(parsed.company.as_deref(), Some("First Co"));
        assert_eq!(parsed.location.as_deref(), Some("remote"));
        assert!(parsed.is_remote());
        assert_eq!(parsed.job_post_url.as_deref(), Some("https://first.example/a"));
    }

    #[test]
    fn test_label_first_line_has_no_title() {
        let parsed = parse_job_posting("Company: ACME Corp\nLocation: Remote");
        assert_eq!(parsed.job_title, None);
        assert_eq!(parsed.company.as_deref(), Some("ACME Corp"));
    }

    #[test]
    fn test_company_fallback_after_title() {
        let parsed = parse_job_posting("Frontend Developer\nGlobex\nLocation: Remote");
        assert_eq!(parsed.job_title.as_deref(), Some("Frontend Developer"));
        assert_eq!(parsed.company.as_deref(), Some("Globex"));
    }

    #[test]
    fn test_labelled_company_beats_fallback() {
        let parsed = parse_job_posting("Frontend Developer\nGlobex\nCompany: Initech");
        assert_eq!(parsed.company.as_deref(), Some("Initech"));
    }

    #[test]
    fn test_unstructured_text() {
        let parsed = parse_job_posting(
            "We are looking for someone great to join our team and build the future of work.",
        );
        assert_eq!(
            parsed.job_title.as_deref(),
            Some("We are looking for someone great to join our team and build the future of work.")
        );
        assert_eq!(parsed.company, None);
        assert_eq!(parsed.extracted_count(), 1);
    }

    #[test]
    fn test_label_without_space_after_colon() {
        let parsed = parse_job_posting("Backend Engineer\nCompany:ACME\nSalary:$90k");
        assert_eq!(parsed.company.as_deref(), Some("ACME"));
        assert_eq!(parsed.salary.as_deref(), Some("$90k"));
    }

    #[test]
    fn test_blank_label_skipped_for_next_one() {
        let parsed = parse_job_posting("Backend Engineer\nCompany:\nCompany: ACME");
        assert_eq!(parsed.job_title.as_deref(), Some("Backend Engineer"));
        assert_eq!(parsed.company.as_deref(), Some("ACME"));
    }

    #[test]
    fn test_trailing_url_with_parentheses_kept_whole() {
        let parsed = parse_job_posting(
            "Engineer\nCompany: X\nhttps://en.wikipedia.org/wiki/Rust_(programming_language)",
        );
        assert_eq!(
            parsed.job_post_url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust_(programming_language)")
        );
    }

    #[test]
    fn test_leading_url_is_neither_title_nor_company_anchor() {
        let parsed =
            parse_job_posting("https://jobs.example.com/1\nSenior QA Engineer\nLocation: Remote");
        assert_eq!(parsed.job_title, None);
        assert_eq!(parsed.company, None);
        assert_eq!(parsed.job_post_url.as_deref(), Some("https://jobs.example.com/1"));
        assert_eq!(parsed.location.as_deref(), Some("Remote"));
    }

    #[test]
    fn test_labelled_job_title() {
        let parsed = parse_job_posting(
            "Job Title: Senior QA Engineer\nCompany: ACME Corp\nLocation: Remote",
        );
        assert_eq!(parsed.job_title.as_deref(), Some("Senior QA Engineer"));
        assert_eq!(parsed.company.as_deref(), Some("ACME Corp"));
    }

    #[test]
    fn test_custom_pipeline() {
        let parser = JobPostingParser::with_rules(vec![Box::new(UrlRule)]);
        let parsed = parser.parse(ACME_POSTING);

        assert_eq!(parsed.job_title, None);
        assert_eq!(parsed.job_post_url.as_deref(), Some("https://example.com/jobs/123"));
    }
}
