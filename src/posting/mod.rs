//! Heuristic extraction of structured fields from pasted job descriptions.

mod model;
mod parser;
mod rules;

pub use model::{ParsedJobPosting, PostingField, PostingSource};
pub use parser::{parse_job_posting, JobPostingParser};
pub use rules::{
    find_url, is_label_line, label_value, CompanyFallbackRule, ExtractionRule, Label, LabelRule,
    PostingText, TitleRule, UrlRule,
};
