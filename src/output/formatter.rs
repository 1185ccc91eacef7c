//! Output formatting

use serde::Serialize;

use crate::dictionary::KeywordMap;
use crate::output::human::{format_human, format_words_human};
use crate::output::json::{format_json, format_words_json};
use crate::sandbox::ExecutionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Everything shown for one invocation
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub source: String,
    pub translated: String,
    /// `None` when only translating
    pub result: Option<ExecutionResult>,
}

pub fn format_report(report: &Report, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_human(report),
        OutputFormat::Json => format_json(report),
    }
}

pub fn format_words(words: &KeywordMap, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Human => format_words_human(words),
        OutputFormat::Json => format_words_json(words),
    }
}
