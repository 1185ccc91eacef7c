//! JSON output formatting

use serde_json::{json, Value};

use crate::dictionary::KeywordMap;
use crate::output::formatter::Report;

pub fn format_json(report: &Report) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_words_json(words: &KeywordMap) -> String {
    let items: Vec<Value> = words
        .by_length()
        .iter()
        .map(|k| json!({ "keyword": k.word, "replacement": k.replacement }))
        .collect();

    serde_json::to_string_pretty(&json!({ "keywords": items })).unwrap_or_else(|_| "{}".to_string())
}
