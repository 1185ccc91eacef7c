//! Human-readable output formatting

use bytesize::ByteSize;

use crate::dictionary::KeywordMap;
use crate::output::formatter::Report;
use crate::sandbox::ExecutionResult;

fn section(title: &str) -> String {
    format!("{}\n{}\n", title, "-".repeat(title.chars().count()))
}

fn push_block(output: &mut String, text: &str) {
    output.push_str(text);
    if !text.ends_with('\n') {
        output.push('\n');
    }
}

pub fn format_human(report: &Report) -> String {
    let mut output = section("Source");
    push_block(&mut output, &report.source);

    output.push('\n');
    output.push_str(&section("Translated (Python)"));
    push_block(&mut output, &report.translated);

    if let Some(ref result) = report.result {
        output.push('\n');
        output.push_str(&format_result(result));
    }

    output
}

pub fn format_result(result: &ExecutionResult) -> String {
    let mut output = section("Result");

    if !result.stdout.is_empty() {
        output.push_str("\nSTDOUT:\n");
        push_block(&mut output, &result.stdout);
    }

    if !result.stderr.is_empty() {
        output.push_str("\nSTDERR:\n");
        push_block(&mut output, &result.stderr);
    }

    if let Some(ref error) = result.error {
        output.push_str(&format!("\nERROR: {}\n", error));
    }

    if result.is_silent() {
        output.push_str("\nProgram produced no output\n");
    }

    output.push_str(&format!(
        "\nStatus: {} | Duration: {:.2} s | Output: {} stdout, {} stderr\n",
        result.status,
        result.duration.as_secs_f64(),
        ByteSize(result.stdout.len() as u64),
        ByteSize(result.stderr.len() as u64)
    ));

    output
}

pub fn format_words_human(words: &KeywordMap) -> String {
    if words.is_empty() {
        return "No keywords defined".to_string();
    }

    let mut output = section("Keywords");
    output.push_str(&format!("{:<20} {}\n", "KEYWORD", "REPLACEMENT"));
    output.push_str(&"-".repeat(40));
    output.push('\n');
    for keyword in words.by_length() {
        output.push_str(&format!("{:<20} {}\n", keyword.word, keyword.replacement));
    }
    output.push_str(&format!("\n{} keywords\n", words.len()));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::RunStatus;
    use chrono::Utc;
    use std::time::Duration;

    fn result(stdout: &str, stderr: &str, error: Option<&str>, status: RunStatus) -> ExecutionResult {
        ExecutionResult {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            error: error.map(str::to_string),
            status,
            started_at: Utc::now(),
            duration: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_format_completed_run() {
        let report = Report {
            source: "выведи(1)".to_string(),
            translated: "print(1)".to_string(),
            result: Some(result("1\n", "", None, RunStatus::Completed { exit_code: Some(0) })),
        };
        let text = format_human(&report);
        assert!(text.starts_with("Source\n------\nвыведи(1)\n"));
        assert!(text.contains("Translated (Python)\n-------------------\nprint(1)\n"));
        assert!(text.contains("STDOUT:\n1\n"));
        assert!(!text.contains("STDERR"));
        assert!(text.contains("Status: exited with code 0 | Duration: 1.50 s"));
    }

    #[test]
    fn test_silent_run_differs_from_error() {
        let silent = format_result(&result("", "", None, RunStatus::Completed { exit_code: Some(0) }));
        assert!(silent.contains("Program produced no output"));

        let failed = format_result(&result("", "", Some("boom"), RunStatus::LaunchFailed));
        assert!(failed.contains("ERROR: boom"));
        assert!(!failed.contains("Program produced no output"));
    }

    #[test]
    fn test_translate_only_has_no_result_section() {
        let report = Report {
            source: "a".to_string(),
            translated: "a".to_string(),
            result: None,
        };
        assert!(!format_human(&report).contains("Result"));
    }

    #[test]
    fn test_words_listed_longest_first() {
        let words = KeywordMap::from_pairs([("в", "in"), ("выведи", "print")]).unwrap();
        let text = format_words_human(&words);
        let print_at = text.find("выведи").unwrap();
        let in_at = text.find("in\n").unwrap();
        assert!(print_at < in_at);
        assert!(text.contains("2 keywords"));
    }
}
