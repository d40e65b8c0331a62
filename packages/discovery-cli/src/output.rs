//! Terminal and JSON rendering of discovery results.

use anyhow::{Context, Result};
use colored::Colorize;
use edu_discovery::SearchResult;

const SNIPPET_CHARS: usize = 120;

/// Numbered list with a trust marker per result.
pub fn render_human(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "0 results.".to_string();
    }

    let mut out = format!("{} results:\n", results.len());
    for (i, result) in results.iter().enumerate() {
        let marker = if result.is_trusted() {
            "✓".green()
        } else {
            "○".dimmed()
        };
        let title = if result.title().is_empty() {
            result.domain()
        } else {
            result.title()
        };

        out.push_str(&format!("\n{:>2}. {} {}\n", i + 1, marker, title.bold()));
        out.push_str(&format!("    {}\n", result.url().cyan()));
        let snippet = preview(result.snippet());
        if !snippet.is_empty() {
            out.push_str(&format!("    {}\n", snippet));
        }
    }
    out
}

pub fn render_json(results: &[SearchResult]) -> Result<String> {
    serde_json::to_string_pretty(results).context("Failed to serialize results")
}

fn preview(snippet: &str) -> String {
    let snippet = snippet.trim();
    if snippet.chars().count() <= SNIPPET_CHARS {
        return snippet.to_string();
    }
    let mut cut: String = snippet.chars().take(SNIPPET_CHARS).collect();
    cut.push('…');
    cut
}
