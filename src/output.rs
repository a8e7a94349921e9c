//! CLI output formatting for the admin commands.
//!
//! # Entity Display Contract
//!
//! Every listed entity (article, subscriber, fruit link) follows the same
//! two-level pattern:
//!
//! 1. **Header line**: positional index + identity (title, email, name)
//! 2. **Context lines**: indented `Key: value` details
//!
//! # Output Format
//!
//! ## Search
//!
//! ```text
//! Results for "notion" (1)
//! 001 How to Set Up [Notion] and Blog Sync
//!     Date: August 18, 2025
//!     Link: posts/how-to-set-up-notion-and-blog-sync.html
//!     Summary: Overview This integration system allows you to write blog posts directly in...
//! ```
//!
//! Matched text is bracketed, the terminal stand-in for the highlight span.
//!
//! ## Subscribers
//!
//! ```text
//! Subscribers (1)
//! 001 reader@example.com
//!     Subscribed: 2026-10-15 09:30 UTC
//!     Id: 3f0c…
//! ```
//!
//! ## Fruits
//!
//! ```text
//! Fruits (4)
//! 001 GitHub (fruit1)
//!     Url: https://github.com/JoyceGu
//!     Position: 90%, 5%
//!     Style: fruit-1
//! ```
//!
//! # Architecture
//!
//! Each listing has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::config::SiteConfig;
use crate::search::{Highlighted, NO_RESULTS_MESSAGE, SearchIndex, highlight};
use crate::subscribe::{Export, Subscriber};
use crate::types::{Article, FruitLink};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut.trim_end())
    }
}

/// Render highlighted text with matches in `[brackets]`.
fn bracketed(text: &Highlighted) -> String {
    text.segments
        .iter()
        .map(|s| {
            if s.emphasized {
                format!("[{}]", s.text)
            } else {
                s.text.clone()
            }
        })
        .collect()
}

// ============================================================================
// Search
// ============================================================================

pub fn format_search_results(query: &str, results: &[&Article]) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return vec!["Enter a search term".to_string()];
    }
    if results.is_empty() {
        return vec![NO_RESULTS_MESSAGE.to_string()];
    }

    let mut lines = vec![format!("Results for {:?} ({})", query, results.len())];
    for (i, article) in results.iter().enumerate() {
        let title = bracketed(&highlight(&article.title, query));
        let summary = bracketed(&highlight(&truncate_desc(&article.summary, 80), query));
        lines.push(format!("{} {}", format_index(i + 1), title));
        lines.push(format!("{}Date: {}", indent(1), article.display_date()));
        lines.push(format!("{}Link: {}", indent(1), article.url));
        lines.push(format!("{}Summary: {}", indent(1), summary));
    }
    lines
}

/// Search `index` and format the hits. Surrounding whitespace is dropped
/// once, so matching and highlighting see the same term.
pub fn format_search(index: &SearchIndex, query: &str) -> Vec<String> {
    let query = query.trim();
    format_search_results(query, &index.search(query))
}

pub fn print_search(index: &SearchIndex, query: &str) {
    for line in format_search(index, query) {
        println!("{}", line);
    }
}

// ============================================================================
// Subscribers
// ============================================================================

pub fn format_subscribers(subscribers: &[Subscriber]) -> Vec<String> {
    if subscribers.is_empty() {
        return vec!["No subscribers yet".to_string()];
    }
    let mut lines = vec![format!("Subscribers ({})", subscribers.len())];
    for (i, sub) in subscribers.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), sub.email));
        lines.push(format!(
            "{}Subscribed: {}",
            indent(1),
            sub.subscribed_at.format("%Y-%m-%d %H:%M UTC")
        ));
        lines.push(format!("{}Id: {}", indent(1), sub.id));
    }
    lines
}

pub fn print_subscribers(subscribers: &[Subscriber]) {
    for line in format_subscribers(subscribers) {
        println!("{}", line);
    }
}

/// One-line summary of a written export.
pub fn format_export(export: &Export, count: usize, path: &Path) -> String {
    format!(
        "Exported {} subscriber{} → {} ({})",
        count,
        if count == 1 { "" } else { "s" },
        path.display(),
        export.filename
    )
}

// ============================================================================
// Fruits
// ============================================================================

pub fn format_fruits(links: &[FruitLink]) -> Vec<String> {
    let mut lines = vec![format!("Fruits ({})", links.len())];
    for (i, link) in links.iter().enumerate() {
        lines.push(format!("{} {} ({})", format_index(i + 1), link.name, link.id));
        if link.label() != link.name {
            lines.push(format!("{}Label: {}", indent(1), link.label()));
        }
        lines.push(format!("{}Url: {}", indent(1), link.url));
        lines.push(format!(
            "{}Position: {}%, {}%",
            indent(1),
            link.position.x,
            link.position.y
        ));
        lines.push(format!("{}Style: {}", indent(1), link.style().class_name()));
    }
    lines
}

pub fn print_fruits(links: &[FruitLink]) {
    for line in format_fruits(links) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Summary of a validated configuration.
pub fn format_config_summary(config: &SiteConfig) -> Vec<String> {
    vec![
        "Config".to_string(),
        format!("{}Articles: {}", indent(1), config.articles.len()),
        format!("{}Fruits: {}", indent(1), config.fruits.len()),
        format!("{}Default language: {}", indent(1), config.language.default),
        format!("{}Storage key: {}", indent(1), config.subscribe.storage_key),
    ]
}

pub fn print_config_summary(config: &SiteConfig) {
    for line in format_config_summary(config) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_articles, default_fruits};
    use chrono::{TimeZone, Utc};

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn truncate_short_text_unchanged() {
        assert_eq!(truncate_desc("short", 10), "short");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_desc("你好世界", 2), "你好...");
    }

    #[test]
    fn bracketed_marks_matches() {
        assert_eq!(bracketed(&highlight("Notion and notion", "NOTION")), "[Notion] and [notion]");
    }

    // =========================================================================
    // Search output
    // =========================================================================

    #[test]
    fn search_output_lists_hits() {
        let articles = default_articles();
        let hits: Vec<&Article> = articles.iter().take(1).collect();
        let lines = format_search_results("notion", &hits);
        assert_eq!(lines[0], "Results for \"notion\" (1)");
        assert_eq!(lines[1], "001 How to Set Up [Notion] and Blog Sync");
        assert_eq!(lines[2], "    Date: August 18, 2025");
        assert!(lines[3].starts_with("    Link: posts/"));
    }

    #[test]
    fn search_ignores_surrounding_whitespace() {
        let index = SearchIndex::new(vec![Article {
            title: "Rust".into(),
            summary: String::new(),
            date: chrono::NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            url: "posts/rust.html".into(),
            content: String::new(),
        }]);
        let lines = format_search(&index, " rust ");
        assert_eq!(lines[0], "Results for \"rust\" (1)");
        assert_eq!(lines[1], "001 [Rust]");
        assert_eq!(lines, format_search(&index, "rust"));
        assert_eq!(format_search(&index, "  "), vec!["Enter a search term"]);
    }

    #[test]
    fn search_output_without_hits() {
        assert_eq!(format_search_results("zzz", &[]), vec![NO_RESULTS_MESSAGE]);
        assert_eq!(format_search_results("   ", &[]), vec!["Enter a search term"]);
    }

    // =========================================================================
    // Subscriber output
    // =========================================================================

    #[test]
    fn subscriber_output() {
        let subs = vec![Subscriber {
            email: "reader@example.com".into(),
            subscribed_at: Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap(),
            id: "abc".into(),
        }];
        assert_eq!(
            format_subscribers(&subs),
            vec![
                "Subscribers (1)",
                "001 reader@example.com",
                "    Subscribed: 2026-10-15 09:30 UTC",
                "    Id: abc",
            ]
        );
        assert_eq!(format_subscribers(&[]), vec!["No subscribers yet"]);
    }

    #[test]
    fn export_line_pluralizes() {
        let export = Export {
            filename: "subscribers-2026-10-15.json".into(),
            contents: "[]".into(),
        };
        let path = Path::new("out/subscribers-2026-10-15.json");
        assert_eq!(
            format_export(&export, 1, path),
            "Exported 1 subscriber → out/subscribers-2026-10-15.json (subscribers-2026-10-15.json)"
        );
        assert!(format_export(&export, 3, path).starts_with("Exported 3 subscribers"));
    }

    // =========================================================================
    // Fruit output
    // =========================================================================

    #[test]
    fn fruit_output_shows_label_only_when_different() {
        let lines = format_fruits(&default_fruits());
        assert_eq!(lines[0], "Fruits (4)");
        assert_eq!(lines[1], "001 GitHub (fruit1)");
        assert_eq!(lines[2], "    Url: https://github.com/JoyceGu");
        let gmail = lines
            .iter()
            .position(|l| l.starts_with("004 "))
            .unwrap();
        assert_eq!(lines[gmail + 1], "    Label: Gmail Agent");
    }

    #[test]
    fn config_summary() {
        let lines = format_config_summary(&SiteConfig::default());
        assert_eq!(lines[1], "    Articles: 2");
        assert_eq!(lines[3], "    Default language: English");
    }
}
