use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use trendcast_core::{CoreError, Topic};

use crate::{image_link, image_link_prefix, write_document};

const TAGS: &[&str] = &["ai-news", "reddit", "trends"];

/// Renders the digest as a Markdown note with YAML front matter.
pub fn render_markdown(
    topics: &[Topic],
    summary: &str,
    image_prefix: &str,
    date: NaiveDate,
) -> String {
    let mut note = String::new();

    note.push_str("---\n");
    let _ = writeln!(note, "date: {}", date.format("%Y-%m-%d"));
    note.push_str("tags:\n");
    for tag in TAGS {
        let _ = writeln!(note, "  - {}", tag);
    }
    note.push_str("---\n\n");

    let _ = writeln!(note, "# AI News Digest - {}\n", date.format("%B %d, %Y"));

    note.push_str("## Trend Summary\n\n");
    note.push_str(summary.trim());
    note.push_str("\n\n");

    let _ = writeln!(note, "## Top {} Topics\n", topics.len());

    for (i, topic) in topics.iter().enumerate() {
        let _ = writeln!(note, "### {}. {}\n", i + 1, topic.title);

        if let Some(filename) = &topic.image_filename {
            let _ = writeln!(
                note,
                "![{}]({})\n",
                topic.english_title(),
                image_link(image_prefix, filename)
            );
        }

        let _ = writeln!(
            note,
            "- **Importance**: {} ({}/10)",
            "⭐".repeat(topic.importance as usize),
            topic.importance
        );
        if topic.english_title() != topic.title {
            let _ = writeln!(note, "- **English title**: {}", topic.english_title());
        }
        if !topic.keywords.is_empty() {
            let keywords = topic
                .keywords
                .iter()
                .map(|k| format!("`{}`", k))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(note, "- **Keywords**: {}", keywords);
        }
        note.push('\n');

        if !topic.description.is_empty() {
            note.push_str(&topic.description);
            note.push_str("\n\n");
        }
        note.push_str("---\n\n");
    }

    let _ = writeln!(
        note,
        "*Generated on {} from Reddit AI communities.*",
        date.format("%Y-%m-%d")
    );
    note
}

/// Renders and writes the note, overwriting `output_path`.
pub fn write_markdown(
    topics: &[Topic],
    summary: &str,
    output_path: &Path,
    images_dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, CoreError> {
    let prefix = image_link_prefix(output_path, images_dir);
    let note = render_markdown(topics, summary, &prefix, date);
    write_document(output_path, &note)
}
