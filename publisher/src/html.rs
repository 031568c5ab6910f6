use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use trendcast_core::{CoreError, Topic, MAX_IMPORTANCE};

use crate::{image_link, image_link_prefix, write_document};

const DESCRIPTION_PREVIEW_CHARS: usize = 150;
const MAX_KEYWORD_CHIPS: usize = 5;

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: linear-gradient(135deg, #1a1a2e 0%, #16213e 50%, #0f3460 100%);
            min-height: 100vh;
            color: #e0e0e0;
            padding: 20px;
        }
        .container { max-width: 1400px; margin: 0 auto; }
        header { text-align: center; padding: 40px 20px; margin-bottom: 30px; }
        h1 { font-size: 2.5rem; color: #00d4ff; margin-bottom: 10px; }
        .subtitle { color: #888; font-size: 1rem; }
        .summary-section {
            background: rgba(255, 255, 255, 0.05);
            border-radius: 16px;
            padding: 30px;
            margin-bottom: 40px;
            border: 1px solid rgba(255, 255, 255, 0.1);
        }
        .summary-section h2, .grid-section h2 { color: #00d4ff; margin-bottom: 20px; font-size: 1.5rem; }
        .summary-section p { line-height: 1.8; margin-bottom: 15px; color: #ccc; }
        .grid {
            display: grid;
            grid-template-columns: repeat(auto-fill, minmax(320px, 1fr));
            gap: 25px;
        }
        .card {
            background: rgba(255, 255, 255, 0.05);
            border-radius: 16px;
            overflow: hidden;
            border: 1px solid rgba(255, 255, 255, 0.1);
        }
        .card-image { width: 100%; height: 200px; overflow: hidden; background: rgba(0, 0, 0, 0.2); }
        .card-image img { width: 100%; height: 100%; object-fit: cover; }
        .card-image .placeholder {
            width: 100%; height: 100%;
            display: flex; align-items: center; justify-content: center;
            color: #666; font-size: 0.9rem;
        }
        .card-content { padding: 20px; }
        .card-content h3 { color: #fff; font-size: 1.1rem; margin-bottom: 10px; line-height: 1.4; }
        .importance { margin-bottom: 10px; font-size: 0.9rem; }
        .card-content p { color: #aaa; font-size: 0.9rem; line-height: 1.6; margin-bottom: 15px; }
        .keywords { display: flex; flex-wrap: wrap; gap: 8px; }
        .keyword {
            background: rgba(0, 212, 255, 0.15);
            color: #00d4ff;
            padding: 4px 10px;
            border-radius: 20px;
            font-size: 0.75rem;
        }
        footer { text-align: center; padding: 40px 20px; color: #666; font-size: 0.85rem; }
        @media (max-width: 768px) {
            h1 { font-size: 1.8rem; }
            .grid { grid-template-columns: 1fr; }
            .summary-section { padding: 20px; }
        }
"#;

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn preview(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_PREVIEW_CHARS {
        let cut: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
        format!("{}...", escape_html(&cut))
    } else {
        escape_html(description)
    }
}

fn summary_paragraphs(summary: &str) -> String {
    summary
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p)))
        .collect::<Vec<_>>()
        .join("\n            ")
}

fn render_card(out: &mut String, index: usize, topic: &Topic, image_prefix: &str) {
    let title = escape_html(&topic.title);

    let image = match &topic.image_filename {
        Some(filename) => format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            escape_html(&image_link(image_prefix, filename)),
            title
        ),
        None => r#"<div class="placeholder">No image</div>"#.to_string(),
    };

    let stars = "⭐".repeat(topic.importance.min(MAX_IMPORTANCE) as usize);
    let keywords = topic
        .keywords
        .iter()
        .take(MAX_KEYWORD_CHIPS)
        .map(|k| format!(r#"<span class="keyword">{}</span>"#, escape_html(k)))
        .collect::<Vec<_>>()
        .join(" ");

    let _ = write!(
        out,
        r#"
                <div class="card">
                    <div class="card-image">{image}</div>
                    <div class="card-content">
                        <h3>{n}. {title}</h3>
                        <div class="importance" title="{importance}/10">{stars}</div>
                        <p>{description}</p>
                        <div class="keywords">{keywords}</div>
                    </div>
                </div>"#,
        n = index + 1,
        importance = topic.importance,
        description = preview(&topic.description),
    );
}

/// Renders the digest as a standalone page with a responsive card grid.
pub fn render_html(topics: &[Topic], summary: &str, image_prefix: &str, date: NaiveDate) -> String {
    let date_display = date.format("%B %d, %Y").to_string();

    let mut cards = String::new();
    for (i, topic) in topics.iter().enumerate() {
        render_card(&mut cards, i, topic, image_prefix);
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AI News Digest - {date_display}</title>
    <style>{STYLE}    </style>
</head>
<body>
    <div class="container">
        <header>
            <h1>AI News Digest</h1>
            <p class="subtitle">{date_display} · Generated from Reddit AI communities</p>
        </header>

        <section class="summary-section">
            <h2>Trend Summary</h2>
            {summary}
        </section>

        <section class="grid-section">
            <h2>Top {count} Topics</h2>
            <div class="grid">{cards}
            </div>
        </section>

        <footer>
            <p>Generated by trendcast · Claude API + Replicate</p>
        </footer>
    </div>
</body>
</html>
"#,
        summary = summary_paragraphs(summary),
        count = topics.len(),
    )
}

/// Renders and writes the page, overwriting `output_path`.
pub fn write_html(
    topics: &[Topic],
    summary: &str,
    output_path: &Path,
    images_dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, CoreError> {
    let prefix = image_link_prefix(output_path, images_dir);
    let page = render_html(topics, summary, &prefix, date);
    write_document(output_path, &page)
}
