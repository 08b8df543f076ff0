//! Text rendering of gallery records for the CLI and the browser

use crate::api::{ImageDetail, ImageSummary};
use crate::config::Config;
use chrono::{DateTime, Utc};

/// Tags shown on a card before collapsing the rest into "+N more".
pub const CARD_TAG_LIMIT: usize = 3;

/// Descriptions longer than this are cut on cards.
pub const CARD_DESCRIPTION_CHARS: usize = 60;

/// Up to three tags, then a "+N more" marker for the remainder.
pub fn tag_chips(tags: &[String]) -> Vec<String> {
    let mut chips: Vec<String> = tags.iter().take(CARD_TAG_LIMIT).cloned().collect();
    if tags.len() > CARD_TAG_LIMIT {
        chips.push(format!("+{} more", tags.len() - CARD_TAG_LIMIT));
    }
    chips
}

pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

/// One-line card for list output.
pub fn card_line(image: &ImageSummary) -> String {
    let mut line = format!("{:<8}  {}  {}", image.id, format_date(&image.created_at), image.title);
    if let Some(description) = image.description.as_deref().filter(|d| !d.trim().is_empty()) {
        line.push_str(&format!(" - {}", clip(description, CARD_DESCRIPTION_CHARS)));
    }
    if image.featured {
        line.push_str("  [featured]");
    }
    if let Some(category) = image.category.as_deref().filter(|c| !c.is_empty()) {
        line.push_str(&format!("  ({})", category));
    }
    let chips = tag_chips(&image.tags);
    if !chips.is_empty() {
        line.push_str(&format!("  #{}", chips.join(" #")));
    }
    line
}

/// Full record as label/value rows.
pub fn detail_rows(image: &ImageDetail, config: &Config) -> Vec<(&'static str, String)> {
    let s = &image.summary;
    let mut rows = vec![
        ("id", s.id.clone()),
        ("title", s.title.clone()),
    ];
    if let Some(description) = s.description.as_deref().filter(|d| !d.is_empty()) {
        rows.push(("description", description.to_string()));
    }
    if let Some(category) = s.category.as_deref().filter(|c| !c.is_empty()) {
        rows.push(("category", category.to_string()));
    }
    if !s.tags.is_empty() {
        rows.push(("tags", s.tags.join(", ")));
    }
    rows.push((
        "featured",
        if s.featured { "Featured" } else { "Not Featured" }.to_string(),
    ));
    rows.push(("uploaded", format_date(&s.created_at)));
    if !image.original_name.is_empty() {
        rows.push(("file", image.original_name.clone()));
    }
    if !image.mime_type.is_empty() {
        rows.push(("type", image.mime_type.clone()));
    }
    if let Some(size) = s.file_size {
        rows.push(("size", format_size(size)));
    }
    rows.push(("url", config.image_url(&s.image_path)));
    rows
}
