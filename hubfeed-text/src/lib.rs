use chrono::{DateTime, Local, Utc};
use lazy_static::lazy_static;
use regex::Regex;

/// Paragraph separator used when joining multi-paragraph descriptions.
pub const PARAGRAPH_SEPARATOR: &str = "<br><br>";

/// Fallback age string for timestamps that fail to parse.
pub const FALLBACK_AGE: &str = "Recently";

pub fn parse_timestamp(iso: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(iso)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Maps an ISO-8601 timestamp to a relative-age string ("2h ago").
///
/// Buckets: under a minute is "Just now", then minutes, hours, days,
/// and anything a week or older becomes an absolute date. An invalid
/// or empty timestamp yields "Recently" rather than an error.
pub fn time_ago(iso: &str) -> String {
    time_ago_at(iso, Utc::now())
}

pub fn time_ago_at(iso: &str, now: DateTime<Utc>) -> String {
    let created = match parse_timestamp(iso) {
        Some(created) => created,
        None => return FALLBACK_AGE.to_string(),
    };

    let elapsed = now.signed_duration_since(created);
    let minutes = elapsed.num_minutes();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 60 * 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if minutes < 60 * 24 * 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        created.with_timezone(&Local).format("%b %-d, %Y").to_string()
    }
}

/// Strips HTML tags from a text fragment, leaving plain text.
pub fn strip_html(text: &str) -> String {
    lazy_static! {
        static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    }
    TAG_RE.replace_all(text, "").to_string()
}

/// Joins description paragraphs into one plain-text block, stripping
/// markup from each paragraph first. Empty input joins to an empty string.
pub fn join_paragraphs(paragraphs: &[String]) -> String {
    paragraphs
        .iter()
        .map(|paragraph| strip_html(paragraph))
        .collect::<Vec<String>>()
        .join(PARAGRAPH_SEPARATOR)
}
