use regex::{Regex, RegexBuilder};

/// Words-per-minute figure used for the reading time estimate.
const READING_SPEED_WPM: u32 = 200;

#[derive(Debug, Clone)]
pub(crate) struct PostMeta {
    pub title: String,
    pub description: String,
    /// Estimated reading time in minutes, always at least 1.
    pub reading_time: u32,
}

/// Parses the pandoc-style metadata block at the top of a post.
///
/// Returns `None` when the document does not start with a `---`-delimited
/// header; that is an absence signal, not an error, and the caller skips the
/// document. The first `title:`/`description:` line wins; values are trimmed
/// and stripped of surrounding quotes. The reading time is derived from the
/// word count of everything after the closing marker.
pub(crate) fn parse_front_matter(content: &str) -> Option<PostMeta> {
    let header_pattern = RegexBuilder::new(r"^---\r?\n(.*?)\r?\n---\r?\n(.*)")
        .dot_matches_new_line(true)
        .build()
        .unwrap();
    let caps = header_pattern.captures(content)?;
    let header = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());

    let mut title: Option<String> = None;
    let mut description: Option<String> = None;
    for line in header.lines() {
        if let Some(value) = line.strip_prefix("title:") {
            if title.is_none() {
                title = Some(unquote(value));
            }
        } else if let Some(value) = line.strip_prefix("description:") {
            if description.is_none() {
                description = Some(unquote(value));
            }
        }
    }

    Some(PostMeta {
        title: title.unwrap_or_default(),
        description: description.unwrap_or_default(),
        reading_time: reading_time(body),
    })
}

fn unquote(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

fn reading_time(body: &str) -> u32 {
    let word_pattern = Regex::new(r"\w+").unwrap();
    let word_count = word_pattern.find_iter(body).count() as u32;
    word_count.div_ceil(READING_SPEED_WPM).max(1)
}
