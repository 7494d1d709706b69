//! Fetch stage: turns configuration entries into chapters and an optional cover.

use crate::config::ChapterEntry;
use crate::model::{Chapter, CoverImage};
use crate::wiki::{PoliteClient, WikiClient, WikiError};

/// Options for the fetch loop.
pub struct FetchOptions<'a> {
    /// Called with (1-based position, total configured entries) before each query.
    pub progress: Option<&'a dyn Fn(u32, u32)>,
    /// Suppress the per-article `Processing:` lines.
    pub quiet: bool,
}

/// Resolve each configured entry against the wiki, in order.
///
/// Missing articles are skipped silently and leave a gap in the chapter
/// numbering; any API failure aborts the loop. Each article actually
/// processed emits a `Processing:` line on stdout.
pub fn collect_chapters(
    entries: &[ChapterEntry],
    wiki: &mut WikiClient<'_>,
    options: &FetchOptions<'_>,
) -> Result<Vec<Chapter>, WikiError> {
    let total = entries.len() as u32;
    let mut chapters = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        if let Some(cb) = options.progress {
            cb(idx as u32 + 1, total);
        }
        let Some(article) = wiki.fetch_article(&entry.title)? else {
            continue;
        };
        if !options.quiet {
            println!("Processing: {}", entry.title);
        }
        chapters.push(Chapter::new(idx as u32, &entry.title, article.html));
    }
    Ok(chapters)
}

/// Single GET for the configured cover image.
///
/// Only an HTTP 200 response attaches a cover; anything else warns on
/// stderr and leaves the book without one. The run continues either way.
pub fn fetch_cover(url: &str, http: &mut PoliteClient) -> Option<CoverImage> {
    let response = match http.get(url) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("warning: cover image could not be fetched ({}): {}", url, e);
            return None;
        }
    };
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        eprintln!(
            "warning: cover image could not be fetched (HTTP {}): {}",
            status.as_u16(),
            url
        );
        return None;
    }
    let data = match response.bytes() {
        Ok(b) => b.to_vec(),
        Err(e) => {
            eprintln!("warning: cover image could not be read ({}): {}", url, e);
            return None;
        }
    };
    Some(CoverImage {
        file_name: cover_file_name(url),
        data,
    })
}

/// Final path segment of the cover URL, without query or fragment.
/// Falls back to `cover` when the URL has no usable segment.
fn cover_file_name(url: &str) -> String {
    let tail = url.rsplit('/').next().unwrap_or("");
    let tail = tail.split(['?', '#']).next().unwrap_or(tail);
    if tail.is_empty() {
        "cover".to_string()
    } else {
        tail.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_file_name_takes_last_segment() {
        assert_eq!(
            cover_file_name("https://upload.example.org/covers/babbage.jpg"),
            "babbage.jpg"
        );
    }

    #[test]
    fn cover_file_name_strips_query() {
        assert_eq!(
            cover_file_name("https://example.org/img/cover.png?width=600"),
            "cover.png"
        );
    }

    #[test]
    fn cover_file_name_trailing_slash_falls_back() {
        assert_eq!(cover_file_name("https://example.org/img/"), "cover");
    }

    #[test]
    fn chapter_indices_follow_configuration_positions() {
        // The fetch loop passes the configuration position, not the count of
        // fetched chapters, so a skipped entry leaves a gap in numbering.
        let ch = Chapter::new(2, "Early Life", "<p>x</p>");
        assert_eq!(ch.file_name, "002_early-life.xhtml");
    }
}
