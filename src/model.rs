//! Canonical data model for an assembled book.
//!
//! The fetch stage produces this shape; the EPUB writer consumes it.

/// Lowercase a title and replace spaces with hyphens.
///
/// Used for the book identifier and for chapter file names.
pub fn slugify(s: &str) -> String {
    s.to_lowercase().replace(' ', "-")
}

/// One fetched article, ready to be written as a chapter document.
#[derive(Debug, Clone)]
pub struct Chapter {
    pub title: String,
    /// 0-based position in the configuration sequence. Missing articles
    /// leave gaps in the numbering instead of shifting later chapters.
    pub index: u32,
    /// Rendered article HTML, embedded verbatim in the chapter document.
    pub body: String,
    /// `{index:03}_{slug}.xhtml`, derived once at construction.
    pub file_name: String,
}

impl Chapter {
    pub fn new(index: u32, title: impl Into<String>, body: impl Into<String>) -> Self {
        let title = title.into();
        let file_name = format!("{:03}_{}.xhtml", index, slugify(&title));
        Chapter {
            title,
            index,
            body: body.into(),
            file_name,
        }
    }
}

/// Cover image bytes plus the archive file name taken from the URL.
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// The assembled book: metadata plus chapters in reading order.
///
/// Spine and table of contents reference exactly `chapters`, with the
/// navigation document always first in the spine.
#[derive(Debug, Clone)]
pub struct Book {
    /// Derived from the title (lowercase, spaces to hyphens), so two runs
    /// with the same configuration carry the same identifier.
    pub identifier: String,
    pub title: String,
    pub author: String,
    pub language: String,
    pub cover: Option<CoverImage>,
    pub chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Book {
            identifier: slugify(&title),
            title,
            author: author.into(),
            language: language.into(),
            cover: None,
            chapters: Vec::new(),
        }
    }
}
