//! EPUB writer. Consumes an assembled `Book` and writes the container
//! (mimetype, container.xml, OPF, nav.xhtml, toc.ncx, chapter documents, cover image).

use crate::model::{Book, CoverImage};
use std::io::{Seek, Write};
use std::path::Path;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTAINER_XML: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<container version=\"1.0\" xmlns=\"urn:oasis:names:tc:opendocument:xmlns:container\">\n  <rootfiles>\n    <rootfile full-path=\"OEBPS/content.opf\" media-type=\"application/oebps-package+xml\"/>\n  </rootfiles>\n</container>";

const MIMETYPE: &[u8] = b"application/epub+zip";
const OEBPS_PREFIX: &str = "OEBPS/";

/// Recorded as a second dc:creator so readers can tell generated books apart.
const GENERATOR: &str = "Created with wikipub";

/// Errors from the EPUB writer. Mapped to CLI exit code 3.
#[derive(Debug, Error)]
pub enum EpubError {
    #[error("failed to create EPUB file: {path}: {source}")]
    CreateFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write EPUB archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<std::io::Error> for EpubError {
    fn from(e: std::io::Error) -> Self {
        EpubError::Zip(zip::result::ZipError::Io(e))
    }
}

/// Write an assembled [Book](crate::model::Book) to an EPUB 3 file.
///
/// The spine is the navigation document followed by every chapter in
/// order; the cover image (when present) is manifest-only. An existing
/// file at `path` is overwritten.
pub fn write_epub(book: &Book, path: &Path) -> Result<(), EpubError> {
    let path = path.to_path_buf();
    let file = std::fs::File::create(&path).map_err(|e| EpubError::CreateFile {
        path: path.clone(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(file);

    let options_stored = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .unix_permissions(0o644);
    let options_deflate = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    // Mimetype first, uncompressed (required by the EPUB spec)
    zip.start_file("mimetype", options_stored)?;
    zip.write_all(MIMETYPE)?;

    zip.start_file("META-INF/container.xml", options_deflate)?;
    zip.write_all(CONTAINER_XML)?;

    write_opf(book, &mut zip, options_deflate)?;
    write_nav_xhtml(book, &mut zip, options_deflate)?;
    write_ncx(book, &mut zip, options_deflate)?;
    write_chapters(book, &mut zip, options_deflate)?;

    if let Some(cover) = &book.cover {
        zip.start_file(format!("{}{}", OEBPS_PREFIX, cover.file_name), options_deflate)?;
        zip.write_all(&cover.data)?;
    }

    zip.finish()?;
    Ok(())
}

/// Media type from the cover file extension. Unknown extensions are
/// treated as JPEG, the common case for encyclopedia cover art.
fn cover_media_type(cover: &CoverImage) -> &'static str {
    let name = cover.file_name.to_lowercase();
    if name.ends_with(".png") {
        "image/png"
    } else if name.ends_with(".gif") {
        "image/gif"
    } else if name.ends_with(".svg") {
        "image/svg+xml"
    } else {
        "image/jpeg"
    }
}

fn write_opf(
    book: &Book,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let id = xml_escape(&book.identifier);
    let title = xml_escape(&book.title);
    let creator = xml_escape(&book.author);
    let language = xml_escape(&book.language);

    let mut metadata = format!(
        r#"    <dc:identifier id="book-id">{id}</dc:identifier>
    <dc:title>{title}</dc:title>
    <dc:creator>{creator}</dc:creator>
    <dc:creator>{generator}</dc:creator>
    <dc:language>{language}</dc:language>
"#,
        id = id,
        title = title,
        creator = creator,
        generator = GENERATOR,
        language = language
    );
    if book.cover.is_some() {
        metadata.push_str("    <meta name=\"cover\" content=\"cover-img\"/>\n");
    }

    let mut manifest = String::from(
        r#"<item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
  <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
"#,
    );
    if let Some(cover) = &book.cover {
        manifest.push_str(&format!(
            r#"  <item id="cover-img" href="{}" media-type="{}" properties="cover-image"/>
"#,
            xml_escape(&cover.file_name),
            cover_media_type(cover)
        ));
    }
    for (i, ch) in book.chapters.iter().enumerate() {
        manifest.push_str(&format!(
            r#"  <item id="chapter-{}" href="{}" media-type="application/xhtml+xml"/>
"#,
            i + 1,
            xml_escape(&ch.file_name)
        ));
    }

    // Spine: nav always first, then every fetched chapter in order.
    let mut spine = String::from(r#"  <itemref idref="nav"/>"#);
    for (i, _) in book.chapters.iter().enumerate() {
        spine.push_str(&format!("\n  <itemref idref=\"chapter-{}\"/>", i + 1));
    }

    let opf = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" unique-identifier="book-id" version="3.0"
  xmlns:dc="http://purl.org/dc/elements/1.1/">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
{metadata}  </metadata>
  <manifest>
  {manifest}</manifest>
  <spine toc="ncx">
{spine}
  </spine>
</package>
"#,
        metadata = metadata,
        manifest = manifest,
        spine = spine
    );

    zip.start_file(format!("{}content.opf", OEBPS_PREFIX), options)?;
    zip.write_all(opf.as_bytes())?;
    Ok(())
}

fn write_nav_xhtml(
    book: &Book,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let mut nav_links = String::new();
    for ch in &book.chapters {
        nav_links.push_str(&format!(
            r#"    <li><a href="{}">{}</a></li>
"#,
            html_escape_attr(&ch.file_name),
            html_escape_attr(&ch.title)
        ));
    }
    let nav = format!(
        r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <meta charset="UTF-8"/>
  <title>Table of Contents</title>
</head>
<body>
  <nav epub:type="toc">
    <h1>Contents</h1>
    <ol>
{}
    </ol>
  </nav>
</body>
</html>
"#,
        nav_links
    );
    zip.start_file(format!("{}nav.xhtml", OEBPS_PREFIX), options)?;
    zip.write_all(nav.as_bytes())?;
    Ok(())
}

fn write_ncx(
    book: &Book,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    let title = xml_escape(&book.title);
    let mut nav_points = String::new();
    for (i, ch) in book.chapters.iter().enumerate() {
        nav_points.push_str(&format!(
            r#"    <navPoint id="navpoint-{}" playOrder="{}">
      <navLabel><text>{}</text></navLabel>
      <content src="{}"/>
    </navPoint>
"#,
            i + 1,
            i + 1,
            xml_escape(&ch.title),
            xml_escape(&ch.file_name)
        ));
    }
    let ncx = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{}"/>
  </head>
  <docTitle>
    <text>{}</text>
  </docTitle>
  <navMap>
{}
  </navMap>
</ncx>
"#,
        xml_escape(&book.identifier),
        title,
        nav_points
    );
    zip.start_file(format!("{}toc.ncx", OEBPS_PREFIX), options)?;
    zip.write_all(ncx.as_bytes())?;
    Ok(())
}

/// One XHTML document per chapter, named by `Chapter::file_name`, with the
/// fetched article HTML embedded verbatim.
fn write_chapters(
    book: &Book,
    zip: &mut ZipWriter<impl Write + Seek>,
    options: SimpleFileOptions,
) -> Result<(), EpubError> {
    for ch in &book.chapters {
        let html = format!(
            r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
  <meta charset="UTF-8"/>
  <title>{}</title>
</head>
<body>
  <h1>{}</h1>
{}
</body>
</html>
"#,
            html_escape_attr(&ch.title),
            html_escape_attr(&ch.title),
            ch.body
        );
        zip.start_file(format!("{}{}", OEBPS_PREFIX, ch.file_name), options)?;
        zip.write_all(html.as_bytes())?;
    }
    Ok(())
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn html_escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
