//! Book configuration (required, per run) and optional app settings.
//! Settings search order: ./wikipub.toml, then
//! $XDG_CONFIG_HOME/wikipub/config.toml (or ~/.config/wikipub/config.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading the book configuration file. Fatal; mapped to exit code 1.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no file at \"{path}\"")]
    Missing { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// The `[book]` table: metadata plus the optional cover URL.
#[derive(Debug, Clone, Deserialize)]
pub struct BookMeta {
    pub title: String,
    pub author: String,
    pub cover_image_url: Option<String>,
}

/// One `[[chapters]]` entry. Order in the file is the reading order.
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterEntry {
    pub title: String,
}

/// Parsed book configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct BookConfig {
    pub book: BookMeta,
    #[serde(default)]
    pub chapters: Vec<ChapterEntry>,
}

/// Load and parse the book configuration at `path`.
///
/// Required keys (`book.title`, `book.author`, `chapters[].title`) are
/// enforced by deserialization; a missing key is a `Parse` error. No
/// defaults are substituted on failure.
pub fn load_book_config(path: &Path) -> Result<BookConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    toml::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// App settings file contents. All fields optional; only present keys
/// override defaults. CLI flags override both.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Settings {
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Delay in seconds between requests.
    pub request_delay_secs: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Wikipedia language edition (e.g. "en", "de"). Also used as the
    /// book's dc:language.
    pub language: Option<String>,
}

/// Search order: (1) ./wikipub.toml, (2) $XDG_CONFIG_HOME/wikipub/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_settings() -> Result<Option<Settings>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("cannot determine current directory: {}", e))?;
    let mut paths = vec![cwd.join("wikipub.toml")];
    if let Some(d) = dirs::config_dir() {
        paths.push(d.join("wikipub").join("config.toml"));
    }
    for path in &paths {
        if path.exists() {
            let s = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read settings {}: {}", path.display(), e))?;
            let settings: Settings = toml::from_str(&s)
                .map_err(|e| format!("invalid settings {}: {}", path.display(), e))?;
            return Ok(Some(settings));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [book]
        title = "Pioneers of Computing"
        author = "wikipub"
        cover_image_url = "https://upload.example.org/covers/babbage.jpg"

        [[chapters]]
        title = "Ada Lovelace"

        [[chapters]]
        title = "Alan Turing"
    "#;

    #[test]
    fn parse_full_book_config() {
        let c: BookConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(c.book.title, "Pioneers of Computing");
        assert_eq!(c.book.author, "wikipub");
        assert_eq!(
            c.book.cover_image_url.as_deref(),
            Some("https://upload.example.org/covers/babbage.jpg")
        );
        assert_eq!(c.chapters.len(), 2);
        assert_eq!(c.chapters[0].title, "Ada Lovelace");
        assert_eq!(c.chapters[1].title, "Alan Turing");
    }

    #[test]
    fn parse_book_config_without_cover() {
        let s = r#"
            [book]
            title = "T"
            author = "A"

            [[chapters]]
            title = "Only"
        "#;
        let c: BookConfig = toml::from_str(s).unwrap();
        assert!(c.book.cover_image_url.is_none());
        assert_eq!(c.chapters.len(), 1);
    }

    #[test]
    fn parse_book_config_without_chapters_is_empty() {
        let s = r#"
            [book]
            title = "T"
            author = "A"
        "#;
        let c: BookConfig = toml::from_str(s).unwrap();
        assert!(c.chapters.is_empty());
    }

    #[test]
    fn parse_book_config_missing_author_errors() {
        let s = r#"
            [book]
            title = "T"
        "#;
        assert!(toml::from_str::<BookConfig>(s).is_err());
    }

    #[test]
    fn parse_book_config_chapter_missing_title_errors() {
        let s = r#"
            [book]
            title = "T"
            author = "A"

            [[chapters]]
        "#;
        assert!(toml::from_str::<BookConfig>(s).is_err());
    }

    #[test]
    fn load_book_config_missing_file() {
        let path = PathBuf::from("/nonexistent_dir_wikipub_xyz/book.toml");
        let result = load_book_config(&path);
        match result {
            Err(ConfigError::Missing { path: p }) => assert_eq!(p, path),
            other => panic!("expected Missing, got {:?}", other),
        }
    }

    #[test]
    fn load_book_config_invalid_toml() {
        let path = std::env::temp_dir().join("wikipub_config_test_invalid.toml");
        std::fs::write(&path, "book = [").unwrap();
        let result = load_book_config(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_book_config_valid_file() {
        let path = std::env::temp_dir().join("wikipub_config_test_valid.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let c = load_book_config(&path).unwrap();
        assert_eq!(c.book.title, "Pioneers of Computing");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn parse_empty_settings() {
        let s: Settings = toml::from_str("").unwrap();
        assert!(s.user_agent.is_none());
        assert!(s.request_delay_secs.is_none());
        assert!(s.timeout_secs.is_none());
        assert!(s.language.is_none());
    }

    #[test]
    fn parse_full_settings() {
        let s = r#"
            user_agent = "Custom/1.0"
            request_delay_secs = 2
            timeout_secs = 60
            language = "de"
        "#;
        let s: Settings = toml::from_str(s).unwrap();
        assert_eq!(s.user_agent.as_deref(), Some("Custom/1.0"));
        assert_eq!(s.request_delay_secs, Some(2));
        assert_eq!(s.timeout_secs, Some(60));
        assert_eq!(s.language.as_deref(), Some("de"));
    }

    #[test]
    fn parse_partial_settings() {
        let s: Settings = toml::from_str("language = \"fr\"").unwrap();
        assert_eq!(s.language.as_deref(), Some("fr"));
        assert!(s.user_agent.is_none());
    }

    #[test]
    fn invalid_settings_toml_errors() {
        assert!(toml::from_str::<Settings>("language = [").is_err());
    }
}
