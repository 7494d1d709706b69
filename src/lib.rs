//! wikipub: build an EPUB from a TOML list of Wikipedia articles.

pub mod book;
pub mod cli;
pub mod config;
pub mod epub;
pub mod model;
pub mod wiki;

// Re-exports for CLI and consumers.
pub use config::{load_book_config, BookConfig, ConfigError};
pub use epub::{write_epub, EpubError};
pub use model::{Book, Chapter, CoverImage};
pub use wiki::{PoliteClient, PoliteClientBuilder, WikiClient, WikiError};
