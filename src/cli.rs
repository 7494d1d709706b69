//! CLI parsing and orchestration. Parses args, runs config -> fetch -> EPUB,
//! and maps each stage's error to an exit code.

use crate::book::{collect_chapters, fetch_cover, FetchOptions};
use crate::config::{self, ConfigError};
use crate::epub::{write_epub, EpubError};
use crate::model::Book;
use crate::wiki::{PoliteClient, WikiClient, WikiError, DEFAULT_LANGUAGE};
use clap::Parser;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// CLI error carrying exit code and message.
#[derive(Debug, Error)]
pub enum CliRunError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Wiki(#[from] WikiError),

    #[error("{0}")]
    Epub(#[from] EpubError),
}

impl CliRunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliRunError::InvalidInput(_) | CliRunError::Config(_) => 1,
            CliRunError::Wiki(_) => 2,
            CliRunError::Epub(_) => 3,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "wikipub")]
#[command(about = "Build an EPUB from a TOML list of Wikipedia articles")]
#[command(
    after_help = "Settings file keys (user_agent, request_delay_secs, timeout_secs, language) are read from ./wikipub.toml or $XDG_CONFIG_HOME/wikipub/config.toml. CLI flags override settings."
)]
pub struct Args {
    /// Path to the TOML book configuration file. The output file shares
    /// its name and directory unless -o or -t is given.
    pub conf: PathBuf,

    /// File name and path to save the EPUB file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Alternate title to use for the output file name instead of the one
    /// defined in the configuration file. Does not override the 'output'
    /// option or the in-book metadata.
    #[arg(short, long)]
    pub title: Option<String>,

    /// Wikipedia language edition (overrides settings; default en).
    #[arg(long)]
    pub language: Option<String>,

    /// HTTP User-Agent (overrides settings).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Delay between requests in seconds (overrides settings; default 1).
    #[arg(long)]
    pub delay: Option<u64>,

    /// Request timeout in seconds (overrides settings; default 30).
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Suppress progress output (errors only).
    #[arg(short, long)]
    pub quiet: bool,

    /// Print verbose error chain.
    #[arg(long)]
    pub verbose: bool,
}

/// Output path policy, applied once before assembly: -t wins, then -o
/// verbatim, then `<conf_dir>/<configured title>.epub`.
fn resolve_output_path(
    conf_path: &Path,
    config_title: &str,
    title_flag: Option<&str>,
    output_flag: Option<&Path>,
) -> PathBuf {
    let conf_dir = conf_path.parent().unwrap_or_else(|| Path::new(""));
    if let Some(t) = title_flag {
        conf_dir.join(format!("{}.epub", t))
    } else if let Some(o) = output_flag {
        o.to_path_buf()
    } else {
        conf_dir.join(format!("{}.epub", config_title))
    }
}

/// Ensure output path parent exists; surfaced before any network traffic.
fn validate_output_path(path: &Path) -> Result<(), CliRunError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(CliRunError::InvalidInput(format!(
                "cannot write output: {}: parent directory does not exist",
                path.display()
            )));
        }
    }
    Ok(())
}

/// Entry point for the CLI. Returns Ok(()) on success; Err with exit code and message on failure.
pub fn run(args: &Args) -> Result<(), CliRunError> {
    let conf = config::load_book_config(&args.conf)?;
    let settings = config::load_settings().map_err(CliRunError::InvalidInput)?;

    const DEFAULT_DELAY_SECS: u64 = 1;
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    let delay_secs = args
        .delay
        .or_else(|| settings.as_ref().and_then(|s| s.request_delay_secs))
        .unwrap_or(DEFAULT_DELAY_SECS);
    let timeout_secs = args
        .timeout
        .or_else(|| settings.as_ref().and_then(|s| s.timeout_secs))
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    let user_agent = args
        .user_agent
        .clone()
        .or_else(|| settings.as_ref().and_then(|s| s.user_agent.clone()));
    let language = args
        .language
        .clone()
        .or_else(|| settings.as_ref().and_then(|s| s.language.clone()))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    let output_path = resolve_output_path(
        &args.conf,
        &conf.book.title,
        args.title.as_deref(),
        args.output.as_deref(),
    );
    validate_output_path(&output_path)?;

    let mut builder = PoliteClient::builder()
        .delay_secs(delay_secs)
        .timeout_secs(timeout_secs);
    if let Some(ua) = user_agent {
        builder = builder.user_agent(ua);
    }
    let mut client = builder
        .build()
        .map_err(|e| CliRunError::InvalidInput(format!("failed to create HTTP client: {}", e)))?;

    let mut book = Book::new(&conf.book.title, &conf.book.author, &language);

    if let Some(url) = conf.book.cover_image_url.as_deref() {
        book.cover = fetch_cover(url, &mut client);
    }

    let progress_state: RefCell<Option<indicatif::ProgressBar>> = RefCell::new(None);
    let progress_cb = |n: u32, total: u32| {
        if total == 0 {
            return;
        }
        let mut state = progress_state.borrow_mut();
        let pb = state.get_or_insert_with(|| {
            let bar = indicatif::ProgressBar::new(total as u64);
            bar.set_style(
                indicatif::ProgressStyle::default_bar()
                    .template("{spinner} {msg} [{bar:40}] {pos}/{len} ({elapsed})")
                    .unwrap()
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                    .progress_chars("█▉▊▋▌▍▎▏ "),
            );
            bar.enable_steady_tick(Duration::from_millis(80));
            bar
        });
        pb.set_position(n as u64);
        pb.set_message(format!("Fetching article {}/{}", n, total));
    };
    let progress: Option<&dyn Fn(u32, u32)> = if args.quiet { None } else { Some(&progress_cb) };

    let fetch_opts = FetchOptions {
        progress,
        quiet: args.quiet,
    };
    let mut wiki = WikiClient::new(&language, &mut client);
    book.chapters = collect_chapters(&conf.chapters, &mut wiki, &fetch_opts)?;

    if let Some(pb) = progress_state.borrow_mut().take() {
        pb.disable_steady_tick();
        pb.finish_and_clear();
    }

    if !args.quiet {
        println!("Finishing...");
        println!("Saving...");
    }
    write_epub(&book, &output_path)?;
    if !args.quiet {
        println!("Saved as: {}", output_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_flag_wins_over_output_flag() {
        let path = resolve_output_path(
            Path::new("books/computing.toml"),
            "Pioneers of Computing",
            Some("custom"),
            Some(Path::new("/elsewhere/out.epub")),
        );
        assert_eq!(path, PathBuf::from("books/custom.epub"));
    }

    #[test]
    fn output_flag_used_verbatim_without_title_flag() {
        let path = resolve_output_path(
            Path::new("books/computing.toml"),
            "Pioneers of Computing",
            None,
            Some(Path::new("/elsewhere/out.epub")),
        );
        assert_eq!(path, PathBuf::from("/elsewhere/out.epub"));
    }

    #[test]
    fn default_output_is_configured_title_next_to_conf() {
        let path = resolve_output_path(
            Path::new("books/computing.toml"),
            "Pioneers of Computing",
            None,
            None,
        );
        assert_eq!(path, PathBuf::from("books/Pioneers of Computing.epub"));
    }

    #[test]
    fn default_output_for_bare_conf_path() {
        let path = resolve_output_path(Path::new("computing.toml"), "T", None, None);
        assert_eq!(path, PathBuf::from("T.epub"));
    }

    #[test]
    fn validate_output_path_parent_exists() {
        let path = std::env::temp_dir().join("wikipub_cli_test_output.epub");
        assert!(validate_output_path(&path).is_ok());
    }

    #[test]
    fn validate_output_path_parent_missing() {
        let path = PathBuf::from("/nonexistent_dir_wikipub_xyz/output.epub");
        let result = validate_output_path(&path);
        assert!(result.is_err());
        if let Err(CliRunError::InvalidInput(msg)) = result {
            assert!(msg.contains("parent directory does not exist"));
        }
    }

    #[test]
    fn cli_run_error_exit_codes() {
        assert_eq!(CliRunError::InvalidInput("x".into()).exit_code(), 1);
        assert_eq!(
            CliRunError::Config(ConfigError::Missing {
                path: PathBuf::from("book.toml")
            })
            .exit_code(),
            1
        );
        assert_eq!(
            CliRunError::Wiki(WikiError::HttpStatus {
                status: 502,
                url: "https://en.wikipedia.org/w/api.php".into()
            })
            .exit_code(),
            2
        );
        assert_eq!(
            CliRunError::Epub(EpubError::CreateFile {
                path: PathBuf::from("out.epub"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
            })
            .exit_code(),
            3
        );
    }

    #[test]
    fn missing_config_file_maps_to_exit_one() {
        let args = Args {
            conf: PathBuf::from("/nonexistent_dir_wikipub_xyz/book.toml"),
            output: None,
            title: None,
            language: None,
            user_agent: None,
            delay: None,
            timeout: None,
            quiet: true,
            verbose: false,
        };
        let err = run(&args).unwrap_err();
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("no file at"));
    }
}
