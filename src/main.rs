use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser as _;
use serde::Serialize;
use std::path::PathBuf;

use feedloom::{detect_feed_type, ParseOptions, ParsedFeed, Parser};

/// SEC-013: Refuse to slurp arbitrarily large inputs into memory.
const MAX_INPUT_SIZE: u64 = 64 * 1024 * 1024;

#[derive(clap::Parser, Debug)]
#[command(name = "feedloom", about = "Parse an RSS or Atom feed and print it as JSON")]
struct Args {
    /// Feed document to parse
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Only print the detected feed type
    #[arg(long)]
    detect: bool,

    /// Skip unknown elements instead of capturing them
    #[arg(long)]
    skip_unknown: bool,

    /// TOML file with parse options
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Character set of the document, overriding the XML declaration
    #[arg(long, value_name = "LABEL")]
    charset: Option<String>,

    /// Print the complete format-specific tree instead of a summary
    #[arg(long)]
    tree: bool,
}

/// Compact view of a parsed feed.
#[derive(Debug, Serialize)]
struct Summary<'a> {
    format: String,
    version: &'a str,
    title: &'a str,
    link: Option<&'a str>,
    updated: Option<DateTime<Utc>>,
    items: Vec<ItemSummary<'a>>,
}

#[derive(Debug, Serialize)]
struct ItemSummary<'a> {
    title: &'a str,
    link: Option<&'a str>,
    published: Option<DateTime<Utc>>,
}

impl<'a> Summary<'a> {
    fn of(feed: &'a ParsedFeed) -> Option<Self> {
        let format = feed.feed_type().to_string();
        match feed {
            ParsedFeed::Rss(feed) => Some(Self {
                format,
                version: &feed.version,
                title: feed.title(),
                link: feed.link(),
                updated: feed.updated_parsed(),
                items: feed
                    .items
                    .iter()
                    .map(|item| ItemSummary {
                        title: item.title(),
                        link: item.link(),
                        published: item.published_parsed(),
                    })
                    .collect(),
            }),
            ParsedFeed::Atom(feed) => Some(Self {
                format,
                version: &feed.version,
                title: &feed.title,
                link: feed.link(),
                updated: feed.updated_parsed,
                items: feed
                    .entries
                    .iter()
                    .map(|entry| ItemSummary {
                        title: &entry.title,
                        link: entry.link(),
                        published: entry.published_or_updated_parsed(),
                    })
                    .collect(),
            }),
            ParsedFeed::Json(_) => None,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut options = match &args.config {
        Some(path) => ParseOptions::load(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => ParseOptions::default(),
    };
    if args.skip_unknown {
        options = options.with_skip_unknown_elements(true);
    }

    let metadata = std::fs::metadata(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", args.file.display());
    }
    if metadata.len() > MAX_INPUT_SIZE {
        anyhow::bail!(
            "{} is {} bytes (max {} bytes)",
            args.file.display(),
            metadata.len(),
            MAX_INPUT_SIZE
        );
    }
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    if args.detect {
        println!("{}", detect_feed_type(&bytes));
        return Ok(());
    }

    let full_tree = args.tree || options.keep_original_tree;
    let parser = Parser::new(options);
    let feed = parser
        .parse_with_charset(&bytes, args.charset.as_deref())
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;
    tracing::debug!(format = %feed.feed_type(), "parsed feed");

    let json = match Summary::of(&feed) {
        Some(summary) if !full_tree => serde_json::to_string_pretty(&summary),
        _ => serde_json::to_string_pretty(&feed),
    }
    .context("Failed to serialize feed")?;
    println!("{json}");
    Ok(())
}
