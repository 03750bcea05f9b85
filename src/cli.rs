//! Command-line interface definitions.
//!
//! All arguments can be provided via command-line flags or environment
//! variables.

use std::path::PathBuf;

use clap::Parser;

use crate::pipeline::SortKey;
use crate::sources::SourceKind;

/// Command-line arguments for the feed builder.
///
/// # Examples
///
/// ```sh
/// # Defaults: 15 items, 100+ points, JSON API
/// hn_rss_feed --output feeds/hacker-news.xml
///
/// # Scrape the front page instead, newest first
/// hn_rss_feed --source html --sort-by published --min-points 50
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output path for the generated RSS XML
    #[arg(short, long, env = "HN_RSS_OUTPUT", default_value = "feeds/hacker-news.xml")]
    pub output: PathBuf,

    /// Maximum number of items to include in the feed
    #[arg(long, env = "HN_RSS_MAX_ITEMS", default_value_t = 15)]
    pub max_items: usize,

    /// Minimum number of points required for a story to be included
    #[arg(long, env = "HN_RSS_MIN_POINTS", default_value_t = 100)]
    pub min_points: u32,

    /// Ordering of the feed
    #[arg(long, value_enum, default_value_t = SortKey::Points)]
    pub sort_by: SortKey,

    /// Where stories come from
    #[arg(long, value_enum, env = "HN_RSS_SOURCE", default_value_t = SourceKind::Api)]
    pub source: SourceKind,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "HN_RSS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the delay between enrichment requests, in milliseconds
    #[arg(long)]
    pub pace_ms: Option<u64>,
}
