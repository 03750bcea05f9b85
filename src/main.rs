//! # HN RSS Feed
//!
//! Builds an RSS 2.0 feed of the current Hacker News front page, ranked and
//! filtered by popularity, with each story enriched by its text body and top
//! comment.
//!
//! ## Usage
//!
//! ```sh
//! hn_rss_feed --output feeds/hacker-news.xml --max-items 15 --min-points 100
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Listing**: discover front-page stories (JSON API or scraped HTML)
//! 2. **Resolving**: turn an oversampled prefix of the listing into stories
//! 3. **Ranking**: sort by points or publish time, filter by points
//! 4. **Enriching**: fetch body and top comment, one paced request at a time
//! 5. **Output**: render the RSS document and write it to disk

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dates;
mod feed;
mod http;
mod models;
mod outputs;
mod pacer;
mod pipeline;
mod sources;
mod utils;

use cli::Cli;
use config::Config;
use http::build_client;
use outputs::rss::{render_rss, write_feed};
use pacer::Pacer;
use pipeline::{FeedOptions, build_feed_entries};
use sources::SourceKind;
use sources::api::ApiSource;
use sources::html::HtmlSource;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("hn_rss_feed starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = Config::load(args.config.as_deref()).await?;
    let pace_ms = args.pace_ms.unwrap_or(config.pace_interval_ms);

    // The only fatal pipeline error: no transport, no feed.
    let client = match build_client(&config.http) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Could not construct HTTP client");
            return Err(e.into());
        }
    };

    let options = FeedOptions {
        max_items: args.max_items,
        min_points: args.min_points,
        sort_by: args.sort_by,
    };
    info!(
        source = ?args.source,
        max_items = options.max_items,
        min_points = options.min_points,
        sort_by = ?options.sort_by,
        pace_ms,
        "Building feed"
    );

    let entries = match args.source {
        SourceKind::Api => {
            let mut source = ApiSource::new(
                client,
                config.api_base.as_str(),
                config.site_base.as_str(),
                Pacer::started(pace_ms),
            );
            build_feed_entries(&mut source, &options).await
        }
        SourceKind::Html => {
            let mut source =
                HtmlSource::new(client, config.site_base.as_str(), Pacer::started(pace_ms));
            build_feed_entries(&mut source, &options).await
        }
    };

    let xml = render_rss(&config.feed, &entries)?;
    if let Err(e) = write_feed(&args.output, &xml).await {
        error!(path = %args.output.display(), error = %e, "Failed writing RSS feed");
        return Err(e);
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        items = entries.len(),
        path = %args.output.display(),
        "Execution complete"
    );

    Ok(())
}
