//! Hacker News front-page scraper.
//!
//! Scrapes the rendered pages instead of the API:
//!
//! - `GET {site_base}/front?day=YYYY-MM-DD` for the listing
//! - `GET {site_base}/item?id={id}` for the discussion page of each story
//!
//! # Listing structure
//!
//! Each story occupies two rows of the listing table, followed by a spacer:
//!
//! ```text
//! <tr class="athing" id="123">   title row: rank, title link
//! <tr><td class="subtext">       metadata row: score, user, age
//! <tr class="spacer">
//! ```
//!
//! A story is only emitted once both rows have been seen. A spacer drops a
//! half-read story, as does a second title row arriving before metadata.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::http::get_text;
use crate::models::{Enrichment, StoryListing};
use crate::pacer::Pacer;
use crate::sources::StorySource;

static CONTAINER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["table.itemlist", "#bigbox table"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".titleline > a, a.storylink").unwrap());
static SCORE: Lazy<Selector> = Lazy::new(|| Selector::parse(".score").unwrap());
static AUTHOR: Lazy<Selector> = Lazy::new(|| Selector::parse(".hnuser").unwrap());
static AGE: Lazy<Selector> = Lazy::new(|| Selector::parse(".age").unwrap());
static TOP_TEXT: Lazy<Selector> = Lazy::new(|| Selector::parse(".fatitem .toptext").unwrap());
static FIRST_COMMENT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".comment-tree tr.comtr .commtext").unwrap());

/// Length of the `YYYY-MM-DDTHH:MM:SS` prefix the site puts in age titles.
const ISO_PREFIX_LEN: usize = 19;

/// Source backed by the rendered front page.
#[derive(Debug)]
pub struct HtmlSource {
    client: Client,
    site_base: String,
    pacer: Pacer,
}

impl HtmlSource {
    pub fn new(client: Client, site_base: impl Into<String>, pacer: Pacer) -> Self {
        Self {
            client,
            site_base: site_base.into().trim_end_matches('/').to_string(),
            pacer,
        }
    }

    /// Front page URL for a given day.
    pub fn front_page_url(&self, day: NaiveDate) -> String {
        format!("{}/front?day={}", self.site_base, day.format("%Y-%m-%d"))
    }

    /// Fetch and parse today's front page.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_front_page(&self) -> Vec<StoryListing> {
        let url = self.front_page_url(Local::now().date_naive());
        info!(%url, "Loading front page");

        let body = match get_text(&self.client, &url).await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Could not load front page");
                return Vec::new();
            }
        };

        let stories = parse_front_page(&body, &self.site_base);
        info!(count = stories.len(), "Parsed front page stories");
        stories
    }

    /// Fetch the discussion page of a story and extract body and first comment.
    #[instrument(level = "info", skip_all, fields(story = %listing.comments_url))]
    pub async fn enrich_story(&self, listing: &StoryListing) -> Enrichment {
        match get_text(&self.client, &listing.comments_url).await {
            Ok(body) => parse_discussion(&body),
            Err(e) => {
                warn!(error = %e, "Could not load discussion page");
                Enrichment::default()
            }
        }
    }
}

impl StorySource for HtmlSource {
    type Candidate = StoryListing;
    type Raw = ();

    fn name(&self) -> &'static str {
        "html"
    }

    async fn list_candidates(&mut self) -> Vec<StoryListing> {
        self.fetch_front_page().await
    }

    async fn resolve(&mut self, candidate: StoryListing, _order: usize) -> Option<(StoryListing, ())> {
        Some((candidate, ()))
    }

    async fn enrich(&mut self, listing: &StoryListing, _raw: Option<&()>) -> Enrichment {
        self.enrich_story(listing).await
    }

    fn pacer(&mut self) -> &mut Pacer {
        &mut self.pacer
    }
}

enum RowKind {
    Title,
    Meta,
    Spacer,
    Other,
}

fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn classify(row: &ElementRef<'_>) -> RowKind {
    if has_class(row, "athing") {
        return RowKind::Title;
    }
    if has_class(row, "spacer") {
        return RowKind::Spacer;
    }
    // Only direct cells count; the outer layout rows nest whole tables.
    let has_subtext = row
        .children()
        .filter_map(ElementRef::wrap)
        .any(|td| has_class(&td, "subtext"));
    if has_subtext { RowKind::Meta } else { RowKind::Other }
}

/// Parse the listing table of a front page.
///
/// Rows come in title/meta pairs separated by spacer rows. A title row is only
/// kept once its meta row has been seen.
///
/// # Arguments
///
/// * `html` - The front page markup.
/// * `site_base` - Base URL used for discussion links and relative story links.
///
/// # Returns
///
/// The stories in page order, with `order` set to their position. Empty when
/// the listing table cannot be found.
pub fn parse_front_page(html: &str, site_base: &str) -> Vec<StoryListing> {
    let document = Html::parse_document(html);
    let Some(table) = CONTAINER_SELECTORS
        .iter()
        .find_map(|sel| document.select(sel).next())
    else {
        warn!("Front page has no listing table");
        return Vec::new();
    };
    let base = Url::parse(&format!("{site_base}/")).ok();

    let mut stories = Vec::new();
    let mut pending: Option<StoryListing> = None;

    for row in table.select(&ROW) {
        match classify(&row) {
            RowKind::Title => {
                if let Some(dropped) = pending.take() {
                    debug!(title = %dropped.title, "Title row without metadata; discarding");
                }
                pending = parse_title_row(&row, site_base, base.as_ref());
            }
            RowKind::Meta => {
                if let Some(mut story) = pending.take() {
                    apply_meta_row(&mut story, &row);
                    story.order = stories.len();
                    stories.push(story);
                }
            }
            RowKind::Spacer => {
                if let Some(dropped) = pending.take() {
                    debug!(title = %dropped.title, "Spacer before metadata; discarding");
                }
            }
            RowKind::Other => {}
        }
    }

    stories
}

fn parse_title_row(row: &ElementRef<'_>, site_base: &str, base: Option<&Url>) -> Option<StoryListing> {
    let id = row.value().attr("id")?.trim();
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let link = row.select(&TITLE_LINK).next()?;
    let title = collapse_text(&link);
    if title.is_empty() {
        return None;
    }

    let comments_url = format!("{site_base}/item?id={id}");
    let url = link
        .value()
        .attr("href")
        .and_then(|href| match base {
            Some(base) => base.join(href).ok().map(String::from),
            None => Some(href.to_string()),
        })
        .unwrap_or_else(|| comments_url.clone());

    Some(StoryListing::new(title, url, comments_url, 0))
}

fn apply_meta_row(story: &mut StoryListing, row: &ElementRef<'_>) {
    story.points = row.select(&SCORE).next().and_then(|score| parse_points(&collapse_text(&score)));
    story.author = row
        .select(&AUTHOR)
        .next()
        .map(|a| collapse_text(&a))
        .filter(|a| !a.is_empty());

    story.age_text = row.select(&AGE).next().and_then(|age| {
        age.value()
            .attr("title")
            .map(|t| t.trim().to_string())
            .or_else(|| Some(collapse_text(&age)))
            .filter(|t| !t.is_empty())
    });
    story.published = story.age_text.as_deref().and_then(parse_iso_prefix);
}

/// `"123 points"` / `"1 point"` / `"123"` to a count. Empty or junk is `None`.
fn parse_points(text: &str) -> Option<u32> {
    let text = text.trim();
    let number = text
        .strip_suffix("points")
        .or_else(|| text.strip_suffix("point"))
        .unwrap_or(text)
        .trim();
    number.parse().ok()
}

fn parse_iso_prefix(age: &str) -> Option<DateTime<Utc>> {
    let prefix = age.get(..ISO_PREFIX_LEN)?;
    NaiveDateTime::parse_from_str(prefix, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Extract the story body and the first comment from a discussion page.
pub fn parse_discussion(html: &str) -> Enrichment {
    let document = Html::parse_document(html);

    let description = document
        .select(&TOP_TEXT)
        .next()
        .map(|body| body.inner_html().trim().to_string())
        .filter(|body| !body.is_empty());

    let top_comment = document
        .select(&FIRST_COMMENT)
        .next()
        .map(|comment| collapse_text(&comment))
        .filter(|comment| !comment.is_empty())
        .map(|comment| escape(comment.as_str()).into_owned());

    Enrichment {
        description,
        top_comment,
    }
}

fn collapse_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
