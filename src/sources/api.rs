//! Hacker News Firebase API source.
//!
//! Uses the official JSON API:
//!
//! - `GET {api_base}/topstories.json` for the ordered front-page ids
//! - `GET {api_base}/item/{id}.json` for story and comment details
//!
//! Only items of type `story` survive resolving; jobs, polls and comments are
//! dropped. Text submissions (Ask HN and friends) carry their body inline in
//! the `text` field.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::http::{FetchError, get_json};
use crate::models::{Enrichment, StoryListing};
use crate::pacer::Pacer;
use crate::sources::StorySource;
use crate::utils::{item_id_from_url, truncate_for_log};

/// Item detail as returned by `item/{id}.json`.
///
/// Loosely typed where the API is known to be inconsistent (`score`, `time`,
/// `kids`), so one odd field does not throw the whole item away.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub by: Option<String>,
    pub text: Option<String>,
    pub score: Option<Value>,
    pub time: Option<Value>,
    pub kids: Option<Vec<Value>>,
}

impl RawItem {
    /// Id of the first reply, if any.
    pub fn first_kid(&self) -> Option<u64> {
        self.kids.as_ref()?.first()?.as_u64()
    }

    fn points(&self) -> Option<u32> {
        let score = self.score.as_ref()?.as_i64()?;
        u32::try_from(score).ok()
    }

    fn published(&self) -> Option<DateTime<Utc>> {
        let time = self.time.as_ref()?;
        let secs = time.as_i64().or_else(|| time.as_f64().map(|t| t as i64))?;
        DateTime::from_timestamp(secs, 0)
    }
}

/// Source backed by the JSON API.
#[derive(Debug)]
pub struct ApiSource {
    client: Client,
    api_base: String,
    site_base: String,
    pacer: Pacer,
}

impl ApiSource {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        site_base: impl Into<String>,
        pacer: Pacer,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            site_base: site_base.into().trim_end_matches('/').to_string(),
            pacer,
        }
    }

    /// Discussion page on the site for an item id.
    pub fn discussion_url(&self, id: u64) -> String {
        format!("{}/item?id={}", self.site_base, id)
    }

    /// Ids of the current top stories, in front-page order.
    ///
    /// Any failure, including a payload that is not a JSON array, yields an
    /// empty list.
    #[instrument(level = "info", skip(self))]
    pub async fn list_top_story_ids(&self) -> Vec<u64> {
        let url = format!("{}/topstories.json", self.api_base);
        info!(%url, "Loading top story ids");

        let data: Value = match get_json(&self.client, &url).await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Could not load top stories");
                return Vec::new();
            }
        };

        let raw_ids = match data {
            Value::Array(raw_ids) => raw_ids,
            other => {
                warn!(
                    payload = %truncate_for_log(&other.to_string(), 200),
                    "Unexpected response for top stories"
                );
                return Vec::new();
            }
        };

        let ids: Vec<u64> = raw_ids.iter().filter_map(Value::as_u64).collect();
        info!(count = ids.len(), "Loaded top story ids");
        ids
    }

    /// Load one item and build its listing.
    ///
    /// # Arguments
    ///
    /// * `id` - The item id from the top stories list.
    /// * `order` - Position of the id in that list.
    ///
    /// # Returns
    ///
    /// The listing with the raw item for later enrichment, or `None` for
    /// non-stories and on failure.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_story(&self, id: u64, order: usize) -> Option<(StoryListing, RawItem)> {
        let item = self.get_item(id).await?;
        let listing = self.story_from_item(id, order, &item)?;
        Some((listing, item))
    }

    /// Build a listing from already fetched item detail.
    pub fn story_from_item(&self, id: u64, order: usize, item: &RawItem) -> Option<StoryListing> {
        if item.kind.as_deref() != Some("story") {
            debug!(id, kind = ?item.kind, "Skipping non-story item");
            return None;
        }

        let comments_url = self.discussion_url(id);
        let title = item
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Story {id}"));
        let url = item
            .url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| comments_url.clone());

        let mut listing = StoryListing::new(title, url, comments_url, order);
        listing.points = item.points();
        listing.author = item.by.clone();
        listing.published = item.published();
        listing.description = item.text.clone();
        Some(listing)
    }

    /// Fill in the body and first comment of a story.
    ///
    /// Uses `raw` when given, otherwise re-fetches the story by the id in its
    /// discussion URL. Only the first reply is looked at.
    #[instrument(level = "info", skip_all, fields(story = %listing.comments_url))]
    pub async fn enrich_story(&self, listing: &StoryListing, raw: Option<&RawItem>) -> Enrichment {
        let refetched;
        let item = match raw {
            Some(item) => item,
            None => {
                let Some(id) = item_id_from_url(&listing.comments_url) else {
                    debug!("No item id in discussion URL");
                    return Enrichment::default();
                };
                refetched = self.get_item(id).await;
                match refetched.as_ref() {
                    Some(item) => item,
                    None => return Enrichment::default(),
                }
            }
        };

        let mut enrichment = Enrichment {
            description: item.text.clone(),
            top_comment: None,
        };

        let Some(comment_id) = item.first_kid() else {
            debug!("Story has no comments");
            return enrichment;
        };

        if let Some(comment) = self.get_item(comment_id).await {
            enrichment.top_comment = comment.text;
        }
        enrichment
    }

    /// Load any item, logging and swallowing failures.
    async fn get_item(&self, id: u64) -> Option<RawItem> {
        match self.fetch_item(id).await {
            Ok(Some(item)) => Some(item),
            Ok(None) => {
                warn!(id, "Item does not exist");
                None
            }
            Err(e) => {
                warn!(id, error = %e, "Could not load item");
                None
            }
        }
    }

    async fn fetch_item(&self, id: u64) -> Result<Option<RawItem>, FetchError> {
        let url = format!("{}/item/{}.json", self.api_base, id);
        debug!(%url, "Loading item");
        get_json(&self.client, &url).await
    }
}

impl StorySource for ApiSource {
    type Candidate = u64;
    type Raw = RawItem;

    fn name(&self) -> &'static str {
        "api"
    }

    async fn list_candidates(&mut self) -> Vec<u64> {
        self.list_top_story_ids().await
    }

    async fn resolve(&mut self, candidate: u64, order: usize) -> Option<(StoryListing, RawItem)> {
        self.fetch_story(candidate, order).await
    }

    async fn enrich(&mut self, listing: &StoryListing, raw: Option<&RawItem>) -> Enrichment {
        self.enrich_story(listing, raw).await
    }

    fn pacer(&mut self) -> &mut Pacer {
        &mut self.pacer
    }
}
