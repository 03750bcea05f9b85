//! Data models for front-page stories and the feed entries built from them.
//!
//! This module defines the records that flow through the pipeline:
//! - [`StoryListing`]: one story as parsed from a listing source, never mutated
//! - [`Enrichment`]: what the per-story secondary fetch adds
//! - [`StoryRecord`]: the merged, enriched story handed to the feed mapper
//! - [`FeedEntry`] / [`FeedMetadata`]: the shapes consumed by the RSS writer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::parse_human_date;

/// A story exactly as the listing step produced it.
///
/// `title`, `url`, `comments_url` and `order` are always populated. `order` is
/// the zero-based rank in the source listing and is fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryListing {
    /// Story headline.
    pub title: String,
    /// External link, or the discussion page when the story has none.
    pub url: String,
    /// Discussion page on the site itself.
    pub comments_url: String,
    /// Rank in the source listing.
    pub order: usize,
    pub points: Option<u32>,
    pub author: Option<String>,
    /// Free-form age text as shown by the source ("3 hours ago", ISO stamps, ...).
    pub age_text: Option<String>,
    /// Absolute timestamp set directly by the source.
    pub published: Option<DateTime<Utc>>,
    /// Inline body, when the listing source already carries one.
    pub description: Option<String>,
}

impl StoryListing {
    /// Build a listing with only the required fields set.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        comments_url: impl Into<String>,
        order: usize,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            comments_url: comments_url.into(),
            order,
            points: None,
            author: None,
            age_text: None,
            published: None,
            description: None,
        }
    }

    /// The best timestamp known for this story: the source's own value first,
    /// then whatever can be read out of the age text.
    pub fn resolved_published(&self) -> Option<DateTime<Utc>> {
        self.published
            .or_else(|| parse_human_date(self.age_text.as_deref()))
    }
}

/// Data gathered by the enrichment fetch for one story.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    /// Story body (HTML fragment).
    pub description: Option<String>,
    /// First comment of the discussion (HTML fragment).
    pub top_comment: Option<String>,
}

/// A fully enriched story, ready to be mapped to a [`FeedEntry`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoryRecord {
    pub title: String,
    pub url: String,
    pub comments_url: String,
    pub order: usize,
    pub points: Option<u32>,
    pub author: Option<String>,
    pub age_text: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub top_comment: Option<String>,
}

impl StoryRecord {
    /// Merge a listing with its enrichment.
    ///
    /// A description already present on the listing wins over the fetched
    /// body. `published` is only backfilled from `age_text` when the source
    /// did not set it.
    pub fn merge(listing: StoryListing, enrichment: Enrichment) -> Self {
        let published = listing.resolved_published();
        Self {
            title: listing.title,
            url: listing.url,
            comments_url: listing.comments_url,
            order: listing.order,
            points: listing.points,
            author: listing.author,
            age_text: listing.age_text,
            published,
            description: listing.description.or(enrichment.description),
            top_comment: enrichment.top_comment,
        }
    }

    /// Host of the external link, falling back to the discussion page host.
    pub fn url_domain(&self) -> String {
        [&self.url, &self.comments_url]
            .into_iter()
            .filter_map(|u| url::Url::parse(u).ok())
            .find_map(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }
}

/// Channel-level metadata for the generated feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedMetadata {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
}

impl Default for FeedMetadata {
    fn default() -> Self {
        Self {
            title: "Hacker News Top Stories".to_string(),
            link: "https://news.ycombinator.com/".to_string(),
            description: "Top stories from Hacker News".to_string(),
            language: "en-us".to_string(),
        }
    }
}

/// One `<item>` of the generated feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    /// Discussion page, so readers land on the comments.
    pub link: String,
    /// Assembled HTML description.
    pub description: String,
    pub published: Option<DateTime<Utc>>,
    /// External story URL.
    pub guid: Option<String>,
    /// Informational only.
    pub is_permalink: bool,
    pub categories: Vec<String>,
    /// Extra key/value elements, in output order. Absent values are omitted.
    pub extras: Vec<(String, String)>,
}

impl FeedEntry {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: String::new(),
            published: None,
            guid: None,
            is_permalink: true,
            categories: Vec::new(),
            extras: Vec::new(),
        }
    }
}

#[cfg(test)]
impl FeedEntry {
    /// Look up an extra by key.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
