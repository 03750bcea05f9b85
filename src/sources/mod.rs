//! Story sources for the front page.
//!
//! Both sources implement [`StorySource`] and follow the same three-phase
//! pattern:
//!
//! 1. **Listing**: discover the ordered candidates on the front page
//! 2. **Resolving**: turn a candidate into a [`StoryListing`] (or drop it)
//! 3. **Enriching**: fetch the story body and the first comment
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Firebase API | [`api`] | JSON API | One request per candidate while resolving |
//! | Front page | [`html`] | HTML scraping | Whole listing parsed from a single page |
//!
//! Failures never escape a source: every fetch that goes wrong is logged and
//! degrades to "no data" (an empty listing, a dropped candidate, an empty
//! [`Enrichment`]).

use clap::ValueEnum;

use crate::models::{Enrichment, StoryListing};
use crate::pacer::Pacer;

pub mod api;
pub mod html;

/// Which source feeds the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Official JSON API.
    Api,
    /// Scrape the rendered front page and discussion pages.
    Html,
}

/// A front-page source the pipeline can drive.
pub trait StorySource {
    /// What the listing step yields per story.
    type Candidate;
    /// Detail captured while resolving and handed back to [`StorySource::enrich`].
    type Raw;

    /// Human-readable name for logs.
    fn name(&self) -> &'static str;

    /// Ordered candidates currently on the front page. Empty on failure.
    async fn list_candidates(&mut self) -> Vec<Self::Candidate>;

    /// Turn a candidate into a listing. `None` drops the candidate.
    async fn resolve(
        &mut self,
        candidate: Self::Candidate,
        order: usize,
    ) -> Option<(StoryListing, Self::Raw)>;

    /// Fetch the story body and top comment. Never fails; missing pieces stay
    /// `None`.
    async fn enrich(&mut self, listing: &StoryListing, raw: Option<&Self::Raw>) -> Enrichment;

    /// Pacer guarding this source's enrichment requests.
    fn pacer(&mut self) -> &mut Pacer;
}
