//! Feed-building pipeline.
//!
//! Drives a [`StorySource`] through the full run:
//!
//! 1. **Listing**: ordered candidates from the source
//! 2. **Oversampling**: keep the first `max(3 * max_items, max_items)` candidates
//! 3. **Resolving**: candidates that do not resolve are dropped
//! 4. **Sorting**: stable, descending by points or publish time
//! 5. **Filtering and enriching**: skip stories under `min_points`, pace and
//!    enrich the rest until `max_items` entries exist
//! 6. **Mapping**: each enriched story becomes a [`FeedEntry`]
//!
//! Requests are strictly sequential.

use std::cmp::Reverse;

use clap::ValueEnum;
use tracing::{debug, info, instrument};

use crate::feed::map_story;
use crate::models::{FeedEntry, StoryListing, StoryRecord};
use crate::sources::StorySource;

/// Ordering applied to resolved stories before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortKey {
    /// Highest score first; missing scores count as zero.
    #[default]
    Points,
    /// Newest first; stories without a timestamp go last.
    Published,
}

#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub max_items: usize,
    /// Inclusive lower bound on points. Stories without points are kept.
    pub min_points: u32,
    pub sort_by: SortKey,
}

/// How many candidates are worth resolving for `max_items` entries.
pub fn oversample_limit(max_items: usize) -> usize {
    max_items.saturating_mul(3).max(max_items)
}

/// Stable in-place sort, best first.
pub fn sort_stories<R>(stories: &mut [(StoryListing, R)], key: SortKey) {
    match key {
        SortKey::Points => stories.sort_by_key(|(s, _)| Reverse(s.points.unwrap_or(0))),
        SortKey::Published => stories.sort_by_cached_key(|(s, _)| Reverse(s.resolved_published())),
    }
}

fn below_threshold(story: &StoryListing, min_points: u32) -> bool {
    matches!(story.points, Some(points) if points < min_points)
}

/// Run the whole pipeline against `source` and return the entries in feed
/// order.
///
/// Network failures never abort the run; they surface as fewer or thinner
/// entries.
///
/// # Arguments
///
/// * `source` - The story source to list, resolve and enrich from. Its pacer
///   gates every enrichment request.
/// * `options` - Item cap, points threshold and sort key.
///
/// # Returns
///
/// At most `options.max_items` feed entries, sorted by `options.sort_by`.
#[instrument(level = "info", skip_all, fields(source = source.name(), max_items = options.max_items, min_points = options.min_points))]
pub async fn build_feed_entries<S: StorySource>(
    source: &mut S,
    options: &FeedOptions,
) -> Vec<FeedEntry> {
    let candidates = source.list_candidates().await;
    if candidates.is_empty() {
        info!("Source returned no stories");
        return Vec::new();
    }

    let limit = oversample_limit(options.max_items);
    info!(available = candidates.len(), limit, "Resolving candidates");

    let mut resolved = Vec::new();
    for (order, candidate) in candidates.into_iter().take(limit).enumerate() {
        match source.resolve(candidate, order).await {
            Some(story) => resolved.push(story),
            None => debug!(order, "Dropped unresolvable candidate"),
        }
    }
    if resolved.is_empty() {
        info!("No candidate resolved to a story");
        return Vec::new();
    }

    sort_stories(&mut resolved, options.sort_by);

    let total = resolved.len();
    let pacer = source.pacer();
    debug!(
        total,
        paced = pacer.is_started(),
        interval_ms = pacer.min_interval().as_millis() as u64,
        "Enriching sorted stories"
    );
    let mut entries = Vec::new();

    for (idx, (listing, raw)) in resolved.into_iter().enumerate() {
        if entries.len() >= options.max_items {
            break;
        }

        if below_threshold(&listing, options.min_points) {
            info!(
                title = %listing.title,
                points = ?listing.points,
                min_points = options.min_points,
                "Skipping story below points threshold"
            );
            continue;
        }

        source.pacer().wait_if_needed(true).await;
        info!("[{}/{}] {}", idx + 1, total, listing.title);

        let enrichment = source.enrich(&listing, Some(&raw)).await;
        let record = StoryRecord::merge(listing, enrichment);
        entries.push(map_story(&record));
    }

    info!(count = entries.len(), "Built feed entries");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Enrichment;
    use crate::pacer::Pacer;
    use chrono::{DateTime, TimeZone, Utc};
    use std::time::{Duration, Instant};

    /// In-memory source; `None` candidates never resolve.
    struct FakeSource {
        candidates: Vec<Option<StoryListing>>,
        resolve_calls: usize,
        enrich_calls: usize,
        raw_seen: Vec<usize>,
        pacer: Pacer,
    }

    impl FakeSource {
        fn new(candidates: Vec<Option<StoryListing>>) -> Self {
            Self {
                candidates,
                resolve_calls: 0,
                enrich_calls: 0,
                raw_seen: Vec::new(),
                pacer: Pacer::new(0),
            }
        }

        fn with_points(points: &[Option<u32>]) -> Self {
            Self::new(
                points
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let mut s = story(i);
                        s.points = *p;
                        Some(s)
                    })
                    .collect(),
            )
        }
    }

    impl StorySource for FakeSource {
        type Candidate = Option<StoryListing>;
        type Raw = usize;

        fn name(&self) -> &'static str {
            "fake"
        }

        async fn list_candidates(&mut self) -> Vec<Option<StoryListing>> {
            self.candidates.clone()
        }

        async fn resolve(
            &mut self,
            candidate: Option<StoryListing>,
            order: usize,
        ) -> Option<(StoryListing, usize)> {
            self.resolve_calls += 1;
            candidate.map(|mut s| {
                s.order = order;
                (s, order)
            })
        }

        async fn enrich(&mut self, listing: &StoryListing, raw: Option<&usize>) -> Enrichment {
            self.enrich_calls += 1;
            if let Some(raw) = raw {
                self.raw_seen.push(*raw);
            }
            Enrichment {
                description: None,
                top_comment: Some(format!("comment on {}", listing.title)),
            }
        }

        fn pacer(&mut self) -> &mut Pacer {
            &mut self.pacer
        }
    }

    fn story(i: usize) -> StoryListing {
        StoryListing::new(
            format!("story {i}"),
            format!("https://example.com/{i}"),
            format!("https://news.ycombinator.com/item?id={i}"),
            i,
        )
    }

    fn options(max_items: usize, min_points: u32) -> FeedOptions {
        FeedOptions {
            max_items,
            min_points,
            sort_by: SortKey::Points,
        }
    }

    fn points_of(entries: &[FeedEntry]) -> Vec<Option<&str>> {
        entries.iter().map(|e| e.extra("hn_points")).collect()
    }

    #[test]
    fn test_oversample_limit() {
        assert_eq!(oversample_limit(0), 0);
        assert_eq!(oversample_limit(1), 3);
        assert_eq!(oversample_limit(15), 45);
        assert_eq!(oversample_limit(usize::MAX), usize::MAX);
    }

    #[tokio::test]
    async fn test_empty_listing_yields_empty_feed() {
        let mut source = FakeSource::new(Vec::new());
        assert!(build_feed_entries(&mut source, &options(10, 0)).await.is_empty());
        assert_eq!(source.resolve_calls, 0);
    }

    #[tokio::test]
    async fn test_filters_and_sorts_by_points() {
        let mut source = FakeSource::with_points(&[Some(5), Some(50), Some(20)]);
        let entries = build_feed_entries(&mut source, &options(10, 10)).await;
        assert_eq!(points_of(&entries), vec![Some("50"), Some("20")]);
        assert_eq!(source.enrich_calls, 2);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let mut source = FakeSource::with_points(&[Some(9), Some(10)]);
        let entries = build_feed_entries(&mut source, &options(10, 10)).await;
        assert_eq!(points_of(&entries), vec![Some("10")]);
    }

    #[tokio::test]
    async fn test_missing_points_sort_last_but_are_kept() {
        let mut source = FakeSource::with_points(&[None, Some(30)]);
        let entries = build_feed_entries(&mut source, &options(10, 10)).await;
        assert_eq!(points_of(&entries), vec![Some("30"), None]);
    }

    #[tokio::test]
    async fn test_ties_keep_listing_order() {
        let mut source = FakeSource::with_points(&[Some(10), Some(40), Some(10), Some(10)]);
        let entries = build_feed_entries(&mut source, &options(10, 0)).await;
        let orders: Vec<_> = entries.iter().map(|e| e.extra("hn_order").unwrap()).collect();
        assert_eq!(orders, vec!["1", "0", "2", "3"]);
    }

    #[tokio::test]
    async fn test_oversampling_bounds_fetches() {
        let mut source = FakeSource::with_points(&[Some(1); 100]);
        let entries = build_feed_entries(&mut source, &options(4, 50)).await;
        assert!(entries.is_empty());
        assert_eq!(source.resolve_calls, 12);
        assert_eq!(source.enrich_calls, 0);
    }

    #[tokio::test]
    async fn test_stops_at_max_items() {
        let mut source = FakeSource::with_points(&[Some(100); 20]);
        let entries = build_feed_entries(&mut source, &options(3, 0)).await;
        assert_eq!(entries.len(), 3);
        assert_eq!(source.resolve_calls, 9);
        assert_eq!(source.enrich_calls, 3);
    }

    #[tokio::test]
    async fn test_zero_max_items() {
        let mut source = FakeSource::with_points(&[Some(100)]);
        assert!(build_feed_entries(&mut source, &options(0, 0)).await.is_empty());
        assert_eq!(source.resolve_calls, 0);
    }

    #[tokio::test]
    async fn test_unresolvable_candidates_are_dropped() {
        let mut source = FakeSource::new(vec![None, Some(story(1)), None, Some(story(3))]);
        let entries = build_feed_entries(&mut source, &options(10, 0)).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(source.resolve_calls, 4);
        assert_eq!(source.raw_seen, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_entries_carry_enrichment_and_links() {
        let mut source = FakeSource::with_points(&[Some(100)]);
        let entries = build_feed_entries(&mut source, &options(1, 0)).await;
        let entry = &entries[0];
        assert_eq!(entry.link, "https://news.ycombinator.com/item?id=0");
        assert_eq!(entry.guid.as_deref(), Some("https://example.com/0"));
        assert!(entry.description.contains("comment on story 0"));
    }

    #[tokio::test]
    async fn test_sort_by_published_puts_undated_last() {
        let at = |d: u32| -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap() };
        let mut old = story(0);
        old.published = Some(at(1));
        let undated = story(1);
        let mut new = story(2);
        new.published = Some(at(5));
        let mut from_age = story(3);
        from_age.age_text = Some("2024-01-03 10:00".to_string());

        let mut source = FakeSource::new(vec![Some(old), Some(undated), Some(new), Some(from_age)]);
        let opts = FeedOptions {
            max_items: 10,
            min_points: 0,
            sort_by: SortKey::Published,
        };
        let entries = build_feed_entries(&mut source, &opts).await;
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["story 2", "story 3", "story 0", "story 1"]);
    }

    #[tokio::test]
    async fn test_published_ties_keep_listing_order() {
        let same = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        let mut first = story(0);
        first.published = Some(same);
        let mut newest = story(1);
        newest.published = Some(same + chrono::Duration::hours(1));
        let mut second = story(2);
        second.published = Some(same);
        let mut third = story(3);
        third.age_text = Some("2024-01-02 08:00".to_string());

        let mut source =
            FakeSource::new(vec![Some(first), Some(newest), Some(second), Some(third)]);
        let opts = FeedOptions {
            max_items: 10,
            min_points: 0,
            sort_by: SortKey::Published,
        };
        let entries = build_feed_entries(&mut source, &opts).await;
        let orders: Vec<_> = entries.iter().map(|e| e.extra("hn_order").unwrap()).collect();
        assert_eq!(orders, vec!["1", "0", "2", "3"]);
    }

    #[tokio::test]
    async fn test_enrichment_is_paced() {
        let mut source = FakeSource::with_points(&[Some(100), Some(90), Some(80)]);
        source.pacer = Pacer::started(30);

        let t0 = Instant::now();
        let entries = build_feed_entries(&mut source, &options(3, 0)).await;
        assert_eq!(entries.len(), 3);
        assert!(t0.elapsed() >= Duration::from_millis(85));
    }
}
