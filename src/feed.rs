//! Mapping of enriched stories to feed entries.
//!
//! The entry links to the discussion page so readers land on the comments;
//! the external URL becomes the guid. The description is an HTML block laid
//! out in a fixed order:
//!
//! 1. source domain link
//! 2. story body, if any
//! 3. top comment blockquote, if any
//! 4. points / author line
//! 5. "View All Comments" link

use quick_xml::escape::escape;

use crate::models::{FeedEntry, StoryRecord};

/// Build the HTML description block for a story.
pub fn render_description(story: &StoryRecord) -> String {
    let mut html = String::new();

    html.push_str(&format!(
        r#"<p><strong>Source:</strong> <a href="{}">{}</a></p>"#,
        escape(story.url.as_str()),
        escape(story.url_domain().as_str()),
    ));

    if let Some(body) = story.description.as_deref().filter(|b| !b.trim().is_empty()) {
        html.push_str(&format!("<p>{body}</p>"));
    }

    if let Some(comment) = story.top_comment.as_deref().filter(|c| !c.trim().is_empty()) {
        html.push_str(&format!(
            concat!(
                "<hr/><div><b>Top Comment:</b></div>",
                r#"<blockquote style="margin:1.5em 0; padding:1em 1.5em; border-left:4px solid #ccc; background-color:#f9f9f9; font-style:italic;">"#,
                "<p>{}</p></blockquote>"
            ),
            comment
        ));
    }

    let author = story.author.as_deref().unwrap_or("unknown");
    html.push_str(&format!(
        "<p><strong>Points:</strong> {} | <strong>Author:</strong> {}</p>",
        story.points.unwrap_or(0),
        escape(author),
    ));
    html.push_str(&format!(
        r#"<p><a href="{}">View All Comments</a></p>"#,
        escape(story.comments_url.as_str()),
    ));

    html
}

/// Map an enriched story to a feed entry.
///
/// Extras are prefixed with `hn_` so they never collide with RSS item
/// elements such as `<author>`, which must hold an email address.
///
/// # Arguments
///
/// * `story` - The merged listing and enrichment.
///
/// # Returns
///
/// A [`FeedEntry`] with `hn_points`, `hn_author` and `hn_order` extras, the
/// first two omitted when absent.
pub fn map_story(story: &StoryRecord) -> FeedEntry {
    let mut extras = Vec::with_capacity(3);
    if let Some(points) = story.points {
        extras.push(("hn_points".to_string(), points.to_string()));
    }
    if let Some(author) = &story.author {
        extras.push(("hn_author".to_string(), author.clone()));
    }
    extras.push(("hn_order".to_string(), story.order.to_string()));

    let mut entry = FeedEntry::new(story.title.clone(), story.comments_url.clone());
    entry.description = render_description(story);
    entry.published = story.published;
    entry.guid = Some(story.url.clone());
    entry.extras = extras;
    entry
}
