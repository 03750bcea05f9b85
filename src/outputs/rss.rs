//! RSS 2.0 output.
//!
//! Renders the channel metadata and the ordered feed entries into an RSS 2.0
//! document with `quick-xml`, then writes it to disk.
//!
//! # Output Structure
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <rss version="2.0">
//!   <channel>
//!     <title/> <link/> <description/> <language/> <lastBuildDate/>
//!     <item>
//!       <title/> <link/> <guid isPermaLink="..."/> <pubDate/> <description/>
//!       <category/>*  <points/> <author/> <order/>
//!     </item>*
//!   </channel>
//! </rss>
//! ```

use std::error::Error;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tokio::fs;
use tracing::{info, instrument};

use crate::dates::format_rfc2822;
use crate::models::{FeedEntry, FeedMetadata};
use crate::utils::ensure_parent_dir;

fn write_text_element<W: Write>(
    w: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), Box<dyn Error>> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn write_item<W: Write>(w: &mut Writer<W>, entry: &FeedEntry) -> Result<(), Box<dyn Error>> {
    w.write_event(Event::Start(BytesStart::new("item")))?;
    write_text_element(w, "title", &entry.title)?;
    write_text_element(w, "link", &entry.link)?;

    let guid = entry.guid.as_deref().unwrap_or(&entry.link);
    if !guid.is_empty() {
        let mut start = BytesStart::new("guid");
        start.push_attribute(("isPermaLink", if entry.is_permalink { "true" } else { "false" }));
        w.write_event(Event::Start(start))?;
        w.write_event(Event::Text(BytesText::new(guid)))?;
        w.write_event(Event::End(BytesEnd::new("guid")))?;
    }

    if let Some(published) = &entry.published {
        write_text_element(w, "pubDate", &format_rfc2822(published))?;
    }
    if !entry.description.is_empty() {
        write_text_element(w, "description", &entry.description)?;
    }
    for category in entry.categories.iter().filter(|c| !c.is_empty()) {
        write_text_element(w, "category", category)?;
    }
    for (key, value) in entry.extras.iter().filter(|(k, v)| !k.is_empty() && !v.is_empty()) {
        write_text_element(w, key, value)?;
    }

    w.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

/// Render a complete RSS 2.0 document.
///
/// `lastBuildDate` is set to the current time.
///
/// # Arguments
///
/// * `meta` - Channel title, link, description and language.
/// * `entries` - Items in the order they should appear.
///
/// # Returns
///
/// The XML document, or an error if the writer fails.
pub fn render_rss(meta: &FeedMetadata, entries: &[FeedEntry]) -> Result<String, Box<dyn Error>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", &meta.title)?;
    write_text_element(&mut writer, "link", &meta.link)?;
    write_text_element(&mut writer, "description", &meta.description)?;
    write_text_element(&mut writer, "language", &meta.language)?;
    write_text_element(&mut writer, "lastBuildDate", &format_rfc2822(&Utc::now()))?;

    for entry in entries {
        write_item(&mut writer, entry)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut xml = String::from_utf8(writer.into_inner())?;
    xml.push('\n');
    Ok(xml)
}

/// Write the rendered feed, creating missing parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_feed(path: &Path, xml: &str) -> Result<(), Box<dyn Error>> {
    ensure_parent_dir(path).await?;
    fs::write(path, xml).await?;
    info!(bytes = xml.len(), "Wrote RSS feed");
    Ok(())
}
