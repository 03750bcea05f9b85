//! Small helpers for logging, URLs and the file system.
//!
//! - String truncation for log lines
//! - Item id extraction from discussion URLs
//! - Parent directory creation for the output file

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

static ITEM_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]id=(\d+)").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a char boundary) with
/// an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Pull the numeric item id out of a discussion URL such as
/// `https://news.ycombinator.com/item?id=123`.
pub fn item_id_from_url(url: &str) -> Option<u64> {
    ITEM_ID_RE
        .captures(url)
        .and_then(|caps| caps[1].parse().ok())
}

/// Make sure the directory that will hold `path` exists.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).await?;
            debug!(parent = %parent.display(), "Output directory ready");
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        let result = truncate_for_log("ééé", 3);
        assert_eq!(result, "é…(+4 bytes)");
    }

    #[test]
    fn test_item_id_from_url() {
        assert_eq!(
            item_id_from_url("https://news.ycombinator.com/item?id=38912345"),
            Some(38912345)
        );
        assert_eq!(item_id_from_url("https://x.test/item?foo=1&id=7"), Some(7));
        assert_eq!(item_id_from_url("https://a.com/post"), None);
        assert_eq!(item_id_from_url(""), None);
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_creates_missing_dirs() {
        let root = std::env::temp_dir().join(format!("hn_rss_feed_utils_{}", std::process::id()));
        let target = root.join("nested/feeds/out.xml");

        ensure_parent_dir(&target).await.unwrap();
        assert!(root.join("nested/feeds").is_dir());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_bare_filename() {
        ensure_parent_dir(Path::new("feed.xml")).await.unwrap();
    }
}
