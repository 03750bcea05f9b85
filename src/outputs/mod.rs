//! Output generation.
//!
//! # Submodules
//!
//! - [`rss`]: renders feed entries as an RSS 2.0 document and writes it to disk

pub mod rss;
