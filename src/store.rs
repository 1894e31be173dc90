// src/store.rs
// =============================================================================
// Loads a bookmark list for the CLI.
//
// The real bookmark store belongs to the browser; the checker only ever
// receives a list of BookmarkRef. For the command line we read that list from
// a JSON file:
//
//   [
//     { "url": "https://www.rust-lang.org/", "title": "Rust", "tags": ["lang"] },
//     { "url": "https://example.com/" }
//   ]
// =============================================================================

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;
use url::Url;

use crate::checker::BookmarkRef;

// URLs are read as plain strings first so a bad one can be reported with
// its position instead of a bare serde error
#[derive(Debug, Deserialize)]
struct RawBookmark {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    tags: Vec<String>,
}

pub fn load_bookmarks(path: &Path) -> Result<Vec<BookmarkRef>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading bookmarks from {}", path.display()))?;
    parse_bookmarks(&text).with_context(|| format!("loading bookmarks from {}", path.display()))
}

pub fn parse_bookmarks(json: &str) -> Result<Vec<BookmarkRef>> {
    let raw: Vec<RawBookmark> =
        serde_json::from_str(json).context("bookmark file is not a JSON array of bookmarks")?;

    raw.into_iter()
        .enumerate()
        .map(|(index, bookmark)| {
            let url = Url::parse(bookmark.url.trim()).map_err(|e| {
                anyhow!("bookmark #{} has invalid URL '{}': {}", index, bookmark.url, e)
            })?;
            Ok(BookmarkRef::new(url, bookmark.title).with_tags(bookmark.tags))
        })
        .collect()
}
