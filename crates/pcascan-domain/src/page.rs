//! Page text and chunk value objects
//!
//! A document enters the pipeline as an ordered list of [`PageText`] values.
//! The chunker groups consecutive pages into [`Chunk`]s that are sent to the
//! model one at a time.

use serde::{Deserialize, Serialize};

/// Text of a single document page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number
    pub page_num: u32,

    /// Extracted page text
    pub text: String,
}

impl PageText {
    /// Create a new page
    pub fn new(page_num: u32, text: impl Into<String>) -> Self {
        Self {
            page_num,
            text: text.into(),
        }
    }

    /// Number of whitespace-separated words on the page
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A run of consecutive pages sent to the model in one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// First page number in the chunk
    pub start: u32,

    /// Last page number in the chunk
    pub end: u32,

    /// Pages in document order
    pub pages: Vec<PageText>,
}

impl Chunk {
    /// Build a chunk from a non-empty page list.
    ///
    /// Returns `None` when `pages` is empty.
    pub fn from_pages(pages: Vec<PageText>) -> Option<Self> {
        let start = pages.first()?.page_num;
        let end = pages.last()?.page_num;
        Some(Self { start, end, pages })
    }

    /// Page texts joined by a blank line
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Total words across all pages
    pub fn word_count(&self) -> usize {
        self.pages.iter().map(PageText::word_count).sum()
    }

    /// Page range label, e.g. `"3-7"`
    pub fn page_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}
