//! Loading document pages from disk
//!
//! Two formats are accepted:
//!
//! - a JSON array of `{"page_num": N, "text": "..."}` objects
//! - plain text with pages separated by form feeds (`\x0c`), as written by
//!   `pdftotext`

use crate::error::ExtractorError;
use pcascan_domain::PageText;
use std::path::Path;

const FORM_FEED: char = '\u{0c}';

/// Load pages from `path`, sorted by page number
pub fn load_pages(path: &Path) -> Result<Vec<PageText>, ExtractorError> {
    if !path.exists() {
        return Err(ExtractorError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let mut pages = if is_json {
        parse_json_pages(&text)?
    } else {
        parse_text_pages(&text)
    };

    pages.sort_by_key(|p| p.page_num);
    Ok(pages)
}

/// Parse a JSON page array
pub fn parse_json_pages(text: &str) -> Result<Vec<PageText>, ExtractorError> {
    let pages: Vec<PageText> = serde_json::from_str(text)?;
    if let Some(bad) = pages.iter().find(|p| p.page_num == 0) {
        return Err(ExtractorError::InvalidInput(format!(
            "page numbers start at 1, found page {} with {} chars",
            bad.page_num,
            bad.text.len()
        )));
    }
    Ok(pages)
}

/// Split form-feed separated text into pages numbered from 1
///
/// A trailing form feed does not produce an extra empty page.
pub fn parse_text_pages(text: &str) -> Vec<PageText> {
    let body = text.strip_suffix(FORM_FEED).unwrap_or(text);
    body.split(FORM_FEED)
        .enumerate()
        .map(|(i, page)| PageText::new(i as u32 + 1, page.trim()))
        .collect()
}
