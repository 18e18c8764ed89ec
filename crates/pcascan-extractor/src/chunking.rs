//! Page chunking for long documents

use pcascan_domain::{Chunk, PageText};

/// Packs consecutive pages into chunks bounded by a word count
///
/// Pages are never split. A page larger than the limit becomes a chunk of
/// its own; empty pages ride along with their neighbours.
#[derive(Debug, Clone, Copy)]
pub struct PageChunker {
    word_limit: usize,
}

impl PageChunker {
    /// Create a chunker with the given word limit
    pub fn new(word_limit: usize) -> Self {
        Self { word_limit }
    }

    /// Word limit per chunk
    pub fn word_limit(&self) -> usize {
        self.word_limit
    }

    /// Split `pages` into ordered, gap-free chunks
    pub fn chunk(&self, pages: &[PageText]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current: Vec<PageText> = Vec::new();
        let mut current_words = 0;

        for page in pages {
            let words = page.word_count();
            if current_words > 0 && words > 0 && current_words + words > self.word_limit {
                chunks.extend(Chunk::from_pages(std::mem::take(&mut current)));
                current_words = 0;
            }
            current.push(page.clone());
            current_words += words;
        }

        chunks.extend(Chunk::from_pages(current));
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn page(num: u32, words: usize) -> PageText {
        PageText::new(num, vec!["w"; words].join(" "))
    }

    #[test]
    fn test_no_pages() {
        assert!(PageChunker::new(10).chunk(&[]).is_empty());
    }

    #[test]
    fn test_small_document_single_chunk() {
        let pages = vec![page(1, 3), page(2, 4)];
        let chunks = PageChunker::new(10).chunk(&pages);
        assert_eq!(chunks.len(), 1);
        assert_eq!((chunks[0].start, chunks[0].end), (1, 2));
    }

    #[test]
    fn test_split_when_limit_exceeded() {
        let pages = vec![page(1, 6), page(2, 4), page(3, 1)];
        let chunks = PageChunker::new(10).chunk(&pages);

        let ranges: Vec<_> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(ranges, vec![(1, 2), (3, 3)]);
    }

    #[test]
    fn test_oversized_page_is_its_own_chunk() {
        let pages = vec![page(1, 2), page(2, 50), page(3, 2)];
        let chunks = PageChunker::new(10).chunk(&pages);

        let ranges: Vec<_> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(ranges, vec![(1, 1), (2, 2), (3, 3)]);
        assert_eq!(chunks[1].word_count(), 50);
    }

    #[test]
    fn test_empty_pages_never_force_split() {
        let pages = vec![page(1, 10), page(2, 0), page(3, 0)];
        let chunks = PageChunker::new(10).chunk(&pages);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].pages.len(), 3);

        // Trailing blank pages stay with an oversized page
        let pages = vec![page(1, 30), page(2, 0)];
        let chunks = PageChunker::new(10).chunk(&pages);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_leading_empty_pages_join_next_page() {
        let pages = vec![page(1, 0), page(2, 30), page(3, 5)];
        let chunks = PageChunker::new(10).chunk(&pages);

        let ranges: Vec<_> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(ranges, vec![(1, 2), (3, 3)]);
    }

    proptest! {
        #[test]
        fn prop_chunks_partition_pages(
            sizes in prop::collection::vec(0usize..40, 0..30),
            limit in 1usize..60,
        ) {
            let pages: Vec<PageText> = sizes
                .iter()
                .enumerate()
                .map(|(i, &n)| page(i as u32 + 1, n))
                .collect();
            let chunks = PageChunker::new(limit).chunk(&pages);

            // Concatenation reproduces the input in order
            let flattened: Vec<PageText> =
                chunks.iter().flat_map(|c| c.pages.clone()).collect();
            prop_assert_eq!(&flattened, &pages);

            for chunk in &chunks {
                prop_assert!(!chunk.pages.is_empty());
                prop_assert_eq!(chunk.start, chunk.pages[0].page_num);
                prop_assert_eq!(chunk.end, chunk.pages[chunk.pages.len() - 1].page_num);

                // Over the limit only when a single page is over it
                if chunk.word_count() > limit {
                    let nonempty = chunk.pages.iter().filter(|p| p.word_count() > 0).count();
                    prop_assert_eq!(nonempty, 1);
                }
            }
        }
    }
}
