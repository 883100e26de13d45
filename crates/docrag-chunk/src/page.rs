//! Page-oriented word-window chunker.
//!
//! Splits extracted page texts into bounded chunks without ever breaking
//! a word. Chunk ids are derived from `(doc_id, page, chunk_index)` so
//! re-chunking identical input is idempotent.

use tracing::debug;
use ulid::Ulid;

use docrag_core::{Chunk, ChunkingConfig};

/// Chunker that accumulates whitespace-delimited words per page.
pub struct PageChunker {
    /// Maximum characters per chunk.
    chunk_size: usize,
}

impl PageChunker {
    /// Create a chunker with the default 500-character window.
    pub fn new() -> Self {
        Self {
            chunk_size: ChunkingConfig::default().chunk_size,
        }
    }

    /// Create a chunker with a custom window size.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Split page texts into chunks.
    ///
    /// Pages are numbered 1-based by position. Pages whose trimmed text
    /// is empty are skipped, but numbering still advances. Within a page,
    /// words accumulate into a buffer; when appending the next word (plus
    /// a joining space) would exceed the window and the buffer is
    /// non-empty, the buffer is emitted and the word starts a new buffer.
    /// The window is measured in characters, not bytes, so multibyte
    /// text fills it at the same rate as ASCII. The final non-empty
    /// buffer of each page is always emitted, and a single word longer
    /// than the window is emitted alone.
    pub fn chunk(
        &self,
        pages: &[String],
        filename: &str,
        doc_id: Ulid,
        url: &str,
    ) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for (page_index, page_text) in pages.iter().enumerate() {
            let page = page_index as u32 + 1;

            if page_text.trim().is_empty() {
                continue;
            }

            let mut current = String::new();
            let mut current_chars = 0usize;
            let mut chunk_index = 0u32;

            for word in page_text.split_whitespace() {
                let word_chars = word.chars().count();
                if current_chars > 0 && current_chars + word_chars + 1 > self.chunk_size {
                    chunks.push(Chunk::new(
                        doc_id,
                        page,
                        chunk_index,
                        &current,
                        filename,
                        url,
                    ));
                    current = word.to_string();
                    current_chars = word_chars;
                    chunk_index += 1;
                } else {
                    if current_chars > 0 {
                        current.push(' ');
                        current_chars += 1;
                    }
                    current.push_str(word);
                    current_chars += word_chars;
                }
            }

            if !current.is_empty() {
                chunks.push(Chunk::new(
                    doc_id,
                    page,
                    chunk_index,
                    &current,
                    filename,
                    url,
                ));
            }
        }

        debug!(
            doc_id = %doc_id,
            pages = pages.len(),
            chunks = chunks.len(),
            "Chunked document"
        );

        chunks
    }
}

impl Default for PageChunker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_id() -> Ulid {
        Ulid::from(7u128)
    }

    fn chunk_pages(chunker: &PageChunker, pages: &[&str]) -> Vec<Chunk> {
        let pages: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
        chunker.chunk(&pages, "report.pdf", doc_id(), "https://x/report.pdf")
    }

    #[test]
    fn test_single_page_single_chunk() {
        let chunker = PageChunker::new();
        let chunks = chunk_pages(
            &chunker,
            &["Revenue was $100 billion in 2023, up 10% year over year."],
        );

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(
            chunks[0].content,
            "Revenue was $100 billion in 2023, up 10% year over year."
        );
    }

    #[test]
    fn test_word_reconstruction() {
        // Concatenating chunk contents in order must reproduce the page's
        // words exactly, with no loss or duplication.
        let chunker = PageChunker::with_chunk_size(20);
        let page = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = chunk_pages(&chunker, &[page]);

        assert!(chunks.len() > 1);
        let rejoined: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.content.split_whitespace())
            .collect();
        let original: Vec<&str> = page.split_whitespace().collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_size_bound() {
        let chunker = PageChunker::with_chunk_size(20);
        let page = "one two three four five six seven eight nine ten eleven twelve";
        let chunks = chunk_pages(&chunker, &[page]);

        for chunk in &chunks {
            assert!(
                chunk.content.chars().count() <= 20,
                "chunk too long: {:?}",
                chunk.content
            );
        }
    }

    #[test]
    fn test_window_counts_characters_not_bytes() {
        // 14 characters but 38 bytes; a 20-character window must hold it
        // as a single chunk.
        let chunker = PageChunker::with_chunk_size(20);
        let chunks = chunk_pages(&chunker, &["あい あい あい あい あい"]);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "あい あい あい あい あい");
    }

    #[test]
    fn test_multibyte_size_bound() {
        let chunker = PageChunker::with_chunk_size(8);
        let page = "日本語 テキスト 分割 処理 確認";
        let chunks = chunk_pages(&chunker, &[page]);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.content.chars().count() <= 8,
                "chunk too long: {:?}",
                chunk.content
            );
        }
        let rejoined: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.content.split_whitespace())
            .collect();
        assert_eq!(rejoined, page.split_whitespace().collect::<Vec<_>>());
    }

    #[test]
    fn test_long_word_not_split() {
        let chunker = PageChunker::with_chunk_size(10);
        let chunks = chunk_pages(&chunker, &["short anextremelylongunbrokenword end"]);

        // The oversized word is emitted alone, never split mid-word.
        assert!(chunks
            .iter()
            .any(|c| c.content == "anextremelylongunbrokenword"));
        let rejoined: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.content.split_whitespace())
            .collect();
        assert_eq!(rejoined, vec!["short", "anextremelylongunbrokenword", "end"]);
    }

    #[test]
    fn test_empty_pages_skipped_numbering_advances() {
        let chunker = PageChunker::new();
        let chunks = chunk_pages(&chunker, &["first page", "   ", "", "fourth page"]);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[1].page, 4);
    }

    #[test]
    fn test_chunk_index_resets_per_page() {
        let chunker = PageChunker::with_chunk_size(10);
        let chunks = chunk_pages(&chunker, &["aaa bbb ccc ddd", "eee fff ggg hhh"]);

        let first_of_page2 = chunks.iter().find(|c| c.page == 2).unwrap();
        assert_eq!(first_of_page2.chunk_index, 0);
    }

    #[test]
    fn test_idempotent() {
        let chunker = PageChunker::with_chunk_size(25);
        let pages = &["the quick brown fox jumps over the lazy dog"];
        let a = chunk_pages(&chunker, pages);
        let b = chunk_pages(&chunker, pages);

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.content, y.content);
        }
    }

    #[test]
    fn test_no_pages_no_chunks() {
        let chunker = PageChunker::new();
        let chunks = chunk_pages(&chunker, &[]);
        assert!(chunks.is_empty());
    }
}
