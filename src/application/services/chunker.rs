//! Content-aware text splitting.
//!
//! Chunks are exact substrings of the parent content measured in characters.
//! Each split point is searched from the widest boundary class downward
//! (paragraph, line, sentence, word) before falling back to a hard cut, and the
//! separator stays attached to the chunk it closes. The following chunk starts
//! up to `chunk_overlap` characters earlier, snapped forward to a word start
//! when the overlap window contains one.

use crate::domain::{Chunk, DomainError, NormalizedDocument};

/// Boundary classes in preference order, tried before plain whitespace.
const BOUNDARY_CLASSES: [&[&str]; 3] = [&["\n\n"], &["\n"], &[". ", "? ", "! ", "。"]];

/// Splits normalized documents into overlapping, size-bounded chunks.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn try_new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, DomainError> {
        if chunk_size == 0 {
            return Err(DomainError::validation(
                "chunk size must be greater than zero",
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(DomainError::validation(format!(
                "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Chunk every document in order; chunks inherit their parent's metadata.
    pub fn split_documents(&self, documents: &[NormalizedDocument]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| {
                let chars: Vec<char> = doc.content.chars().collect();
                self.spans(&chars)
                    .into_iter()
                    .enumerate()
                    .map(move |(index, (start, end))| Chunk {
                        text: chars[start..end].iter().collect(),
                        metadata: doc.metadata.clone(),
                        index,
                        start,
                        end,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Character spans `(start, end)` covering `text`.
    pub fn split_text(&self, text: &str) -> Vec<(usize, usize)> {
        let chars: Vec<char> = text.chars().collect();
        self.spans(&chars)
    }

    fn spans(&self, chars: &[char]) -> Vec<(usize, usize)> {
        let len = chars.len();
        let mut spans = Vec::new();
        let mut start = 0;

        while start < len {
            if len - start <= self.chunk_size {
                spans.push((start, len));
                break;
            }
            let end = self.split_point(chars, start);
            spans.push((start, end));
            start = self.overlap_start(chars, end);
        }

        spans
    }

    /// Best end offset for a chunk starting at `start`.
    ///
    /// Candidates must leave the next chunk starting after `start`, so they are
    /// searched in `(start + overlap, start + chunk_size]`.
    fn split_point(&self, chars: &[char], start: usize) -> usize {
        let lowest = start + self.chunk_overlap;
        let highest = start + self.chunk_size;

        for class in BOUNDARY_CLASSES {
            let found = (lowest + 1..=highest).rev().find(|&end| {
                class
                    .iter()
                    .any(|separator| ends_with(chars, start, end, separator))
            });
            if let Some(end) = found {
                return end;
            }
        }

        (lowest + 1..=highest)
            .rev()
            .find(|&end| chars[end - 1].is_whitespace())
            .unwrap_or(highest)
    }

    fn overlap_start(&self, chars: &[char], end: usize) -> usize {
        if self.chunk_overlap == 0 {
            return end;
        }
        let earliest = end - self.chunk_overlap;
        (earliest..end)
            .find(|&pos| chars[pos - 1].is_whitespace())
            .unwrap_or(earliest)
    }
}

/// Whether `chars[..end]` ends with `separator` without reaching before `start`.
fn ends_with(chars: &[char], start: usize, end: usize, separator: &str) -> bool {
    let sep_len = separator.chars().count();
    if end < start + sep_len {
        return false;
    }
    chars[end - sep_len..end]
        .iter()
        .copied()
        .eq(separator.chars())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Metadata;

    fn rebuild(chunks: &[Chunk]) -> String {
        let mut out = chunks[0].text.clone();
        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert!(next.start <= prev.end, "gap between chunks");
            out.extend(next.text.chars().skip(prev.end - next.start));
        }
        out
    }

    fn samples() -> Vec<String> {
        vec![
            "Agenda: 태풍 피해 대책\nContext: 올해 태풍으로 인한 피해가 컸습니다. 복구 예산이 필요합니다! 정부는 어떻게 대응합니까?\nSummary (Question): 예산 질의\nSummary (Answer): 추경 편성".to_string(),
            "word ".repeat(120),
            "x".repeat(1_337),
            "첫 문단입니다.\n\n둘째 문단은 조금 더 깁니다. 문장이 여러 개 있습니다.\n\n셋째 문단.".repeat(7),
            "  \n\n  \n leading and trailing whitespace \n\n".to_string(),
            "한".to_string(),
        ]
    }

    #[test]
    fn rejects_invalid_configuration() {
        assert!(TextChunker::try_new(0, 0).is_err());
        assert!(TextChunker::try_new(10, 10).is_err());
        assert!(TextChunker::try_new(10, 11).is_err());
        let chunker = TextChunker::try_new(10, 9).unwrap();
        assert_eq!((chunker.chunk_size(), chunker.chunk_overlap()), (10, 9));
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunker = TextChunker::try_new(10, 2).unwrap();
        assert!(chunker.split_text("").is_empty());
    }

    #[test]
    fn chunks_rebuild_original_and_respect_size() {
        for (size, overlap) in [(1, 0), (7, 3), (20, 0), (50, 10), (64, 63), (500, 50)] {
            let chunker = TextChunker::try_new(size, overlap).unwrap();
            for text in samples() {
                let doc = NormalizedDocument {
                    content: text.clone(),
                    metadata: Metadata::new(),
                };
                let chunks = chunker.split_documents(&[doc]);

                assert!(!chunks.is_empty());
                assert_eq!(chunks[0].start, 0);
                assert_eq!(chunks.last().unwrap().end, text.chars().count());
                for chunk in &chunks {
                    assert_eq!(chunk.text.chars().count(), chunk.char_len());
                    assert!(chunk.char_len() <= size, "chunk of {} > {size}", chunk.char_len());
                }
                for pair in chunks.windows(2) {
                    assert!(pair[1].start > pair[0].start, "no progress");
                    assert!(pair[0].end - pair[1].start <= overlap, "overlap too wide");
                }
                assert_eq!(rebuild(&chunks), text, "size={size} overlap={overlap}");
            }
        }
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let chunker = TextChunker::try_new(30, 0).unwrap();
        let text = "first paragraph\n\nsecond one is longer text";
        let spans = chunker.split_text(text);
        let chars: Vec<char> = text.chars().collect();
        let first: String = chars[spans[0].0..spans[0].1].iter().collect();
        assert_eq!(first, "first paragraph\n\n");
    }

    #[test]
    fn prefers_sentence_over_word_boundaries() {
        let chunker = TextChunker::try_new(25, 0).unwrap();
        let spans = chunker.split_text("One sentence. Another one follows here");
        assert_eq!(spans[0], (0, 14));
    }

    #[test]
    fn overlap_starts_on_a_word() {
        let chunker = TextChunker::try_new(20, 8).unwrap();
        let text = "alpha beta gamma delta epsilon zeta eta theta";
        let chars: Vec<char> = text.chars().collect();
        let spans = chunker.split_text(text);

        for &(start, _) in spans.iter().skip(1) {
            assert!(chars[start - 1].is_whitespace());
        }
    }

    #[test]
    fn documents_keep_metadata_and_order() {
        let chunker = TextChunker::try_new(12, 2).unwrap();
        let doc = |agenda: &str, content: &str| NormalizedDocument {
            content: content.to_string(),
            metadata: Metadata::from([("agenda".to_string(), agenda.to_string())]),
        };
        let docs = [
            doc("first", "aaa bbb ccc ddd eee fff"),
            doc("second", "short"),
        ];

        let chunks = chunker.split_documents(&docs);
        let first_doc: Vec<_> = chunks
            .iter()
            .filter(|c| c.metadata["agenda"] == "first")
            .collect();
        assert!(first_doc.len() > 1);
        assert!(first_doc.iter().enumerate().all(|(i, c)| c.index == i));
        assert!(chunks.iter().all(|c| c.char_len() <= 12));

        let last = chunks.last().unwrap();
        assert_eq!(last.metadata["agenda"], "second");
        assert_eq!(last.text, "short");
        assert_eq!(chunker.split_documents(&docs), chunks);
    }
}
