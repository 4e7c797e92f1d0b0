use crate::error::IngestError;
use crate::extractor::PageText;
use crate::models::{DocumentFingerprint, IngestionOptions, PdfChunk};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

// Coarsest first; the empty separator splits into single characters.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::from(&IngestionOptions::default())
    }
}

impl From<&IngestionOptions> for ChunkingConfig {
    fn from(value: &IngestionOptions) -> Self {
        Self {
            chunk_size: value.chunk_size,
            chunk_overlap: value.chunk_overlap,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk size must be positive".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    split_recursive(text, &SEPARATORS, config)
}

fn split_recursive(text: &str, separators: &[&str], config: ChunkingConfig) -> Vec<String> {
    let position = separators
        .iter()
        .position(|separator| separator.is_empty() || text.contains(separator))
        .unwrap_or(separators.len().saturating_sub(1));
    let separator = separators.get(position).copied().unwrap_or("");
    let remaining = separators.get(position + 1..).unwrap_or(&[]);

    let pieces: Vec<&str> = if separator.is_empty() {
        text.char_indices()
            .map(|(index, ch)| &text[index..index + ch.len_utf8()])
            .collect()
    } else {
        text.split(separator).filter(|piece| !piece.is_empty()).collect()
    };

    let mut chunks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();

    for piece in pieces {
        if char_len(piece) < config.chunk_size {
            pending.push(piece);
            continue;
        }

        if !pending.is_empty() {
            chunks.extend(merge_pieces(&pending, separator, config));
            pending.clear();
        }

        if remaining.is_empty() {
            push_trimmed(&mut chunks, piece.to_string());
        } else {
            chunks.extend(split_recursive(piece, remaining, config));
        }
    }

    if !pending.is_empty() {
        chunks.extend(merge_pieces(&pending, separator, config));
    }

    chunks
}

fn merge_pieces(pieces: &[&str], separator: &str, config: ChunkingConfig) -> Vec<String> {
    let separator_len = char_len(separator);
    let mut merged = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = char_len(piece);
        let joiner = if window.is_empty() { 0 } else { separator_len };

        if total + len + joiner > config.chunk_size && !window.is_empty() {
            push_trimmed(&mut merged, join(&window, separator));

            // Drop from the front until what is left fits in the overlap and
            // leaves room for the incoming piece.
            while let Some(front) = window.front() {
                let over_overlap = total > config.chunk_overlap;
                let no_room = total > 0 && total + len + separator_len > config.chunk_size;
                if !over_overlap && !no_room {
                    break;
                }
                let front_joiner = if window.len() > 1 { separator_len } else { 0 };
                total = total.saturating_sub(char_len(front) + front_joiner);
                window.pop_front();
            }
        }

        window.push_back(piece);
        total += len + if window.len() > 1 { separator_len } else { 0 };
    }

    if !window.is_empty() {
        push_trimmed(&mut merged, join(&window, separator));
    }

    merged
}

fn join(window: &VecDeque<&str>, separator: &str) -> String {
    window.iter().copied().collect::<Vec<_>>().join(separator)
}

fn push_trimmed(target: &mut Vec<String>, chunk: String) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        target.push(trimmed.to_string());
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn build_chunks(
    document: &DocumentFingerprint,
    page: &PageText,
    config: ChunkingConfig,
    global_index: u64,
) -> Result<(Vec<PdfChunk>, u64), IngestError> {
    config.validate()?;

    let mut chunks = Vec::new();
    let mut cursor = global_index;

    for text in split_text(&page.text, config) {
        chunks.push(PdfChunk {
            chunk_id: make_chunk_id(&document.document_id, page.number, cursor, &text),
            document_id: document.document_id.clone(),
            source_path: document.source_path.clone(),
            title: document.document_title.clone(),
            page: page.number,
            page_label: page.label.clone(),
            chunk_index: cursor,
            text,
            ingested_at: document.ingested_at,
        });

        cursor = cursor.saturating_add(1);
    }

    Ok((chunks, cursor))
}

fn make_chunk_id(document_id: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
        }
    }

    #[test]
    fn whitespace_is_normalized() {
        let input = "A  \t  lot\nof   spacing";
        assert_eq!(normalize_whitespace(input), "A lot of spacing");
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = split_text("  Premium is payable yearly.  ", ChunkingConfig::default());
        assert_eq!(chunks, vec!["Premium is payable yearly.".to_string()]);
    }

    #[test]
    fn neighbouring_chunks_overlap_by_whole_words() {
        let chunks = split_text("aaa bbb ccc ddd eee", config(10, 4));
        assert_eq!(chunks, vec!["aaa bbb", "bbb ccc", "ccc ddd", "ddd eee"]);
    }

    #[test]
    fn paragraphs_are_kept_together_when_they_fit() {
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = split_text(text, config(30, 0));
        assert_eq!(chunks, vec!["First paragraph here.", "Second paragraph here."]);
    }

    #[test]
    fn long_words_fall_back_to_character_splits() {
        let text = "x".repeat(25);
        let chunks = split_text(&text, config(10, 2));
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 10));
        assert_eq!(chunks[0], "x".repeat(10));
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn chunks_never_exceed_the_configured_size() {
        let text = (0..400)
            .map(|index| format!("word{index}"))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = split_text(&text, ChunkingConfig::default());
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 1_000));
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        assert!(config(100, 100).validate().is_err());
        assert!(config(0, 0).validate().is_err());
        assert!(config(1_000, 200).validate().is_ok());
    }

    #[test]
    fn build_chunks_carries_page_metadata() -> Result<(), Box<dyn std::error::Error>> {
        let document = DocumentFingerprint {
            document_id: "doc-1".to_string(),
            document_title: "policy.pdf".to_string(),
            source_path: "/tmp/policy.pdf".to_string(),
            checksum: "checksum".to_string(),
            ingested_at: chrono::Utc::now(),
        };
        let page = PageText {
            number: 3,
            label: "3".to_string(),
            text: "aaa bbb ccc ddd eee".to_string(),
        };

        let (chunks, next) = build_chunks(&document, &page, config(10, 4), 7)?;

        assert_eq!(chunks.len(), 4);
        assert_eq!(next, 11);
        assert_eq!(chunks[0].chunk_index, 7);
        assert_eq!(chunks[0].page_label, "3");
        assert_eq!(chunks[0].document_id, "doc-1");
        assert_ne!(chunks[0].chunk_id, chunks[1].chunk_id);
        Ok(())
    }
}
