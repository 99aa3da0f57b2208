//! Sliding-window chunking with configurable size and overlap.
//!
//! Windows are measured in characters (Unicode scalar values), so a window
//! never splits a code point. Text is kept verbatim: no trimming, and the
//! final window of a document is emitted however short it is.

use crate::config::ChunkSettings;
use crate::types::{Chunk, RawDocument};
use hipaa_core::{AppError, AppResult};
use sha2::{Digest, Sha256};

/// Split documents into chunks, preserving provenance.
///
/// `sequence_index` restarts at zero for every document.
pub fn split_documents(documents: &[RawDocument], settings: ChunkSettings) -> AppResult<Vec<Chunk>> {
    let mut chunks = Vec::new();

    for document in documents {
        for (sequence_index, text) in split_text(&document.text, settings)?.into_iter().enumerate() {
            let sequence_index = sequence_index as u32;
            chunks.push(Chunk {
                id: chunk_id(document, sequence_index, text),
                text: text.to_string(),
                source_path: document.source_path.clone(),
                page: document.page,
                sequence_index,
            });
        }
    }

    tracing::debug!(
        "Chunked {} documents into {} chunks (size: {}, overlap: {})",
        documents.len(),
        chunks.len(),
        settings.chunk_size,
        settings.overlap
    );

    Ok(chunks)
}

/// Split one text into windows of at most `chunk_size` characters.
///
/// Each window starts `chunk_size - overlap` characters after the previous
/// one; splitting stops at the first window that reaches the end of the text.
pub fn split_text(text: &str, settings: ChunkSettings) -> AppResult<Vec<&str>> {
    let ChunkSettings {
        chunk_size,
        overlap,
    } = settings;

    if chunk_size == 0 {
        return Err(AppError::Config(
            "Chunk size must be greater than zero".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(AppError::Config(format!(
            "Chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, chunk_size
        )));
    }

    // Byte offset of every character start, plus the end of the text
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let step = chunk_size - overlap;
    let mut windows = Vec::new();
    let mut start = 0;

    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        windows.push(&text[boundaries[start]..boundaries[end]]);
        if end == char_count {
            break;
        }
        start += step;
    }

    Ok(windows)
}

/// Stable chunk id: the same document, position and text always hash the same.
fn chunk_id(document: &RawDocument, sequence_index: u32, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(document.source_path.to_string_lossy().as_bytes());
    hasher.update([0]);
    hasher.update(document.page.unwrap_or(0).to_le_bytes());
    hasher.update(sequence_index.to_le_bytes());
    hasher.update(text.as_bytes());

    hasher
        .finalize()
        .iter()
        .take(16)
        .map(|byte| format!("{:02x}", byte))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(chunk_size: usize, overlap: usize) -> ChunkSettings {
        ChunkSettings {
            chunk_size,
            overlap,
        }
    }

    fn document(text: &str) -> RawDocument {
        RawDocument {
            text: text.to_string(),
            source_path: PathBuf::from("corpus/privacy.txt"),
            page: Some(2),
        }
    }

    /// Sample texts with varied lengths and multi-byte characters.
    fn samples() -> Vec<String> {
        vec![
            String::new(),
            "x".to_string(),
            "HIPAA protects patient privacy. Violations can incur fines.".to_string(),
            "a".repeat(500),
            "b".repeat(501),
            "§ 164.502 Uses and disclosures — général. ".repeat(40),
            (0..1234).map(|i| char::from(b'a' + (i % 26) as u8)).collect(),
        ]
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let text = "HIPAA protects patient privacy. Violations can incur fines.";
        let windows = split_text(text, ChunkSettings::default()).unwrap();
        assert_eq!(windows, vec![text]);
    }

    #[test]
    fn test_window_positions() {
        let text = "a".repeat(1000);
        let windows = split_text(&text, settings(500, 100)).unwrap();
        let lengths: Vec<usize> = windows.iter().map(|w| w.chars().count()).collect();
        // Starts at 0, 400, 800
        assert_eq!(lengths, vec![500, 500, 200]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split_text("", ChunkSettings::default()).unwrap().is_empty());
    }

    #[test]
    fn test_size_bound() {
        for geometry in [settings(500, 100), settings(7, 3), settings(1, 0)] {
            for text in samples() {
                for window in split_text(&text, geometry).unwrap() {
                    assert!(window.chars().count() <= geometry.chunk_size);
                }
            }
        }
    }

    #[test]
    fn test_every_character_is_covered() {
        for geometry in [settings(500, 100), settings(7, 3), settings(10, 0)] {
            for text in samples() {
                let chars: Vec<char> = text.chars().collect();
                let windows = split_text(&text, geometry).unwrap();
                let step = geometry.chunk_size - geometry.overlap;

                let mut covered = vec![false; chars.len()];
                for (i, window) in windows.iter().enumerate() {
                    let start = i * step;
                    let window_chars: Vec<char> = window.chars().collect();
                    assert_eq!(&chars[start..start + window_chars.len()], &window_chars[..]);
                    for flag in &mut covered[start..start + window_chars.len()] {
                        *flag = true;
                    }
                }
                assert!(covered.iter().all(|c| *c));
            }
        }
    }

    #[test]
    fn test_adjacent_windows_share_overlap() {
        for geometry in [settings(500, 100), settings(7, 3)] {
            for text in samples() {
                let windows = split_text(&text, geometry).unwrap();
                for pair in windows.windows(2) {
                    let tail: String = pair[0]
                        .chars()
                        .skip(geometry.chunk_size - geometry.overlap)
                        .collect();
                    assert_eq!(tail.chars().count(), geometry.overlap);
                    assert!(pair[1].starts_with(&tail));
                }
            }
        }
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(matches!(
            split_text("abc", settings(0, 0)),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            split_text("abc", settings(100, 100)),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_provenance_and_sequence() {
        let docs = vec![document(&"z".repeat(900)), document("second")];
        let chunks = split_documents(&docs, ChunkSettings::default()).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].sequence_index, 0);
        assert_eq!(chunks[1].sequence_index, 1);
        assert_eq!(chunks[2].sequence_index, 0);
        assert!(chunks.iter().all(|c| c.page == Some(2)));
        assert!(chunks
            .iter()
            .all(|c| c.source_path == PathBuf::from("corpus/privacy.txt")));
    }

    #[test]
    fn test_chunk_ids_are_stable_and_distinct() {
        let docs = vec![document(&"y".repeat(900))];
        let first = split_documents(&docs, ChunkSettings::default()).unwrap();
        let second = split_documents(&docs, ChunkSettings::default()).unwrap();

        assert_eq!(first[0].id, second[0].id);
        assert_ne!(first[0].id, first[1].id);
        assert_eq!(first[0].id.len(), 32);
    }
}
