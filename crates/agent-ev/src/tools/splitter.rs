//! Recursive character text splitter

use crate::tools::document_loader::Document;
use std::collections::VecDeque;

const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Splits text into overlapping chunks, preferring paragraph, then line,
/// then word boundaries
///
/// Lengths are measured in characters.
#[derive(Debug, Clone)]
pub struct RecursiveCharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl Default for RecursiveCharacterTextSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl RecursiveCharacterTextSplitter {
    /// Create a splitter; an overlap not smaller than the chunk size is clamped
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
            separators: DEFAULT_SEPARATORS.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(text, &separators)
    }

    /// Split every document, copying its metadata onto each chunk
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .map(|chunk| Document {
                        content: chunk,
                        metadata: doc.metadata.clone(),
                    })
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        for split in splits {
            if char_len(&split) < self.chunk_size {
                pending.push(split);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge_splits(&pending, separator));
                pending.clear();
            }
            if remaining.is_empty() {
                chunks.push(split);
            } else {
                chunks.extend(self.split_recursive(&split, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge_splits(&pending, separator));
        }
        chunks
    }

    /// Greedily join small pieces into chunks, carrying up to
    /// `chunk_overlap` characters of trailing pieces into the next chunk
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for split in splits {
            let len = char_len(split);
            let joiner = if current.is_empty() { 0 } else { separator_len };

            if total + len + joiner > self.chunk_size && !current.is_empty() {
                push_joined(&mut chunks, &current, separator);

                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if current.is_empty() { 0 } else { separator_len }
                            > self.chunk_size)
                {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    total -= char_len(first) + if current.is_empty() { 0 } else { separator_len };
                }
            }

            total += len + if current.is_empty() { 0 } else { separator_len };
            current.push_back(split);
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

fn push_joined(chunks: &mut Vec<String>, pieces: &VecDeque<&str>, separator: &str) {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = RecursiveCharacterTextSplitter::default();
        assert_eq!(splitter.split_text("Tesla cut prices."), vec!["Tesla cut prices."]);
        assert!(splitter.split_text("").is_empty());
    }

    #[test]
    fn test_paragraphs_are_merged_up_to_chunk_size() {
        let splitter = RecursiveCharacterTextSplitter::new(20, 0);
        let chunks = splitter.split_text("aaaa bbbb\n\ncccc dddd\n\neeee");
        assert_eq!(chunks, vec!["aaaa bbbb\n\ncccc dddd", "eeee"]);
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let splitter = RecursiveCharacterTextSplitter::new(10, 4);
        let chunks = splitter.split_text("one two three four five six");

        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.first().map(String::as_str), Some("one two"));
        // Consecutive chunks share a trailing word
        assert!(chunks.windows(2).any(|w| {
            let last_word = w[0].split(' ').next_back().unwrap_or_default();
            w[1].starts_with(last_word)
        }));
        assert!(chunks.last().unwrap().ends_with("six"));
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let splitter = RecursiveCharacterTextSplitter::new(4, 0);
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let splitter = RecursiveCharacterTextSplitter::new(5, 0);
        let chunks = splitter.split_text("배터리공급망분석");
        assert_eq!(chunks, vec!["배터리공급", "망분석"]);
    }

    #[test]
    fn test_split_documents_copies_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert("company".to_string(), "BYD".to_string());
        let doc = Document {
            content: "alpha beta\n\ngamma delta".to_string(),
            metadata,
        };

        let chunks = RecursiveCharacterTextSplitter::new(12, 0).split_documents(&[doc]);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.metadata["company"] == "BYD"));
    }
}
