//! Sentence-aware text chunking with overlap

use unicode_segmentation::UnicodeSegmentation;

use crate::types::{Chunk, Document};

/// Splits documents into overlapping chunks along sentence boundaries.
///
/// Sentences accumulate until the window fills; the tail of each emitted
/// chunk seeds the next one so retrieval never loses context that straddles
/// a boundary. Runs longer than the window are hard-split at character
/// boundaries with the same overlap.
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        // Overlap must leave room for forward progress
        let overlap = if chunk_size == 0 {
            0
        } else {
            overlap.min(chunk_size - 1)
        };
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    /// Split each document independently; metadata carries over to every
    /// chunk produced from it.
    pub fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for document in documents {
            self.split_document(document, &mut chunks);
        }
        chunks
    }

    fn split_document(&self, document: &Document, chunks: &mut Vec<Chunk>) {
        let text = document.text.trim();
        if text.is_empty() {
            return;
        }
        if text.len() <= self.chunk_size {
            chunks.push(Chunk::new(text.to_string(), document.metadata.clone()));
            return;
        }

        let mut current = String::new();
        for sentence in text.split_sentence_bounds() {
            if sentence.len() > self.chunk_size {
                // Flush what we have, then hard-split the oversized run
                self.push_chunk(&current, document, chunks);
                current = self.split_long_run(sentence, document, chunks);
                continue;
            }
            if !current.is_empty() && current.len() + sentence.len() > self.chunk_size {
                self.push_chunk(&current, document, chunks);
                current = self.overlap_tail(&current);
                // The carried tail must still leave room for the sentence
                if current.len() + sentence.len() > self.chunk_size {
                    current.clear();
                }
            }
            current.push_str(sentence);
        }
        self.push_chunk(&current, document, chunks);
    }

    /// Window an oversized run with fixed steps, returning the residual tail
    /// to seed the next accumulation.
    fn split_long_run(&self, run: &str, document: &Document, chunks: &mut Vec<Chunk>) -> String {
        let step = self.chunk_size - self.overlap;
        let mut start = 0;
        while run.len() - start > self.chunk_size {
            let mut end = start + self.chunk_size;
            while !run.is_char_boundary(end) {
                end -= 1;
            }
            self.push_chunk(&run[start..end], document, chunks);

            // Round the step up to a char boundary so start always advances
            let mut next = start + step;
            while next < run.len() && !run.is_char_boundary(next) {
                next += 1;
            }
            start = next;
        }
        run[start..].to_string()
    }

    fn push_chunk(&self, text: &str, document: &Document, chunks: &mut Vec<Chunk>) {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            chunks.push(Chunk::new(trimmed.to_string(), document.metadata.clone()));
        }
    }

    /// Tail of the previous chunk carried into the next, cut at a sentence
    /// or word boundary when one falls inside the overlap window.
    fn overlap_tail(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len() - self.overlap;
        while !text.is_char_boundary(start) {
            start += 1;
        }
        let tail = &text[start..];

        if let Some(pos) = tail.find(". ") {
            return tail[pos + 2..].to_string();
        }
        if let Some(pos) = tail.find(' ') {
            return tail[pos + 1..].to_string();
        }
        tail.to_string()
    }
}
