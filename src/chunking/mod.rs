//! Section-aware chunking of page-structured document text.
//!
//! Pages are cut into heading-delimited sections, sections are packed into
//! size-bounded chunks, and sections that are too large on their own are
//! split at sentence (or list line) boundaries with a configurable overlap.
//! Chunks never span pages, so every chunk cites exactly one page.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

mod heading;
mod normalize;
mod overflow;
mod packer;
mod sections;

pub use heading::HeadingClassifier;
pub use normalize::TextNormalizer;
pub use packer::make_chunk_id;
pub use sections::{NO_HEADING, Section, split_into_sections};

use packer::{ChunkEmitter, pack_page};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    #[serde(rename = "page", default = "default_page_number")]
    pub page_number: u32,
    #[serde(default)]
    pub text: String,
}

fn default_page_number() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_id: String,
    pub ordinal: u32,
    pub page_start: u32,
    pub page_end: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Upper bound on packed chunk length, in characters.
    pub max_chars: usize,
    /// A page's trailing remainder shorter than this is merged into the
    /// page's previous chunk.
    pub min_chars: usize,
    /// Units repeated at the start of the next chunk after an overflow split.
    pub overlap_sentences: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: 1200,
            min_chars: 250,
            overlap_sentences: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
    headings: HeadingClassifier,
    normalizer: TextNormalizer,
}

impl Chunker {
    pub fn new(config: ChunkConfig) -> Result<Self> {
        Ok(Self {
            config,
            headings: HeadingClassifier::new()?,
            normalizer: TextNormalizer::new()?,
        })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Chunks one document. Pages are processed in the given order and
    /// ordinals run 1..=N across the whole document.
    pub fn chunk_pages(&self, doc_id: &str, pages: &[Page]) -> Vec<Chunk> {
        let mut emitter = ChunkEmitter::new(doc_id);

        for page in pages {
            let page_text = page.text.trim();
            if page_text.is_empty() {
                debug!(doc_id, page = page.page_number, "skipping empty page");
                continue;
            }

            let sections = split_into_sections(page_text, &self.headings, &self.normalizer);
            let emitted_before = emitter.emitted();
            debug!(
                doc_id,
                page = page.page_number,
                sections = sections.len(),
                titles = ?sections.iter().map(Section::display_title).collect::<Vec<&str>>(),
                "split page into sections"
            );

            pack_page(
                page.page_number,
                sections,
                &self.config,
                &self.normalizer,
                &mut emitter,
            );

            debug!(
                doc_id,
                page = page.page_number,
                chunks = emitter.emitted() - emitted_before,
                "packed page"
            );
        }

        emitter.into_chunks()
    }
}
