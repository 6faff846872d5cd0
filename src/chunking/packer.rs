use sha2::{Digest, Sha256};

use super::normalize::{TextNormalizer, char_len};
use super::overflow::split_overflow;
use super::sections::Section;
use super::{Chunk, ChunkConfig};

const CHUNK_ID_HEX_CHARS: usize = 16;
const MAX_TITLES_PER_CHUNK: usize = 3;
const TITLE_SEPARATOR: &str = " | ";
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Stable chunk key: the first 16 hex characters of
/// SHA-256(`{doc_id}:{page_number}:{ordinal}`).
pub fn make_chunk_id(doc_id: &str, page_number: u32, ordinal: u32) -> String {
    let digest = Sha256::digest(format!("{doc_id}:{page_number}:{ordinal}").as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(CHUNK_ID_HEX_CHARS);
    hex
}

/// Document-scoped output sink. Owns the ordinal counter so every flush
/// point (packer and overflow splitter) numbers chunks in emission order.
#[derive(Debug)]
pub(super) struct ChunkEmitter<'a> {
    doc_id: &'a str,
    chunks: Vec<Chunk>,
}

impl<'a> ChunkEmitter<'a> {
    pub(super) fn new(doc_id: &'a str) -> Self {
        Self {
            doc_id,
            chunks: Vec::new(),
        }
    }

    pub(super) fn emitted(&self) -> usize {
        self.chunks.len()
    }

    pub(super) fn emit(&mut self, page_number: u32, title: Option<String>, text: String) {
        let ordinal = (self.chunks.len() + 1) as u32;
        self.chunks.push(Chunk {
            chunk_id: make_chunk_id(self.doc_id, page_number, ordinal),
            ordinal,
            page_start: page_number,
            page_end: page_number,
            title,
            text,
        });
    }

    pub(super) fn last_mut(&mut self) -> Option<&mut Chunk> {
        self.chunks.last_mut()
    }

    pub(super) fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }
}

/// Running buffer for one page: packed text, the titles that fed it and
/// its length in characters.
#[derive(Debug, Default)]
struct PageAccumulator {
    text: String,
    titles: Vec<String>,
    char_len: usize,
}

impl PageAccumulator {
    fn seeded(title: Option<String>, body: String) -> Self {
        Self::default().absorb(title, body)
    }

    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn len_with(&self, body_len: usize) -> usize {
        if self.is_empty() {
            body_len
        } else {
            self.char_len + char_len(PARAGRAPH_SEPARATOR) + body_len
        }
    }

    fn absorb(mut self, title: Option<String>, body: String) -> Self {
        let body_len = char_len(&body);
        self.char_len = self.len_with(body_len);
        if self.text.is_empty() {
            self.text = body;
        } else {
            self.text.push_str(PARAGRAPH_SEPARATOR);
            self.text.push_str(&body);
        }

        if let Some(title) = title {
            if !self.titles.contains(&title) {
                self.titles.push(title);
            }
        }
        self
    }

    fn joined_title(&self) -> Option<String> {
        if self.titles.is_empty() {
            return None;
        }
        let shown = self.titles.len().min(MAX_TITLES_PER_CHUNK);
        Some(self.titles[..shown].join(TITLE_SEPARATOR))
    }

    /// Emits the buffer (if it normalizes to anything) and hands back a
    /// fresh accumulator.
    fn flush(
        self,
        page_number: u32,
        normalizer: &TextNormalizer,
        emitter: &mut ChunkEmitter<'_>,
    ) -> Self {
        let text = normalizer.normalize(&self.text);
        if !text.is_empty() {
            emitter.emit(page_number, self.joined_title(), text);
        }
        Self::default()
    }
}

/// Greedily packs one page's sections into chunks of at most
/// `config.max_chars`, delegating oversized sections to the overflow
/// splitter and folding a short trailing remainder into the page's last
/// chunk.
pub(super) fn pack_page(
    page_number: u32,
    sections: Vec<Section>,
    config: &ChunkConfig,
    normalizer: &TextNormalizer,
    emitter: &mut ChunkEmitter<'_>,
) {
    let emitted_before_page = emitter.emitted();
    let mut accumulator = PageAccumulator::default();

    for section in sections {
        let body = normalizer.normalize(&section.body);
        if body.is_empty() {
            continue;
        }

        let body_len = char_len(&body);
        if accumulator.len_with(body_len) <= config.max_chars {
            accumulator = accumulator.absorb(section.title, body);
            continue;
        }

        if !accumulator.is_empty() {
            accumulator = accumulator.flush(page_number, normalizer, emitter);
        }

        if body_len > config.max_chars {
            split_overflow(
                page_number,
                section.title.as_deref(),
                &body,
                config,
                normalizer,
                emitter,
            );
        } else {
            accumulator = PageAccumulator::seeded(section.title, body);
        }
    }

    if accumulator.is_empty() {
        return;
    }

    let page_has_chunks = emitter.emitted() > emitted_before_page;
    if accumulator.char_len < config.min_chars && page_has_chunks {
        if let Some(previous) = emitter.last_mut() {
            let merged = format!("{}{}{}", previous.text, PARAGRAPH_SEPARATOR, accumulator.text);
            previous.text = normalizer.normalize(&merged);
        }
        return;
    }

    accumulator.flush(page_number, normalizer, emitter);
}
