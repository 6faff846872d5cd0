use super::normalize::{TextNormalizer, char_len, split_sentences};
use super::packer::ChunkEmitter;
use super::ChunkConfig;

const LIST_MIN_NEWLINES: usize = 6;
const BULLET_GLYPH: char = '•';

/// Breaks an oversized body into packable units: one per non-blank line for
/// list-like text, otherwise one per sentence.
pub(super) fn split_into_units(body: &str, normalizer: &TextNormalizer) -> Vec<String> {
    let text = normalizer.normalize(body);
    if text.is_empty() {
        return Vec::new();
    }

    if looks_like_list(&text) {
        return text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect();
    }

    split_sentences(&text)
}

// Hyphenated prose with enough line breaks also qualifies.
fn looks_like_list(text: &str) -> bool {
    text.matches('\n').count() >= LIST_MIN_NEWLINES
        && (text.contains(BULLET_GLYPH) || text.contains('-'))
}

#[derive(Debug, Default)]
struct UnitWindow {
    units: Vec<String>,
    char_len: usize,
}

impl UnitWindow {
    fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn push(&mut self, unit: String) {
        self.char_len += unit_cost(&unit);
        self.units.push(unit);
    }

    fn text(&self) -> String {
        self.units.join(" ").trim().to_string()
    }

    /// Keeps the trailing `overlap` units as the start of the next window.
    fn carry_over(mut self, overlap: usize) -> Self {
        let keep = overlap.min(self.units.len());
        let units = self.units.split_off(self.units.len() - keep);
        let char_len = units.iter().map(|unit| unit_cost(unit)).sum();
        Self { units, char_len }
    }
}

fn unit_cost(unit: &str) -> usize {
    char_len(unit) + 1
}

pub(super) fn split_overflow(
    page_number: u32,
    title: Option<&str>,
    body: &str,
    config: &ChunkConfig,
    normalizer: &TextNormalizer,
    emitter: &mut ChunkEmitter<'_>,
) {
    let mut units = split_into_units(body, normalizer);
    if units.is_empty() {
        units.push(body.to_string());
    }

    let title = title.map(ToOwned::to_owned);
    let mut window = UnitWindow::default();

    for unit in units {
        let unit = unit.trim();
        if unit.is_empty() {
            continue;
        }

        if window.char_len + unit_cost(unit) > config.max_chars && !window.is_empty() {
            emitter.emit(page_number, title.clone(), window.text());
            window = window.carry_over(config.overlap_sentences);
        }
        window.push(unit.to_string());
    }

    if !window.is_empty() {
        emitter.emit(page_number, title, window.text());
    }
}
