use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone)]
pub struct TextNormalizer {
    horizontal_whitespace: Regex,
    blank_line_runs: Regex,
    line_breaks: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            horizontal_whitespace: Regex::new(r"[ \t]+")
                .context("failed to compile horizontal whitespace regex")?,
            blank_line_runs: Regex::new(r"\n{3,}").context("failed to compile blank line regex")?,
            line_breaks: Regex::new(r"\r\n|[\n\r\x0B\x0C\x1C-\x1E\x{85}\x{2028}\x{2029}]")
                .context("failed to compile line break regex")?,
        })
    }

    /// Collapses runs of spaces/tabs to one space and 3+ newlines to a single
    /// blank line, then trims both ends. Newlines themselves are kept because
    /// the heading and list heuristics depend on line structure.
    pub fn normalize(&self, text: &str) -> String {
        let collapsed = self.horizontal_whitespace.replace_all(text, " ");
        let collapsed = self.blank_line_runs.replace_all(&collapsed, "\n\n");
        collapsed.trim().to_string()
    }

    /// Splits on every line boundary, not just `\n`: bare `\r`, vertical tab,
    /// form feed, the file/group/record separators, NEL and the Unicode
    /// line/paragraph separators all end a line. A trailing boundary does
    /// not yield an extra empty line.
    pub fn split_lines<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut lines: Vec<&'t str> = self.line_breaks.split(text).collect();
        if lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        lines
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits on whitespace that follows `.`, `?` or `!` and precedes an
/// uppercase letter, digit, quote or opening bracket. Fragments are trimmed
/// and empty ones dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut previous: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        if !(ch.is_whitespace() && matches!(previous, Some('.' | '?' | '!'))) {
            previous = Some(ch);
            continue;
        }

        let mut run_end = index + ch.len_utf8();
        while let Some(&(next_index, next_ch)) = chars.peek() {
            if !next_ch.is_whitespace() {
                break;
            }
            run_end = next_index + next_ch.len_utf8();
            chars.next();
        }

        let starts_sentence = chars
            .peek()
            .is_some_and(|&(_, next_ch)| opens_sentence(next_ch));
        if starts_sentence {
            push_fragment(&mut sentences, &text[start..index]);
            start = run_end;
        }
        previous = Some(' ');
    }

    push_fragment(&mut sentences, &text[start..]);
    sentences
}

fn opens_sentence(ch: char) -> bool {
    ch.is_ascii_uppercase() || ch.is_ascii_digit() || matches!(ch, '"' | '(' | '[')
}

fn push_fragment(out: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
