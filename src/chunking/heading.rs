use anyhow::{Context, Result};
use regex::Regex;

const MIN_HEADING_CHARS: usize = 6;

/// Lexical heading detector tuned for governance documents (agendas,
/// minutes, policies). Each pattern is evaluated independently against the
/// trimmed line; any match classifies the line as a heading.
#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    patterns: Vec<Regex>,
}

impl HeadingClassifier {
    pub fn new() -> Result<Self> {
        let sources = [
            // BOARD RESOLUTIONS
            r"^\s*[A-Z][A-Z0-9\s&/,\-]{6,}\s*$",
            // 1. / 1.1 / 2) Scope of Audit
            r"^\s*(\d+(\.\d+)*)\s*[\)\.]?\s+[A-Za-z].{2,}$",
            // A) Background
            r"^\s*[A-Z]\)\s+[A-Za-z].{2,}$",
            // Action Items:
            r"^\s*[A-Za-z][A-Za-z\s&/\-]{3,}:\s*$",
        ];

        let patterns = sources
            .iter()
            .map(|source| {
                Regex::new(source)
                    .with_context(|| format!("failed to compile heading pattern {source}"))
            })
            .collect::<Result<Vec<Regex>>>()?;

        Ok(Self { patterns })
    }

    pub fn is_heading(&self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() || line.chars().count() < MIN_HEADING_CHARS {
            return false;
        }

        self.patterns.iter().any(|pattern| pattern.is_match(line))
    }
}
