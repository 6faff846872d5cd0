use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::chunking::Page;

const PAGE_SEPARATOR: char = '\u{000C}';
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md"];
const PAGES_EXTENSION: &str = "json";

/// Supplies a document's ordered pages. OCR and binary format parsing happen
/// upstream; implementations only read text that is already extracted.
pub trait TextExtractor {
    fn extract(&self, path: &Path, bytes: &[u8]) -> Result<Vec<Page>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTextExtractor;

impl TextExtractor for LocalTextExtractor {
    fn extract(&self, path: &Path, bytes: &[u8]) -> Result<Vec<Page>> {
        match lowercase_extension(path).as_deref() {
            Some(PAGES_EXTENSION) => serde_json::from_slice::<Vec<Page>>(bytes)
                .with_context(|| format!("failed to parse pages json: {}", path.display())),
            Some(extension) if TEXT_EXTENSIONS.contains(&extension) => {
                Ok(split_form_feed_pages(&String::from_utf8_lossy(bytes)))
            }
            _ => bail!(
                "unsupported document format: {} (extract text upstream and supply a .json pages file)",
                path.display()
            ),
        }
    }
}

pub fn is_supported_document(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|extension| {
        extension == PAGES_EXTENSION || TEXT_EXTENSIONS.contains(&extension.as_str())
    })
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Splits plain text on form feeds (the page break `pdftotext` emits) into
/// pages numbered from 1, dropping NULs and trailing blank pages.
pub fn split_form_feed_pages(raw: &str) -> Vec<Page> {
    let mut pages: Vec<String> = raw
        .split(PAGE_SEPARATOR)
        .map(|page| page.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
        .into_iter()
        .enumerate()
        .map(|(index, text)| Page {
            page_number: (index + 1) as u32,
            text,
        })
        .collect()
}
