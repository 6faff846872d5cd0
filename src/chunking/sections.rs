use super::heading::HeadingClassifier;
use super::normalize::TextNormalizer;

/// Display form of a section that has no heading line above it.
pub const NO_HEADING: &str = "(no heading)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// `None` stands for the "(no heading)" sentinel.
    pub title: Option<String>,
    pub body: String,
}

impl Section {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(NO_HEADING)
    }
}

#[derive(Debug, Default)]
struct SectionDraft {
    title: Option<String>,
    body_lines: Vec<String>,
}

impl SectionDraft {
    fn push_line(&mut self, line: &str) {
        if !line.trim().is_empty() {
            self.body_lines.push(line.to_string());
            return;
        }

        // one blank line between paragraphs, never leading or repeated
        if self.body_lines.last().is_some_and(|last| !last.is_empty()) {
            self.body_lines.push(String::new());
        }
    }

    fn finish(self) -> Option<Section> {
        if self.title.is_none() && self.body_lines.is_empty() {
            return None;
        }

        let body = self.body_lines.join("\n").trim().to_string();
        if body.is_empty() {
            return None;
        }

        Some(Section {
            title: self.title,
            body,
        })
    }
}

pub fn split_into_sections(
    page_text: &str,
    headings: &HeadingClassifier,
    normalizer: &TextNormalizer,
) -> Vec<Section> {
    let mut sections = Vec::<Section>::new();
    let mut draft = SectionDraft::default();

    for raw_line in normalizer.split_lines(page_text) {
        let line = raw_line.trim_end();
        if headings.is_heading(line) {
            let finished = std::mem::take(&mut draft);
            sections.extend(finished.finish());
            draft.title = Some(line.trim().to_string());
        } else {
            draft.push_line(line);
        }
    }
    sections.extend(draft.finish());

    if sections.is_empty() {
        return vec![Section {
            title: None,
            body: page_text.trim().to_string(),
        }];
    }

    sections
        .into_iter()
        .filter_map(|section| {
            let body = normalizer.normalize(&section.body);
            (!body.is_empty()).then_some(Section {
                title: section.title,
                body,
            })
        })
        .collect()
}
