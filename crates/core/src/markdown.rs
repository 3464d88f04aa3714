//! Markdown export of a presentation.
//!
//! Each slide becomes a `## Slide {label}: {title}` section followed by its
//! blocks, with slides separated by horizontal rules.

use crate::messages::{SlideData, SlidesDataResponse};
use crate::types::SlideBlock;

/// Formatter for markdown export.
#[derive(Debug, Clone)]
pub struct MarkdownExporter {
    /// Note quoted under the document title.
    export_note: Option<String>,
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self {
            export_note: Some("Exported via Slides Extension".to_string()),
        }
    }
}

impl MarkdownExporter {
    /// Create an exporter with the default export note.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (or remove) the note quoted under the title.
    pub fn with_export_note(mut self, note: Option<String>) -> Self {
        self.export_note = note;
        self
    }

    /// Render a whole presentation.
    ///
    /// # Example output
    /// ```text
    /// # Rust Intro
    ///
    /// > Exported via Slides Extension
    ///
    /// ---
    ///
    /// ## Slide 0-0: Welcome
    ///
    /// Hello
    ///
    /// ---
    /// ```
    pub fn export(&self, data: &SlidesDataResponse) -> String {
        let mut out = format!("# {}\n\n", data.title);
        if let Some(note) = &self.export_note {
            out.push_str(&format!("> {}\n\n", note));
        }
        out.push_str("---\n\n");

        for slide in &data.slides {
            out.push_str(&self.format_slide(slide));
            out.push_str("---\n\n");
        }

        out
    }

    /// Render one slide section, without the trailing rule.
    pub fn format_slide(&self, slide: &SlideData) -> String {
        let mut out = format!("## Slide {}: {}\n\n", slide.slide_label, slide.title);

        if slide.blocks.is_empty() {
            // Records without block structure only have flat text.
            out.push_str(&format!("{}\n\n", slide.content));
            return out;
        }

        for block in &slide.blocks {
            out.push_str(&format_block(block));
        }
        out
    }
}

/// Render one block followed by a blank line.
pub fn format_block(block: &SlideBlock) -> String {
    match block {
        SlideBlock::Code { content, lang } => format!("```{}\n{}\n```\n\n", lang, content),
        SlideBlock::Header { content, level } => {
            format!("{} {}\n\n", "#".repeat(usize::from((*level).clamp(1, 6))), content)
        }
        SlideBlock::List { content }
        | SlideBlock::Text { content }
        | SlideBlock::Image { content } => format!("{}\n\n", content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlideIndex;

    fn sample() -> SlidesDataResponse {
        let intro = SlideIndex::new(
            1,
            0,
            "Intro",
            vec![
                SlideBlock::Header {
                    content: "Intro".to_string(),
                    level: 2,
                },
                SlideBlock::List {
                    content: "1. one\n2. two".to_string(),
                },
            ],
        );
        let code = SlideIndex::new(
            1,
            1,
            "const x = 1;",
            vec![SlideBlock::Code {
                content: "const x = 1;".to_string(),
                lang: "js".to_string(),
            }],
        );
        SlidesDataResponse::new("Rust Intro", &[intro, code])
    }

    #[test]
    fn test_export_document() {
        let md = MarkdownExporter::new().export(&sample());
        let expected = "# Rust Intro\n\n\
                        > Exported via Slides Extension\n\n\
                        ---\n\n\
                        ## Slide 1-0: Intro\n\n\
                        ## Intro\n\n\
                        1. one\n2. two\n\n\
                        ---\n\n\
                        ## Slide 1-1: const x = 1;\n\n\
                        ```js\nconst x = 1;\n```\n\n\
                        ---\n\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_export_without_note() {
        let md = MarkdownExporter::new()
            .with_export_note(None)
            .export(&SlidesDataResponse::new("Empty", &[]));
        assert_eq!(md, "# Empty\n\n---\n\n");
    }

    #[test]
    fn test_slide_without_blocks_uses_content() {
        let slide = SlideData {
            h: 0,
            v: 0,
            slide_label: "0-0".to_string(),
            title: "Old".to_string(),
            blocks: Vec::new(),
            content: "flat text".to_string(),
        };
        assert_eq!(
            MarkdownExporter::new().format_slide(&slide),
            "## Slide 0-0: Old\n\nflat text\n\n"
        );
    }

    #[test]
    fn test_header_level() {
        let block = SlideBlock::Header {
            content: "Deep".to_string(),
            level: 4,
        };
        assert_eq!(format_block(&block), "#### Deep\n\n");
    }
}
