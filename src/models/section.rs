use serde::{Deserialize, Serialize};

use super::paragraph::Paragraph;
use super::verse::VerseRange;

/// Run of paragraphs opened by a section heading (except possibly the first
/// section of a chapter, which may start without one).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Section {
    pub content: Vec<Paragraph>,
}

impl Section {
    pub fn heading(&self, heading_styles: &[String]) -> Option<&Paragraph> {
        self.content
            .first()
            .filter(|p| p.is_section_heading(heading_styles))
    }

    pub fn range(&self) -> Option<VerseRange> {
        VerseRange::union_all(self.content.iter().map(Paragraph::range))
    }

    pub fn to_usx(&self) -> String {
        self.content
            .iter()
            .map(|p| format!("{}\n", p.to_usx()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based chapter number from the `<chapter number>` marker.
    pub index: u32,
    pub sections: Vec<Section>,
}

impl Chapter {
    /// Regroups a flat paragraph list into sections: a heading paragraph
    /// opens a new section unless it is the first paragraph of the current
    /// one.
    pub fn from_paragraphs(
        index: u32,
        paragraphs: Vec<Paragraph>,
        heading_styles: &[String],
    ) -> Self {
        let mut sections: Vec<Section> = Vec::new();
        let mut current = Section::default();
        for paragraph in paragraphs {
            if paragraph.is_section_heading(heading_styles) && !current.content.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
            current.content.push(paragraph);
        }
        if !current.content.is_empty() {
            sections.push(current);
        }
        Chapter { index, sections }
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.sections.iter().flat_map(|s| s.content.iter())
    }

    pub fn range(&self) -> Option<VerseRange> {
        VerseRange::union_all(self.sections.iter().map(Section::range))
    }

    pub fn to_usx(&self) -> String {
        let mut out = format!("<chapter number=\"{}\" style=\"c\"/>\n", self.index);
        for section in &self.sections {
            out.push_str(&section.to_usx());
        }
        out
    }
}
