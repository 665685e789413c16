use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::para::{main_text, Para};
use super::usx::escape_attr;
use super::verse::{Verse, VerseRange};

/// A USX `<para>`. `content` is whatever precedes the first verse marker
/// (heading text, or the tail of a verse begun in the previous paragraph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub style: String,
    pub content: Vec<Para>,
    pub verses: Vec<Verse>,
}

impl Paragraph {
    pub fn new(style: &str) -> Self {
        Paragraph {
            style: style.to_string(),
            content: Vec::new(),
            verses: Vec::new(),
        }
    }

    /// Span of the verse markers in this paragraph, `None` without any.
    pub fn range(&self) -> Option<VerseRange> {
        VerseRange::union_all(self.verses.iter().map(|v| Some(v.range)))
    }

    pub fn is_section_heading(&self, heading_styles: &[String]) -> bool {
        heading_styles.iter().any(|s| s == &self.style)
    }

    pub fn text(&self) -> String {
        let mut text = main_text(&self.content);
        for verse in &self.verses {
            text.push_str(&verse.text());
        }
        text
    }

    pub fn to_usx(&self) -> String {
        let mut out = format!("<para style=\"{}\">", escape_attr(&self.style));
        for para in &self.content {
            out.push_str(&para.to_usx());
        }
        for verse in &self.verses {
            out.push_str(&verse.to_usx());
        }
        out.push_str("</para>");
        out
    }

    /// Hex SHA-256 of the serialized paragraph; equal hashes mean equal
    /// content for reconciliation purposes.
    pub fn content_hash(&self) -> String {
        let digest = Sha256::digest(self.to_usx().as_bytes());
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CharData, TextElement};

    fn verse(start: u32, end: u32, text: &str) -> Verse {
        Verse {
            range: VerseRange::new(start, end).unwrap(),
            content: vec![Para::Text(TextElement {
                content: vec![CharData::plain(text)],
            })],
        }
    }

    #[test]
    fn test_range_spans_all_verses() {
        let mut p = Paragraph::new("p");
        p.verses.push(verse(3, 3, "a"));
        p.verses.push(verse(4, 6, "b"));
        assert_eq!(p.range(), VerseRange::new(3, 6));
    }

    #[test]
    fn test_heading_has_no_range() {
        let mut p = Paragraph::new("s1");
        p.content.push(Para::Text(TextElement {
            content: vec![CharData::plain("The Creation")],
        }));
        assert_eq!(p.range(), None);
        assert!(p.is_section_heading(&["s1".to_string()]));
        assert_eq!(p.text(), "The Creation");
    }

    #[test]
    fn test_content_hash_tracks_text() {
        let mut a = Paragraph::new("p");
        a.verses.push(verse(1, 1, "In the beginning"));
        let mut b = a.clone();
        assert_eq!(a.content_hash(), b.content_hash());

        b.verses[0] = verse(1, 1, "At the beginning");
        assert_ne!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }
}
