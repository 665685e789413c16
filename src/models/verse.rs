use serde::{Deserialize, Serialize};
use std::fmt;

use super::para::{main_text, Para};

/// Inclusive verse span. Single verses have `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerseRange {
    pub start: u32,
    pub end: u32,
}

impl VerseRange {
    /// Returns `None` when `start > end`.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start <= end).then_some(VerseRange { start, end })
    }

    pub fn single(verse: u32) -> Self {
        VerseRange {
            start: verse,
            end: verse,
        }
    }

    pub fn overlaps(&self, other: &VerseRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn union(&self, other: &VerseRange) -> VerseRange {
        VerseRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Folds optional ranges into their union.
    pub fn union_all(ranges: impl IntoIterator<Item = Option<VerseRange>>) -> Option<VerseRange> {
        ranges
            .into_iter()
            .flatten()
            .reduce(|acc, r| acc.union(&r))
    }
}

impl fmt::Display for VerseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub range: VerseRange,
    pub content: Vec<Para>,
}

impl Verse {
    pub fn text(&self) -> String {
        main_text(&self.content)
    }

    pub fn to_usx(&self) -> String {
        let mut out = format!("<verse number=\"{}\" style=\"v\"/>", self.range);
        for para in &self.content {
            out.push_str(&para.to_usx());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_reversed_range() {
        assert!(VerseRange::new(4, 2).is_none());
        assert_eq!(VerseRange::new(2, 4), Some(VerseRange { start: 2, end: 4 }));
    }

    #[test]
    fn test_overlaps() {
        let a = VerseRange::new(1, 3).unwrap();
        assert!(a.overlaps(&VerseRange::single(3)));
        assert!(!a.overlaps(&VerseRange::single(4)));
    }

    #[test]
    fn test_union_all_ignores_missing() {
        let ranges = vec![None, Some(VerseRange::single(5)), Some(VerseRange::new(2, 3).unwrap())];
        assert_eq!(VerseRange::union_all(ranges), VerseRange::new(2, 5));
        assert_eq!(VerseRange::union_all(vec![None, None]), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(VerseRange::single(12).to_string(), "12");
        assert_eq!(VerseRange::new(12, 14).unwrap().to_string(), "12-14");
    }
}
