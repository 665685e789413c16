//! Aligns the paragraphs already stored for a unit (introduction or chapter)
//! with the paragraphs of a fresh import of the same unit.
//!
//! Paragraphs with verse markers are matched by verse range. Paragraphs
//! without any (headings, introductions) have nothing to match on, so they
//! are paired by position and must line up one to one where both sides
//! have them. Leftovers once one side is exhausted are unmatched.

use crate::models::{Paragraph, VerseRange};

/// Pairs `(existing index, new index)` in the order of both sequences, or
/// `None` when the sequences cannot be aligned.
pub fn match_paragraphs(existing: &[Paragraph], new: &[Paragraph]) -> Option<Vec<(usize, usize)>> {
    let existing: Vec<Option<VerseRange>> = existing.iter().map(Paragraph::range).collect();
    let new: Vec<Option<VerseRange>> = new.iter().map(Paragraph::range).collect();
    match_ranges(&existing, &new)
}

/// Same as [`match_paragraphs`], over precomputed ranges.
pub fn match_ranges(
    existing: &[Option<VerseRange>],
    new: &[Option<VerseRange>],
) -> Option<Vec<(usize, usize)>> {
    if existing.is_empty() || new.is_empty() {
        return Some(Vec::new());
    }

    let mut pairs = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < existing.len() || j < new.len() {
        match (existing.get(i).copied(), new.get(j).copied()) {
            (Some(None), Some(None)) => {
                let a = unranged_run(existing, i);
                let b = unranged_run(new, j);
                if a != b {
                    return None;
                }
                pairs.extend((0..a).map(|k| (i + k, j + k)));
                i += a;
                j += b;
            }
            (Some(Some(e)), Some(Some(n))) => {
                if e.overlaps(&n) {
                    let group = Group::grow(existing, new, i, j);
                    pairs.extend(group.pairs(existing, new));
                    i = group.existing_end;
                    j = group.new_end;
                } else if e.end < n.start {
                    i += 1;
                } else {
                    j += 1;
                }
            }
            (Some(Some(e)), Some(None)) => {
                if !ends_before_next_ranged(e, new, j) {
                    return None;
                }
                i += 1;
            }
            (Some(None), Some(Some(n))) => {
                if !ends_before_next_ranged(n, existing, i) {
                    return None;
                }
                j += 1;
            }
            // Leftovers on one side were removed or added.
            (Some(_), None) => i += 1,
            (None, Some(_)) => j += 1,
            (None, None) => break,
        }
    }

    Some(pairs)
}

fn unranged_run(ranges: &[Option<VerseRange>], from: usize) -> usize {
    ranges[from..].iter().take_while(|r| r.is_none()).count()
}

/// Whether `range` lies wholly before the first ranged paragraph that
/// follows the unranged run starting at `from` on the other side. With no
/// ranged paragraph after the run there is nothing left to overlap.
fn ends_before_next_ranged(range: VerseRange, other: &[Option<VerseRange>], from: usize) -> bool {
    let after_run = from + unranged_run(other, from);
    match other.get(after_run).copied().flatten() {
        Some(next) => range.end < next.start,
        None => true,
    }
}

/// Maximal run of ranged paragraphs on both sides linked by overlaps.
struct Group {
    existing_start: usize,
    existing_end: usize,
    new_start: usize,
    new_end: usize,
}

impl Group {
    fn grow(existing: &[Option<VerseRange>], new: &[Option<VerseRange>], i: usize, j: usize) -> Self {
        let mut group = Group {
            existing_start: i,
            existing_end: i + 1,
            new_start: j,
            new_end: j + 1,
        };

        loop {
            if let Some(Some(next)) = existing.get(group.existing_end) {
                if overlaps_any(next, &new[group.new_start..group.new_end]) {
                    group.existing_end += 1;
                    continue;
                }
            }
            if let Some(Some(next)) = new.get(group.new_end) {
                if overlaps_any(next, &existing[group.existing_start..group.existing_end]) {
                    group.new_end += 1;
                    continue;
                }
            }
            break;
        }
        group
    }

    fn pairs(&self, existing: &[Option<VerseRange>], new: &[Option<VerseRange>]) -> Vec<(usize, usize)> {
        let e = self.existing_start..self.existing_end;
        let n = self.new_start..self.new_end;

        // Split: one existing paragraph became several.
        if e.len() == 1 {
            return n.map(|j| (self.existing_start, j)).collect();
        }
        // Merge: several existing paragraphs became one.
        if n.len() == 1 {
            return e.map(|i| (i, self.new_start)).collect();
        }
        if e.len() == n.len() && e.clone().zip(n.clone()).all(|(i, j)| existing[i] == new[j]) {
            return e.zip(n).collect();
        }

        let mut pairs = Vec::new();
        for i in e {
            for j in n.clone() {
                if let (Some(a), Some(b)) = (existing[i], new[j]) {
                    if a.overlaps(&b) {
                        pairs.push((i, j));
                    }
                }
            }
        }
        pairs
    }
}

fn overlaps_any(range: &VerseRange, others: &[Option<VerseRange>]) -> bool {
    others.iter().flatten().any(|other| range.overlaps(other))
}

/// Index view over a pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPlan {
    pairs: Vec<(usize, usize)>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

impl MatchPlan {
    pub fn new(pairs: Vec<(usize, usize)>, existing_len: usize, new_len: usize) -> Self {
        let mut successors = vec![Vec::new(); existing_len];
        let mut predecessors = vec![Vec::new(); new_len];
        for &(i, j) in &pairs {
            successors[i].push(j);
            predecessors[j].push(i);
        }
        MatchPlan {
            pairs,
            successors,
            predecessors,
        }
    }

    /// Matches the two sequences and indexes the result.
    pub fn build(existing: &[Paragraph], new: &[Paragraph]) -> Option<Self> {
        match_paragraphs(existing, new).map(|pairs| Self::new(pairs, existing.len(), new.len()))
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    /// New paragraphs that continue existing paragraph `i`.
    pub fn successors(&self, i: usize) -> &[usize] {
        &self.successors[i]
    }

    /// Existing paragraphs that new paragraph `j` continues.
    pub fn predecessors(&self, j: usize) -> &[usize] {
        &self.predecessors[j]
    }
}
