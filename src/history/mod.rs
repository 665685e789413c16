//! Turns a paragraph alignment into version records.
//!
//! Every existing paragraph of a unit ends in exactly one outcome. Writes
//! for one existing paragraph happen in one store transaction, so a split is
//! either fully recorded or not at all. A failed transaction stops the unit;
//! paragraphs reconciled before it stay reconciled.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::database::paragraphs::{self, ParagraphError};
use crate::database::DocumentStore;
use crate::matching::MatchPlan;
use crate::models::{BookKey, NewParagraphVersion, Paragraph, ParagraphVersion, Unit};

/// What happened to one existing paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ParagraphOutcome {
    /// Unchanged; the existing version stays current.
    Retained { id: String },
    /// Replaced by a single successor.
    Superseded { from: String, to: String },
    /// Split into several successors; `from` became a conflict root.
    SplitRecorded { from: String, into: Vec<String> },
    /// No counterpart in the new text.
    Deprecated { id: String },
}

/// Result of reconciling one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReconciliation {
    /// One entry per reconciled existing paragraph, in order.
    pub outcomes: Vec<ParagraphOutcome>,
    /// Current version ids of the unit, in text order.
    pub current_ids: Vec<String>,
}

impl UnitReconciliation {
    pub fn conflict_roots(&self) -> impl Iterator<Item = &str> {
        self.outcomes.iter().filter_map(|o| match o {
            ParagraphOutcome::SplitRecorded { from, .. } => Some(from.as_str()),
            _ => None,
        })
    }

    pub fn has_conflicts(&self) -> bool {
        self.conflict_roots().next().is_some()
    }

    /// Number of versions this reconciliation wrote.
    pub fn created_count(&self, existing_ids: &[String]) -> usize {
        self.current_ids
            .iter()
            .filter(|id| !existing_ids.contains(id))
            .count()
    }
}

/// Reconciliation stopped by a store failure. `partial` describes what
/// was persisted before it: the outcomes already committed and the version
/// ids that are current now.
#[derive(Error, Debug)]
#[error("reconciliation stopped after {} paragraph(s): {source}", .partial.outcomes.len())]
pub struct ReconcileError {
    pub partial: UnitReconciliation,
    pub source: ParagraphError,
}

pub struct Reconciler<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Reconciler { store }
    }

    /// Records the transition from `existing` to `new` for one unit given
    /// their alignment `pairs` (as produced by the matcher).
    ///
    /// New paragraphs without a predecessor are written first, in a single
    /// transaction. Each existing paragraph is then reconciled in its own
    /// transaction, in order.
    pub fn reconcile_unit(
        &self,
        book: &BookKey,
        unit: Unit,
        existing: &[ParagraphVersion],
        new: &[Paragraph],
        pairs: &[(usize, usize)],
    ) -> Result<UnitReconciliation, ReconcileError> {
        let plan = MatchPlan::new(pairs.to_vec(), existing.len(), new.len());
        let mut current_ids: Vec<Option<String>> = vec![None; new.len()];
        let mut outcomes = Vec::with_capacity(existing.len());

        let fail = |source: ParagraphError,
                    outcomes: Vec<ParagraphOutcome>,
                    current: &[Option<String>]| {
            let processed = outcomes.len();
            ReconcileError {
                partial: UnitReconciliation {
                    current_ids: persisted_ids(existing, &plan, current, processed),
                    outcomes,
                },
                source,
            }
        };

        let roots: Vec<(usize, ParagraphVersion)> = (0..new.len())
            .filter(|&j| plan.predecessors(j).is_empty())
            .map(|j| (j, self.new_version(book, unit, &[], &new[j])))
            .collect();
        if let Err(e) = self.write_all(roots.iter().map(|(_, v)| v), None) {
            return Err(fail(e, outcomes, &current_ids));
        }
        for (j, version) in roots {
            current_ids[j] = Some(version.paragraph_id);
        }

        for (i, version) in existing.iter().enumerate() {
            let id = &version.paragraph_id;
            let successors = plan.successors(i);

            if let [j] = *successors {
                if plan.predecessors(j).len() == 1 && version.content_hash == new[j].content_hash() {
                    current_ids[j] = Some(id.clone());
                    outcomes.push(ParagraphOutcome::Retained { id: id.clone() });
                    continue;
                }
            }

            // Successors already current here were merged into an earlier
            // predecessor's version.
            let created: Vec<(usize, ParagraphVersion)> = successors
                .iter()
                .copied()
                .filter(|&j| current_ids[j].is_none())
                .map(|j| {
                    let predecessors: Vec<String> = plan
                        .predecessors(j)
                        .iter()
                        .map(|&k| existing[k].paragraph_id.clone())
                        .collect();
                    (j, self.new_version(book, unit, &predecessors, &new[j]))
                })
                .collect();

            let flagged = match self.write_all(created.iter().map(|(_, v)| v), Some(id.as_str())) {
                Ok(flagged) => flagged,
                Err(e) => return Err(fail(e, outcomes, &current_ids)),
            };

            for (j, created) in created {
                current_ids[j] = Some(created.paragraph_id);
            }
            let successor_ids: Vec<String> = successors
                .iter()
                .filter_map(|&j| current_ids[j].clone())
                .collect();

            let outcome = match successor_ids.len() {
                0 => ParagraphOutcome::Deprecated { id: id.clone() },
                1 if !flagged => ParagraphOutcome::Superseded {
                    from: id.clone(),
                    to: successor_ids[0].clone(),
                },
                _ => ParagraphOutcome::SplitRecorded {
                    from: id.clone(),
                    into: successor_ids,
                },
            };
            debug!("{} {}: {:?}", book, unit, outcome);
            outcomes.push(outcome);
        }

        let reconciliation = UnitReconciliation {
            outcomes,
            current_ids: current_ids.into_iter().flatten().collect(),
        };
        if reconciliation.has_conflicts() {
            info!(
                "{} {}: {} paragraph(s) split and need resolution",
                book,
                unit,
                reconciliation.conflict_roots().count()
            );
        }
        Ok(reconciliation)
    }

    fn new_version(
        &self,
        book: &BookKey,
        unit: Unit,
        predecessors: &[String],
        paragraph: &Paragraph,
    ) -> ParagraphVersion {
        ParagraphVersion::new(NewParagraphVersion {
            created_from: predecessors.first().cloned(),
            merged_from: predecessors.iter().skip(1).cloned().collect(),
            book: book.clone(),
            chapter: unit.chapter(),
            paragraph: paragraph.clone(),
        })
    }

    /// Writes `versions` in one transaction. With a `replaced` version, that
    /// version is deprecated in the same transaction and flagged as a
    /// conflict root if it now has more than one live successor; the flag
    /// is returned.
    fn write_all<'v>(
        &self,
        versions: impl Iterator<Item = &'v ParagraphVersion> + Clone,
        replaced: Option<&str>,
    ) -> Result<bool, ParagraphError> {
        let mut flagged = false;
        self.store.transaction(&mut |tx| {
            for version in versions.clone() {
                paragraphs::write(tx, version)?;
            }
            if let Some(id) = replaced {
                paragraphs::deprecate(tx, id)?;
                flagged = paragraphs::flag_if_split(tx, id)?;
            }
            Ok(())
        })?;
        Ok(flagged)
    }

    /// Records a user edit of `predecessor`. The predecessor stays live; if
    /// it now has two live successors it becomes a conflict root.
    pub fn record_edit(
        &self,
        predecessor: &str,
        paragraph: Paragraph,
    ) -> Result<ParagraphVersion, ParagraphError> {
        let base = paragraphs::require(self.store, predecessor)?;
        let version = ParagraphVersion::new(NewParagraphVersion {
            created_from: Some(base.paragraph_id.clone()),
            merged_from: Vec::new(),
            book: base.book.clone(),
            chapter: base.chapter,
            paragraph,
        });

        self.store.transaction(&mut |tx| {
            paragraphs::write(tx, &version)?;
            paragraphs::flag_if_split(tx, &base.paragraph_id)?;
            Ok(())
        })?;
        Ok(version)
    }

    pub fn version_splits(&self, id: &str) -> Result<bool, ParagraphError> {
        paragraphs::version_splits(self.store, id)
    }

    pub fn successors(&self, id: &str) -> Result<Vec<ParagraphVersion>, ParagraphError> {
        paragraphs::successors(self.store, id)
    }

    pub fn history(&self, id: &str) -> Result<Vec<ParagraphVersion>, ParagraphError> {
        paragraphs::history(self.store, id)
    }

    pub fn is_conflict_root(&self, id: &str) -> Result<bool, ParagraphError> {
        paragraphs::is_conflict_root(self.store, id)
    }
}

/// Version ids current after reconciliation stopped at existing paragraph
/// `processed`, in text order. New paragraphs contribute the id written
/// for them. Existing paragraphs from `processed` on were never reached and
/// stay current in place of their unwritten successors.
fn persisted_ids(
    existing: &[ParagraphVersion],
    plan: &MatchPlan,
    current: &[Option<String>],
    processed: usize,
) -> Vec<String> {
    let mut ids = Vec::new();
    let mut next = 0;
    let keep = |i: usize, ids: &mut Vec<String>| {
        if i >= processed {
            ids.push(existing[i].paragraph_id.clone());
        }
    };

    for (j, current) in current.iter().enumerate() {
        let predecessors = plan.predecessors(j);
        // Unmatched existing paragraphs ahead of this one.
        while next < existing.len() {
            let ahead = match predecessors.first() {
                Some(&first) => next < first,
                None => plan.successors(next).is_empty(),
            };
            if !ahead {
                break;
            }
            keep(next, &mut ids);
            next += 1;
        }

        let last = predecessors.last().copied();
        match current {
            Some(id) => ids.push(id.clone()),
            None => {
                for &i in predecessors.iter().filter(|&&i| i >= next) {
                    keep(i, &mut ids);
                }
            }
        }
        if let Some(last) = last {
            next = next.max(last + 1);
        }
    }

    for i in next..existing.len() {
        keep(i, &mut ids);
    }
    ids
}
