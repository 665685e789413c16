//! Paragraph version records and the links between them.
//!
//! Key layout:
//! - `version:{id}`: the version itself
//! - `successor:{predecessor}:{id}`: one per predecessor of a version
//! - `conflict:{id}`: present once `id` has had two live successors

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use super::{from_properties, to_properties, DocumentStore, KeyRange, StoreError};
use crate::models::ParagraphVersion;

#[derive(Error, Debug)]
pub enum ParagraphError {
    #[error("Paragraph version not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

// Inside a store transaction every failure has to surface as a StoreError.
impl From<ParagraphError> for StoreError {
    fn from(err: ParagraphError) -> Self {
        match err {
            ParagraphError::NotFound(id) => StoreError::InvalidDocument {
                id,
                reason: "referenced paragraph version does not exist".to_string(),
            },
            ParagraphError::Store(e) => e,
        }
    }
}

pub fn version_key(id: &str) -> String {
    format!("version:{}", id)
}

fn successor_prefix(predecessor: &str) -> String {
    format!("successor:{}:", predecessor)
}

fn conflict_key(id: &str) -> String {
    format!("conflict:{}", id)
}

/// Stores a new version together with a successor link from each of its
/// predecessors.
pub fn write(store: &dyn DocumentStore, version: &ParagraphVersion) -> Result<(), ParagraphError> {
    let id = &version.paragraph_id;

    store.put(&version_key(id), to_properties(id, version)?)?;
    for predecessor in version.predecessors() {
        let link = json!({
            "predecessor": predecessor,
            "successor": id,
            "created": version.created,
        });
        let key = format!("{}{}", successor_prefix(predecessor), id);
        store.put(&key, to_properties(&key, &link)?)?;
    }

    debug!(
        "Inserted paragraph version {} (from {:?})",
        id, version.created_from
    );
    Ok(())
}

/// Gets a paragraph version by id
///
/// Returns None if the version doesn't exist.
pub fn get(store: &dyn DocumentStore, id: &str) -> Result<Option<ParagraphVersion>, ParagraphError> {
    store
        .get(&version_key(id))?
        .map(|properties| from_properties(id, properties))
        .transpose()
        .map_err(ParagraphError::from)
}

pub fn require(store: &dyn DocumentStore, id: &str) -> Result<ParagraphVersion, ParagraphError> {
    get(store, id)?.ok_or_else(|| ParagraphError::NotFound(id.to_string()))
}

/// Marks a version as replaced. This is the only in-place change a version
/// ever receives.
pub fn deprecate(store: &dyn DocumentStore, id: &str) -> Result<(), ParagraphError> {
    let mut version = require(store, id)?;
    if version.is_deprecated {
        return Ok(());
    }
    version.is_deprecated = true;
    store.put(&version_key(id), to_properties(id, &version)?)?;
    debug!("Deprecated paragraph version {}", id);
    Ok(())
}

/// Every version recorded as derived from `id`, in key order.
pub fn successors(store: &dyn DocumentStore, id: &str) -> Result<Vec<ParagraphVersion>, ParagraphError> {
    let links = store.query(&KeyRange::prefix(&successor_prefix(id)))?;

    let mut versions = Vec::with_capacity(links.len());
    for (key, link) in links {
        let successor = link
            .get("successor")
            .and_then(|v| v.as_str())
            .ok_or_else(|| StoreError::InvalidDocument {
                id: key.clone(),
                reason: "successor link without target".to_string(),
            })?;
        versions.push(require(store, successor)?);
    }
    Ok(versions)
}

pub fn live_successor_count(store: &dyn DocumentStore, id: &str) -> Result<usize, ParagraphError> {
    Ok(successors(store, id)?
        .iter()
        .filter(|v| !v.is_deprecated)
        .count())
}

/// Whether `id` has been split: more than one live successor.
pub fn version_splits(store: &dyn DocumentStore, id: &str) -> Result<bool, ParagraphError> {
    Ok(live_successor_count(store, id)? > 1)
}

/// Records `id` as a conflict root. The marker is written once and never
/// removed.
pub fn mark_conflict(store: &dyn DocumentStore, id: &str) -> Result<(), ParagraphError> {
    let key = conflict_key(id);
    if store.get(&key)?.is_some() {
        return Ok(());
    }
    let marker = json!({ "paragraphId": id, "flagged": Utc::now() });
    store.put(&key, to_properties(&key, &marker)?)?;
    info!("Paragraph version {} is now a conflict root", id);
    Ok(())
}

pub fn is_conflict_root(store: &dyn DocumentStore, id: &str) -> Result<bool, ParagraphError> {
    Ok(store.get(&conflict_key(id))?.is_some())
}

/// Flags `id` as a conflict root if it currently splits.
pub fn flag_if_split(store: &dyn DocumentStore, id: &str) -> Result<bool, ParagraphError> {
    if version_splits(store, id)? {
        mark_conflict(store, id)?;
        return Ok(true);
    }
    Ok(false)
}

/// Walks `created_from` links from `id` back to its root, newest first.
pub fn history(store: &dyn DocumentStore, id: &str) -> Result<Vec<ParagraphVersion>, ParagraphError> {
    let mut chain = vec![require(store, id)?];
    while let Some(parent) = chain.last().and_then(|v| v.created_from.clone()) {
        if chain.iter().any(|v| v.paragraph_id == parent) {
            return Err(StoreError::InvalidDocument {
                id: parent,
                reason: "cycle in version history".to_string(),
            }
            .into());
        }
        chain.push(require(store, &parent)?);
    }
    Ok(chain)
}
