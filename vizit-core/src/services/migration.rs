//! Owner migration service - backfills the owner uid on visit documents
//!
//! Records imported before per-user ownership existed have no `ownerUid`.
//! This service scans the collection page by page, classifies every
//! document, and stamps a resolved uid onto the ownerless ones.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::ports::{OwnerAssignment, VisitStore};

/// Documents per scan page unless the caller asks otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 400;

/// Largest allowed scan page; also the flush threshold cap for updates.
const MAX_PAGE_SIZE: usize = 500;

/// Clamp a requested page size into the supported range. Zero means
/// "use the default".
pub fn normalize_page_size(requested: usize) -> usize {
    if requested > 0 {
        requested.min(MAX_PAGE_SIZE)
    } else {
        DEFAULT_PAGE_SIZE
    }
}

/// A uid that is usable as an owner: a non-empty string, trimmed.
fn normalize_uid(value: &JsonValue) -> Option<String> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Uid mapping loaded from a map file.
///
/// Two shapes are accepted: `{"defaultUid": ..., "byDocId": {...}}`, or a
/// flat `{docId: uid}` object. Entries whose uid is not a non-empty
/// string are dropped.
#[derive(Debug, Default, Clone)]
pub struct OwnerMap {
    pub default_uid: Option<String>,
    pub by_doc_id: HashMap<String, String>,
}

impl OwnerMap {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read map file {}: {}", path.display(), e))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: JsonValue = serde_json::from_str(raw)?;
        let object = match parsed.as_object() {
            Some(object) => object,
            None => anyhow::bail!("Map file must be a JSON object."),
        };

        // The presence of either structured key decides the shape.
        if object.contains_key("byDocId") || object.contains_key("defaultUid") {
            let by_doc_id = object
                .get("byDocId")
                .and_then(JsonValue::as_object)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|(doc_id, uid)| Some((doc_id.clone(), normalize_uid(uid)?)))
                        .collect()
                })
                .unwrap_or_default();

            return Ok(Self {
                default_uid: object.get("defaultUid").and_then(normalize_uid),
                by_doc_id,
            });
        }

        let by_doc_id = object
            .iter()
            .filter_map(|(doc_id, uid)| Some((doc_id.clone(), normalize_uid(uid)?)))
            .collect();

        Ok(Self {
            default_uid: None,
            by_doc_id,
        })
    }
}

/// Per-run knobs, mirroring the CLI flags.
#[derive(Debug, Clone, Default)]
pub struct MigrationOptions {
    /// Write the resolved uids; a dry run only counts.
    pub apply: bool,
    /// Assign every ownerless document to this uid.
    pub all_to_uid: Option<String>,
    /// Per-document mapping, consulted before `all_to_uid`.
    pub map: Option<OwnerMap>,
    /// Documents per scan page; zero means the default.
    pub page_size: usize,
    /// Stop assigning after this many documents; zero means no limit.
    pub limit: usize,
}

/// Counters reported after a run. A dry run fills everything except
/// `updated`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationSummary {
    pub scanned: usize,
    pub already_owned: usize,
    pub ownerless: usize,
    pub assigned: usize,
    pub skipped_no_uid: usize,
    pub updated: usize,
}

/// Owner migration service
pub struct MigrationService<S: VisitStore> {
    store: Arc<S>,
}

impl<S: VisitStore> MigrationService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve the target uid for one document: per-document mapping
    /// first, then the global override, then the map's default.
    fn target_uid<'a>(&self, doc_id: &str, options: &'a MigrationOptions) -> Option<&'a str> {
        if let Some(map) = &options.map {
            if let Some(uid) = map.by_doc_id.get(doc_id) {
                return Some(uid);
            }
        }

        if let Some(uid) = options.all_to_uid.as_deref() {
            if !uid.is_empty() {
                return Some(uid);
            }
        }

        options.map.as_ref()?.default_uid.as_deref()
    }

    /// Scan the whole collection and stamp owners onto ownerless
    /// documents.
    ///
    /// Updates accumulate across page boundaries and are flushed once a
    /// full page worth of them is pending, plus a final partial flush.
    /// The scan only stops on an empty page, so a short page mid-scan
    /// does not end the run early.
    pub fn run(&self, options: &MigrationOptions) -> Result<MigrationSummary> {
        let page_size = normalize_page_size(options.page_size);
        let mut summary = MigrationSummary::default();
        let mut cursor: Option<String> = None;
        let mut pending: Vec<OwnerAssignment> = Vec::new();

        loop {
            let page = self.store.scan_page(cursor.as_deref(), page_size)?;
            if page.is_empty() {
                break;
            }
            debug!("Scanned a page of {} documents", page.len());

            for stub in &page {
                summary.scanned += 1;

                let existing_owner = stub
                    .owner_uid
                    .as_deref()
                    .map(str::trim)
                    .filter(|uid| !uid.is_empty());
                if existing_owner.is_some() {
                    summary.already_owned += 1;
                    continue;
                }

                summary.ownerless += 1;

                if options.limit > 0 && summary.assigned >= options.limit {
                    continue;
                }

                let target_uid = match self.target_uid(&stub.id, options) {
                    Some(uid) => uid,
                    None => {
                        summary.skipped_no_uid += 1;
                        continue;
                    }
                };

                summary.assigned += 1;

                if !options.apply {
                    continue;
                }

                pending.push(OwnerAssignment {
                    doc_id: stub.id.clone(),
                    owner_uid: target_uid.to_string(),
                });

                if pending.len() >= page_size {
                    summary.updated += self.store.assign_owners(&pending)?;
                    pending.clear();
                }
            }

            cursor = page.last().map(|stub| stub.id.clone());
        }

        if options.apply && !pending.is_empty() {
            summary.updated += self.store.assign_owners(&pending)?;
        }

        Ok(summary)
    }
}
