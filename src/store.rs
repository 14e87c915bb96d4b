use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{info, warn};

/// A student record is an open string-keyed mapping: the extracted fields
/// plus the `source_file`/`extraction_time` provenance keys. The store file
/// has no schema beyond that.
pub type FieldMap = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to read store file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("store file {} is not a valid record array: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write store file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReconcileCounts {
    pub added: usize,
    pub updated: usize,
}

pub struct StoreStats {
    pub entries: usize,
    /// (field name, number of entries carrying it), most common first.
    pub field_coverage: Vec<(String, usize)>,
}

/// The persisted record store: a flat JSON array of field mappings.
///
/// Every access goes through one mutex, and `reconcile` holds it for a whole
/// document's worth of upserts, so two concurrent ingests can never both
/// decide a name is new and append it twice.
pub struct Store {
    path: PathBuf,
    entries: Mutex<Vec<FieldMap>>,
}

impl Store {
    /// Load the store from `path`. A missing file is an empty store; an
    /// unreadable or malformed file is fatal for the request.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let entries: Vec<FieldMap> = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        info!("loaded {} student records from {}", entries.len(), path.display());
        Ok(Store {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let entries = self.entries.lock().unwrap();
        let json = serde_json::to_string_pretty(&*entries).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!("saved {} student records to {}", entries.len(), self.path.display());
        Ok(())
    }

    /// Upsert a document's completed records, deduplicating on the lowercased
    /// name. The first matching entry wins and absorbs the record's fields
    /// (later values override); unmatched records are appended.
    ///
    /// The whole scan-then-write pass runs under the store lock.
    pub fn reconcile(&self, records: &[FieldMap]) -> ReconcileCounts {
        let mut entries = self.entries.lock().unwrap();
        let mut counts = ReconcileCounts::default();

        for record in records {
            let Some(name) = record.get("name").filter(|n| !n.is_empty()) else {
                warn!("skipping student record without a name");
                continue;
            };
            let key = name.to_lowercase();

            let existing = entries
                .iter_mut()
                .find(|entry| entry.get("name").is_some_and(|n| n.to_lowercase() == key));

            match existing {
                Some(entry) => {
                    for (field, value) in record {
                        entry.insert(field.clone(), value.clone());
                    }
                    info!("updated existing student record for {}", name);
                    counts.updated += 1;
                }
                None => {
                    entries.push(record.clone());
                    info!("added new student record for {}", name);
                    counts.added += 1;
                }
            }
        }

        counts
    }

    /// Case-insensitive substring search over entry names, in store order.
    pub fn search(&self, query: &str) -> Vec<FieldMap> {
        let needle = query.to_lowercase();
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .filter(|entry| {
                entry
                    .get("name")
                    .map(|n| n.to_lowercase())
                    .unwrap_or_default()
                    .contains(&needle)
            })
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> Vec<FieldMap> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StoreStats {
        let entries = self.entries.lock().unwrap();
        let mut coverage: BTreeMap<String, usize> = BTreeMap::new();
        for entry in entries.iter() {
            for field in entry.keys() {
                *coverage.entry(field.clone()).or_default() += 1;
            }
        }
        let mut field_coverage: Vec<(String, usize)> = coverage.into_iter().collect();
        field_coverage.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        StoreStats {
            entries: entries.len(),
            field_coverage,
        }
    }
}

// ── Tests ──
