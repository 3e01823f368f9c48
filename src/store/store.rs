//! File-backed record store
//!
//! One `Store` owns one directory and holds one pretty-printed JSON file
//! per record, named `<id>.json`. All writes funnel through `save`, which
//! refuses any record the repair engine would still change; nothing
//! durable ever diverges from schema.
//!
//! Concurrency: single-process, no locking. Two overlapping updates to
//! the same record both read the same snapshot and the last save wins;
//! callers serialize per identifier upstream if that matters to them.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use uuid::Uuid;

use crate::audit::{diff_records, Change, Logger};
use crate::schema::{first_divergence, Divergence, Schema, ID_FIELD};

use super::errors::{StoreError, StoreResult};
use super::migrate::{self, MigrationReport};

/// Record store over one directory, for one record type.
#[derive(Debug)]
pub struct Store {
    dir: PathBuf,
    schema: Schema,
}

impl Store {
    /// Opens a store at `dir` with the given schema.
    ///
    /// Creates the directory if missing, then sweeps every existing record
    /// through the repair engine so the whole store conforms to the schema
    /// compiled into the running program.
    ///
    /// # Errors
    ///
    /// Fails fatally on a structurally invalid schema; I/O errors from the
    /// sweep propagate.
    pub fn open(dir: impl Into<PathBuf>, schema: Schema) -> StoreResult<Self> {
        let dir = dir.into();

        schema
            .validate_structure()
            .map_err(|reason| StoreError::invalid_schema(&schema.name, reason))?;

        fs::create_dir_all(&dir).map_err(|e| {
            StoreError::io(
                format!("failed to create store directory: {}", dir.display()),
                e,
            )
        })?;

        let store = Self { dir, schema };
        let report = migrate::sweep(&store)?;

        let dir_text = store.dir.display().to_string();
        let records_text = report.scanned.to_string();
        Logger::info(
            "STORE_OPENED",
            &[
                ("dir", dir_text.as_str()),
                ("records", records_text.as_str()),
                ("type", store.schema.name.as_str()),
            ],
        );

        Ok(store)
    }

    /// Returns the store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the schema this store enforces.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Enumerates every stored record and returns those matching the
    /// predicate.
    ///
    /// One unparseable record does not abort the scan: it is skipped with
    /// a WARN. I/O errors propagate.
    pub fn find<P>(&self, predicate: P) -> StoreResult<Vec<Value>>
    where
        P: Fn(&Value) -> bool,
    {
        let mut matches = Vec::new();
        for id in self.record_ids()? {
            match self.read_record(&id) {
                Ok(record) => {
                    if predicate(&record) {
                        matches.push(record);
                    }
                }
                Err(e) if e.code() == super::errors::StoreErrorCode::MendRecordCorrupt => {
                    Logger::warn(
                        "RECORD_SKIPPED",
                        &[
                            ("reason", e.message()),
                            ("record", id.as_str()),
                            ("type", self.schema.name.as_str()),
                        ],
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(matches)
    }

    /// Returns every stored record.
    pub fn all(&self) -> StoreResult<Vec<Value>> {
        self.find(|_| true)
    }

    /// Returns the first record matching the predicate.
    ///
    /// # Errors
    ///
    /// `MEND_NOT_FOUND` if nothing matches.
    pub fn find_one<P>(&self, predicate: P) -> StoreResult<Value>
    where
        P: Fn(&Value) -> bool,
    {
        self.find(predicate)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(&self.schema.name))
    }

    /// Creates a record from a partial value.
    ///
    /// A fresh identifier is always assigned; every unsupplied field is
    /// filled from schema defaults and undeclared fields are dropped.
    pub fn create(&self, partial: Value) -> StoreResult<Value> {
        let mut record = self.schema.conform(&partial);
        let id = Uuid::new_v4().to_string();
        record[ID_FIELD] = Value::String(id.clone());

        self.save(&record)?;
        Logger::info(
            "RECORD_CREATED",
            &[("record", id.as_str()), ("type", self.schema.name.as_str())],
        );
        Ok(record)
    }

    /// Loads the first match, deep-clones it, applies `mutate` to the
    /// clone, logs the field-level diff, repairs the result and persists
    /// it. The sole sanctioned partial-update path.
    pub fn find_one_and_update<P, M>(&self, predicate: P, mutate: M) -> StoreResult<Value>
    where
        P: Fn(&Value) -> bool,
        M: FnOnce(&mut Value),
    {
        let original = self.find_one(predicate)?;
        let id = record_id(&original)?;

        let mut draft = original.clone();
        mutate(&mut draft);

        for change in diff_records(&original, &draft) {
            self.log_change(&id, &change);
        }

        let repaired = self.schema.conform(&draft);
        self.save(&repaired)?;
        Ok(repaired)
    }

    /// Erases the first match's backing file.
    ///
    /// # Errors
    ///
    /// `MEND_NOT_FOUND` if nothing matches.
    pub fn find_one_and_delete<P>(&self, predicate: P) -> StoreResult<()>
    where
        P: Fn(&Value) -> bool,
    {
        let record = self.find_one(predicate)?;
        let id = record_id(&record)?;

        let path = self.record_path(&id);
        fs::remove_file(&path).map_err(|e| {
            StoreError::io(format!("failed to delete record: {}", path.display()), e)
        })?;

        Logger::info(
            "RECORD_DELETED",
            &[("record", id.as_str()), ("type", self.schema.name.as_str())],
        );
        Ok(())
    }

    /// Low-level persistence primitive.
    ///
    /// Repairs a copy of `record`; if the repaired copy differs at all
    /// from the input, raises fatal `MEND_SCHEMA_VIOLATION` instead of
    /// persisting. The write itself is atomic: temp file in the store
    /// directory, fsync, rename.
    pub fn save(&self, record: &Value) -> StoreResult<()> {
        let repaired = self.schema.conform(record);
        if repaired != *record {
            let divergence = first_divergence(record, &repaired).unwrap_or_else(|| {
                Divergence::new("$root", "schema-conformant value", "diverging value")
            });
            let id = record
                .get(ID_FIELD)
                .and_then(Value::as_str)
                .unwrap_or("(unidentified)");
            return Err(StoreError::schema_violation(id, divergence));
        }

        let id = record_id(&repaired)?;
        self.write_record(&id, &repaired)
    }

    /// Migration primitive: loads one record by identifier, forces it
    /// through the repair engine even with no logical change requested,
    /// and persists the (possibly changed) result.
    pub fn update(&self, id: &str) -> StoreResult<Value> {
        let (record, _) = self.update_reporting(id)?;
        Ok(record)
    }

    /// Re-runs the conformance sweep over every stored record.
    pub fn migrate(&self) -> StoreResult<MigrationReport> {
        migrate::sweep(self)
    }

    /// As `update`, also reporting whether repair changed the record.
    pub(crate) fn update_reporting(&self, id: &str) -> StoreResult<(Value, bool)> {
        let stored = self.read_record(id)?;
        let mut repaired = self.schema.conform(&stored);

        // An identifier lost to an earlier schema is refilled from the
        // file name rather than left blank.
        if repaired[ID_FIELD].as_str().map_or(true, str::is_empty) {
            repaired[ID_FIELD] = Value::String(id.to_string());
        }

        let changed = repaired != stored;
        if changed {
            let detail = first_divergence(&stored, &repaired)
                .map(|d| d.to_string())
                .unwrap_or_default();
            Logger::warn(
                "RECORD_REPAIRED",
                &[
                    ("detail", detail.as_str()),
                    ("record", id),
                    ("type", self.schema.name.as_str()),
                ],
            );
        }

        self.save(&repaired)?;
        Ok((repaired, changed))
    }

    /// Lists every record identifier under the store directory, sorted.
    pub fn record_ids(&self) -> StoreResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            StoreError::io(
                format!("failed to read store directory: {}", self.dir.display()),
                e,
            )
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io("failed to read directory entry", e))?;
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn read_record(&self, id: &str) -> StoreResult<Value> {
        let path = self.record_path(id);
        let content = fs::read_to_string(&path).map_err(|e| {
            StoreError::io(format!("failed to read record: {}", path.display()), e)
        })?;

        serde_json::from_str(&content)
            .map_err(|e| StoreError::corrupt(path.display().to_string(), e.to_string()))
    }

    /// Writes a record atomically: temp file, fsync, rename.
    fn write_record(&self, id: &str, record: &Value) -> StoreResult<()> {
        let final_path = self.record_path(id);
        let tmp_path = self.dir.join(format!("{}.json.tmp", id));

        let mut content = serde_json::to_string_pretty(record).map_err(|e| {
            StoreError::io(
                "failed to serialize record",
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;
        content.push('\n');

        let mut file = File::create(&tmp_path).map_err(|e| {
            StoreError::io(format!("failed to create temp file: {}", tmp_path.display()), e)
        })?;
        file.write_all(content.as_bytes()).map_err(|e| {
            StoreError::io(format!("failed to write record: {}", tmp_path.display()), e)
        })?;
        file.sync_all().map_err(|e| {
            StoreError::io(format!("fsync failed for record: {}", tmp_path.display()), e)
        })?;
        drop(file);

        fs::rename(&tmp_path, &final_path).map_err(|e| {
            StoreError::io(
                format!("failed to move record into place: {}", final_path.display()),
                e,
            )
        })?;

        Ok(())
    }

    fn log_change(&self, id: &str, change: &Change) {
        let type_name = self.schema.name.as_str();
        match change {
            Change::Edited {
                path,
                before,
                after,
            } => Logger::info(
                "RECORD_CHANGE",
                &[
                    ("after", after.as_str()),
                    ("before", before.as_str()),
                    ("field", path.as_str()),
                    ("record", id),
                    ("type", type_name),
                ],
            ),
            Change::Added { path, value } => Logger::info(
                "RECORD_CHANGE",
                &[
                    ("added", value.as_str()),
                    ("field", path.as_str()),
                    ("record", id),
                    ("type", type_name),
                ],
            ),
            Change::Removed { path, value } => Logger::info(
                "RECORD_CHANGE",
                &[
                    ("field", path.as_str()),
                    ("record", id),
                    ("removed", value.as_str()),
                    ("type", type_name),
                ],
            ),
        }
    }
}

/// Extracts the non-empty identifier a persisted record must carry.
fn record_id(record: &Value) -> StoreResult<String> {
    match record.get(ID_FIELD).and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        Some(_) => Err(StoreError::schema_violation(
            "(unidentified)",
            Divergence::new(ID_FIELD, "generated identifier", "\"\""),
        )),
        None => Err(StoreError::schema_violation(
            "(unidentified)",
            Divergence::new(ID_FIELD, "generated identifier", "(absent)"),
        )),
    }
}
