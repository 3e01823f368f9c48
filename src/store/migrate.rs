//! Start-up migration sweep
//!
//! Runs at store open: every existing record is forced through the repair
//! engine, synchronously bringing the whole directory into conformance
//! with the schema compiled into the running program. Cost scales with
//! store size and is paid once, replacing hand-written migration scripts
//! when a schema's shape changes between releases.
//!
//! Unreadable records are skipped with a WARN (per-record isolation);
//! I/O errors propagate.

use crate::audit::Logger;

use super::errors::{StoreErrorCode, StoreResult};
use super::store::Store;

/// Outcome of one conformance sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Records successfully forced through the repair engine
    pub scanned: usize,
    /// Of those, records the repair engine actually changed
    pub repaired: usize,
    /// Unreadable records left in place
    pub skipped: usize,
}

/// Sweeps every record under the store through the repair engine.
pub(crate) fn sweep(store: &Store) -> StoreResult<MigrationReport> {
    let mut report = MigrationReport {
        scanned: 0,
        repaired: 0,
        skipped: 0,
    };

    for id in store.record_ids()? {
        match store.update_reporting(&id) {
            Ok((_, changed)) => {
                report.scanned += 1;
                if changed {
                    report.repaired += 1;
                }
            }
            Err(e) if e.code() == StoreErrorCode::MendRecordCorrupt => {
                report.skipped += 1;
                Logger::warn(
                    "RECORD_SKIPPED",
                    &[
                        ("reason", e.message()),
                        ("record", id.as_str()),
                        ("type", store.schema().name.as_str()),
                    ],
                );
            }
            Err(e) => return Err(e),
        }
    }

    let scanned = report.scanned.to_string();
    let repaired = report.repaired.to_string();
    let skipped = report.skipped.to_string();
    Logger::info(
        "MIGRATION_COMPLETE",
        &[
            ("repaired", repaired.as_str()),
            ("scanned", scanned.as_str()),
            ("skipped", skipped.as_str()),
            ("type", store.schema().name.as_str()),
        ],
    );

    Ok(report)
}
