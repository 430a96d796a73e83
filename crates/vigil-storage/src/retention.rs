//! Age-based pruning of the occurrence log.

use std::sync::Arc;

use tracing::info;
use vigil_core::{Database, StoreResult, Value};

use crate::adapter::RecordAdapter;
use crate::models::{Metadata, Occurrence};

/// Delete occurrences created strictly before `cutoff` along with their
/// metadata. Returns the number of occurrences removed.
pub fn apply_retention(db: &Arc<dyn Database>, cutoff: f64) -> StoreResult<usize> {
    let occurrences = RecordAdapter::<Occurrence>::new(Arc::clone(db))?;
    let metadata = RecordAdapter::<Metadata>::new(Arc::clone(db))?;

    let meta_sql = format!(
        "DELETE FROM {} WHERE occurrence_id IN (SELECT id FROM {} WHERE created_on < ?)",
        metadata.table(),
        occurrences.table(),
    );
    metadata.delete_by_query(&meta_sql, &[Value::Float(cutoff)])?;

    let occ_sql = format!(
        "DELETE FROM {} WHERE created_on < ?",
        occurrences.table()
    );
    let removed = occurrences.delete_by_query(&occ_sql, &[Value::Float(cutoff)])?;
    if removed > 0 {
        info!(removed, "pruned occurrence log");
    }
    Ok(removed)
}
