//! Clearance record queries.

use clearpath_types::clearance::ClearanceRecord;

use crate::{IdentityStore, Result};

const TABLE: &str = "clearance_records";

/// All records on file for one student.
pub async fn for_student(
    store: &dyn IdentityStore,
    student_id: &str,
) -> Result<Vec<ClearanceRecord>> {
    let rows = store.select(TABLE, &[("student_id", student_id)]).await?;
    rows.into_iter().map(|row| super::decode(TABLE, row)).collect()
}

/// All records on file for one department.
pub async fn for_department(
    store: &dyn IdentityStore,
    department: &str,
) -> Result<Vec<ClearanceRecord>> {
    let rows = store.select(TABLE, &[("department", department)]).await?;
    rows.into_iter().map(|row| super::decode(TABLE, row)).collect()
}

/// Write a record, overwriting any existing one for the same
/// `(student_id, department)` key. Last write wins.
pub async fn upsert(store: &dyn IdentityStore, record: &ClearanceRecord) -> Result<()> {
    let row = serde_json::to_value(record)
        .map_err(|e| crate::StoreError::Decode(e.to_string()))?;
    store.upsert(TABLE, row, "student_id,department").await
}

pub async fn count_pending(store: &dyn IdentityStore) -> Result<u64> {
    store.count(TABLE, &[("status", "pending")]).await
}
