//! Typed query helpers, one module per table.

pub mod admins;
pub mod departments;
pub mod officers;
pub mod records;
pub mod students;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{IdentityStore, Result, StoreError};

/// Decode one row into its typed shape.
fn decode<T: DeserializeOwned>(table: &str, row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|e| StoreError::Decode(format!("{table}: {e}")))
}

/// Decode an email lookup expecting at most one row.
fn decode_single<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Option<T>> {
    rows.into_iter().next().map(|row| decode(table, row)).transpose()
}

/// Write the session's backing account id into the role row matched by
/// email. Legacy rows were keyed by email only; this repairs them so row
/// ids and session ids agree. Idempotent.
pub async fn adopt_account_id(
    store: &dyn IdentityStore,
    table: &str,
    email: &str,
    user_id: &str,
) -> Result<()> {
    store
        .update(table, &[("email", email)], serde_json::json!({"id": user_id}))
        .await
}
