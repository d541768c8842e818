//! Department registry queries.

use clearpath_types::department::Department;

use crate::{IdentityStore, Result};

const TABLE: &str = "departments";

/// Resolve a portal code (e.g. "LIB") to its department row.
pub async fn find_by_code(
    store: &dyn IdentityStore,
    code: &str,
) -> Result<Option<Department>> {
    let rows = store.select(TABLE, &[("code", code)]).await?;
    super::decode_single(TABLE, rows)
}

pub async fn count(store: &dyn IdentityStore) -> Result<u64> {
    store.count(TABLE, &[]).await
}
