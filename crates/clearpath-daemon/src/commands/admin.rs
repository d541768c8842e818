//! Admin command handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use clearpath_store::{queries, Result as StoreResult};

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Overview statistics for the admin dashboard.
///
/// The four counters are read-only and mutually independent, so they are
/// issued concurrently. A failed counter degrades to zero instead of
/// failing the dashboard.
pub async fn get_overview_stats(state: &Arc<DaemonState>) -> Result {
    let _admin = super::admin_profile(state).await?;
    let store = super::required_store(state)?;
    let store = store.as_ref();

    let (students, officers, departments, pending) = tokio::join!(
        queries::students::count(store),
        queries::officers::count(store),
        queries::departments::count(store),
        queries::records::count_pending(store),
    );

    Ok(serde_json::json!({
        "total_students": count_or_zero("students", students),
        "total_staff": count_or_zero("department_users", officers),
        "total_departments": count_or_zero("departments", departments),
        "pending_clearances": count_or_zero("clearance_records", pending),
    }))
}

fn count_or_zero(what: &str, result: StoreResult<u64>) -> u64 {
    match result {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, what, "statistic unavailable");
            0
        }
    }
}
