//! Student profile command handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use clearpath_store::queries;

use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Update the signed-in student's own contact fields. The resolved
/// profile is refreshed afterwards so every consumer sees the new values.
pub async fn update_student_profile(state: &Arc<DaemonState>, params: &Value) -> Result {
    let student = super::student_profile(state).await?;
    let store = super::required_store(state)?;

    let full_name = super::param_str(params, "full_name")?;
    let phone = params.get("phone").and_then(|v| v.as_str());

    queries::students::update_contact(store.as_ref(), &student.id, full_name, phone)
        .await
        .map_err(|e| RpcError::from_store(&e))?;

    info!(student = %student.student_id, "profile updated");
    super::auth::refresh_profile(state).await;
    Ok(super::auth::auth_snapshot(state).await)
}
