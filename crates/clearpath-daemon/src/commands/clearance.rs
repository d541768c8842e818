//! Clearance command handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use clearpath_core::aggregator::{self, ClearanceError};
use clearpath_store::queries;
use clearpath_types::clearance::ClearanceStatus;
use clearpath_types::profile::RoleProfile;

use crate::events::Event;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// The caller's clearance view, shaped by their role.
pub async fn get_clearance_view(state: &Arc<DaemonState>) -> Result {
    let store = super::required_store(state)?;
    let profile = state
        .auth
        .read()
        .await
        .profile
        .clone()
        .ok_or_else(RpcError::no_profile)?;

    match profile {
        RoleProfile::Student(student) => {
            let entries = aggregator::student_view(store.as_ref(), &student).await;
            Ok(serde_json::json!({"mode": "student", "entries": entries}))
        }
        RoleProfile::Department(officer) => {
            let entries = aggregator::officer_view(store.as_ref(), &officer.department).await;
            Ok(serde_json::json!({
                "mode": "department",
                "department": officer.department,
                "entries": entries,
            }))
        }
        RoleProfile::Admin(_) => Err(RpcError::role_required("student or department")),
    }
}

/// Record a clearance decision. Officer-only; reloads and returns the
/// fresh department view so the caller reads its own write.
pub async fn record_clearance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let officer = super::officer_profile(state).await?;
    let store = super::required_store(state)?;

    let student_id = super::param_str(params, "student_id")?;
    let department = super::param_str(params, "department")?;
    let status: ClearanceStatus = super::param_str(params, "status")?
        .parse()
        .map_err(|e: clearpath_types::clearance::StatusParseError| {
            RpcError::invalid_params(&e.to_string())
        })?;
    let notes = params
        .get("notes")
        .and_then(|v| v.as_str())
        .map(String::from);

    aggregator::record_clearance(store.as_ref(), &officer, student_id, department, status, notes)
        .await
        .map_err(|e| match e {
            ClearanceError::WrongDepartment { .. } => RpcError::wrong_department(&e.to_string()),
            ClearanceError::Store(store_error) => RpcError::from_store(&store_error),
        })?;

    info!(student_id, department, status = %status, "clearance recorded");
    state.events.emit(Event::now(
        "ClearanceUpdated",
        serde_json::json!({
            "student_id": student_id,
            "department": department,
            "status": status,
        }),
    ));

    let entries = aggregator::officer_view(store.as_ref(), &officer.department).await;
    Ok(serde_json::json!({"updated": true, "entries": entries}))
}

/// Send a clearance reminder to a student. Delivery goes through the
/// daemon's notifier seam; the shipped implementation only logs.
pub async fn send_reminder(state: &Arc<DaemonState>, params: &Value) -> Result {
    let officer = super::officer_profile(state).await?;
    let store = super::required_store(state)?;
    let student_id = super::param_str(params, "student_id")?;

    let student = queries::students::find_by_id(store.as_ref(), student_id)
        .await
        .map_err(|e| RpcError::from_store(&e))?
        .ok_or_else(|| RpcError::invalid_params("unknown student"))?;

    state
        .notifier
        .send_reminder(&student, &officer.department)
        .await
        .map_err(|e| RpcError::internal_error(&e.to_string()))?;

    state.events.emit(Event::now(
        "ReminderSent",
        serde_json::json!({"student_id": student_id, "department": officer.department}),
    ));
    Ok(serde_json::json!({"sent": true}))
}
