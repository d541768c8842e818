//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category.

pub mod admin;
pub mod auth;
pub mod certificate;
pub mod clearance;
pub mod profile;

use std::sync::Arc;

use serde_json::Value;

use clearpath_store::IdentityStore;
use clearpath_types::profile::{AdminProfile, DepartmentProfile, RoleProfile, StudentProfile};

use crate::rpc::RpcError;
use crate::DaemonState;

/// The configured store, or NOT_CONFIGURED.
pub(crate) fn required_store(
    state: &Arc<DaemonState>,
) -> Result<Arc<dyn IdentityStore>, RpcError> {
    state.store.clone().ok_or_else(RpcError::not_configured)
}

/// Extract a required string parameter.
pub(crate) fn param_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, RpcError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{key} required")))
}

/// The resolved student profile, or the appropriate error.
pub(crate) async fn student_profile(
    state: &Arc<DaemonState>,
) -> Result<StudentProfile, RpcError> {
    let auth = state.auth.read().await;
    match &auth.profile {
        Some(RoleProfile::Student(student)) => Ok(student.clone()),
        Some(_) => Err(RpcError::role_required("student")),
        None => Err(RpcError::no_profile()),
    }
}

/// The resolved officer profile, or the appropriate error.
pub(crate) async fn officer_profile(
    state: &Arc<DaemonState>,
) -> Result<DepartmentProfile, RpcError> {
    let auth = state.auth.read().await;
    match &auth.profile {
        Some(RoleProfile::Department(officer)) => Ok(officer.clone()),
        Some(_) => Err(RpcError::role_required("department")),
        None => Err(RpcError::no_profile()),
    }
}

/// The resolved admin profile, or the appropriate error.
pub(crate) async fn admin_profile(state: &Arc<DaemonState>) -> Result<AdminProfile, RpcError> {
    let auth = state.auth.read().await;
    match &auth.profile {
        Some(RoleProfile::Admin(admin)) => Ok(admin.clone()),
        Some(_) => Err(RpcError::role_required("admin")),
        None => Err(RpcError::no_profile()),
    }
}
