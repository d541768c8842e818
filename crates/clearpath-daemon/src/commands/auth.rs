//! Auth command handlers: sign-in per portal, sign-out, auth state, and
//! navigation decisions.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use clearpath_core::controller::{AuthView, Decision, HOME_PATH};
use clearpath_core::resolver;
use clearpath_store::{queries, IdentityStore};
use clearpath_types::profile::RoleProfile;
use clearpath_types::session::{LoginKind, Session};

use crate::events::Event;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Re-run profile resolution for the current session and publish the
/// outcome. Idempotent; both the restored-session path and the sign-in
/// path funnel through here.
pub async fn refresh_profile(state: &Arc<DaemonState>) {
    let Some(store) = state.store.clone() else {
        let mut auth = state.auth.write().await;
        auth.loading = false;
        auth.profile = None;
        return;
    };

    let Some(session) = state.auth.read().await.session.clone() else {
        let mut auth = state.auth.write().await;
        auth.loading = false;
        auth.profile = None;
        return;
    };

    let profile = resolver::resolve(store.as_ref(), &session).await;

    {
        let mut auth = state.auth.write().await;
        // The session may have changed while we were resolving; a stale
        // result is discarded rather than clobbering the new session.
        if auth
            .session
            .as_ref()
            .is_some_and(|s| s.user_id == session.user_id)
        {
            auth.profile = profile.clone();
            auth.loading = false;
        }
    }

    state.events.emit(Event::now(
        "ProfileResolved",
        serde_json::json!({"role": profile.as_ref().map(RoleProfile::role)}),
    ));
}

/// Adopt a fresh session: publish it, persist it, cache the login hint.
async fn commit_session(state: &Arc<DaemonState>, session: &Session, kind: LoginKind) {
    {
        let mut auth = state.auth.write().await;
        auth.session = Some(session.clone());
        auth.loading = true;
        auth.profile = None;
    }
    {
        let local = state.local.lock().await;
        if let Err(e) = local.set_login_hint(kind) {
            warn!(error = %e, "could not cache login hint");
        }
        if let Err(e) = local.save_session(session) {
            warn!(error = %e, "could not persist session");
        }
    }
    state.events.emit(Event::now(
        "SessionChanged",
        serde_json::json!({"email": session.email}),
    ));
}

/// Drop all session state: auth, persisted session, login hint.
async fn clear_session_state(state: &Arc<DaemonState>) {
    {
        let mut auth = state.auth.write().await;
        *auth = crate::AuthState::default();
    }
    {
        let local = state.local.lock().await;
        if let Err(e) = local.clear_login_hint() {
            warn!(error = %e, "could not clear login hint");
        }
        if let Err(e) = local.clear_session() {
            warn!(error = %e, "could not clear persisted session");
        }
    }
    state.events.emit(Event::now(
        "SessionChanged",
        serde_json::json!({"email": Value::Null}),
    ));
}

/// Current auth state as the UI sees it.
pub(crate) async fn auth_snapshot(state: &Arc<DaemonState>) -> Value {
    let auth = state.auth.read().await;
    serde_json::json!({
        "email": auth.session.as_ref().map(|s| s.email.clone()),
        "loading": auth.loading,
        "role": auth.role(),
        "profile": auth.profile.clone(),
    })
}

/// Student portal sign-in.
pub async fn sign_in_student(state: &Arc<DaemonState>, params: &Value) -> Result {
    let email = super::param_str(params, "email")?;
    let password = super::param_str(params, "password")?;
    let store = super::required_store(state)?;

    let session = store
        .sign_in(email, password)
        .await
        .map_err(|e| RpcError::from_store(&e))?;

    info!(email, "student signed in");
    commit_session(state, &session, LoginKind::Student).await;
    refresh_profile(state).await;
    Ok(auth_snapshot(state).await)
}

/// Department portal sign-in. When a department code is supplied, the
/// officer's row must belong to that department; a sign-in that fails
/// verification is rolled back with a sign-out.
pub async fn sign_in_department(state: &Arc<DaemonState>, params: &Value) -> Result {
    let email = super::param_str(params, "email")?;
    let password = super::param_str(params, "password")?;
    let department_code = params.get("department_code").and_then(|v| v.as_str());
    let store = super::required_store(state)?;

    let session = store
        .sign_in(email, password)
        .await
        .map_err(|e| RpcError::from_store(&e))?;

    let officer = verify_department_access(store.as_ref(), email, department_code).await;
    match officer {
        Ok(Some(_)) => {
            info!(email, "department officer signed in");
            commit_session(state, &session, LoginKind::Department).await;
            refresh_profile(state).await;
            Ok(auth_snapshot(state).await)
        }
        Ok(None) | Err(_) => {
            if let Err(e) = store.sign_out().await {
                warn!(error = %e, "rollback sign-out failed");
            }
            Err(RpcError::auth_failed(if department_code.is_some() {
                "You don't have access to this department"
            } else {
                "No department profile found for this account"
            }))
        }
    }
}

/// Verify the signed-in email has an officer row, optionally scoped to
/// the department named by a portal code.
async fn verify_department_access(
    store: &dyn IdentityStore,
    email: &str,
    department_code: Option<&str>,
) -> clearpath_store::Result<Option<clearpath_types::profile::DepartmentProfile>> {
    if let Some(code) = department_code {
        if let Some(dept) = queries::departments::find_by_code(store, code).await? {
            return queries::officers::find_by_email_in_department(store, email, &dept.name).await;
        }
    }
    queries::officers::find_by_email(store, email).await
}

/// Admin portal sign-in. The email must have an admin row; otherwise the
/// sign-in is rolled back.
pub async fn sign_in_admin(state: &Arc<DaemonState>, params: &Value) -> Result {
    let email = super::param_str(params, "email")?;
    let password = super::param_str(params, "password")?;
    let store = super::required_store(state)?;

    let session = store
        .sign_in(email, password)
        .await
        .map_err(|e| RpcError::from_store(&e))?;

    match queries::admins::find_by_email(store.as_ref(), email).await {
        Ok(Some(_)) => {
            info!(email, "admin signed in");
            commit_session(state, &session, LoginKind::Admin).await;
            refresh_profile(state).await;
            Ok(auth_snapshot(state).await)
        }
        Ok(None) | Err(_) => {
            if let Err(e) = store.sign_out().await {
                warn!(error = %e, "rollback sign-out failed");
            }
            Err(RpcError::auth_failed("No admin profile found for this account"))
        }
    }
}

/// User-initiated sign-out.
pub async fn sign_out(state: &Arc<DaemonState>) -> Result {
    let store = super::required_store(state)?;
    store
        .sign_out()
        .await
        .map_err(|e| RpcError::from_store(&e))?;
    clear_session_state(state).await;
    Ok(serde_json::json!({"signed_out": true}))
}

/// Forced sign-out for orphaned sessions (resolution found no role even
/// after the retry). Best-effort: local state is cleared regardless.
async fn force_sign_out(state: &Arc<DaemonState>) {
    if let Some(store) = &state.store {
        if let Err(e) = store.sign_out().await {
            warn!(error = %e, "forced sign-out failed");
        }
    }
    clear_session_state(state).await;
}

/// Current auth state.
pub async fn get_auth_state(state: &Arc<DaemonState>) -> Result {
    Ok(auth_snapshot(state).await)
}

/// Run the redirect controller against the current auth state.
async fn decide(state: &Arc<DaemonState>, current_path: &str) -> Decision {
    let auth = state.auth.read().await.clone();
    let hint = state.local.lock().await.login_hint().unwrap_or_default();
    let view = AuthView {
        session: auth.session.as_ref(),
        loading: auth.loading,
        role: auth.role(),
        hint,
    };
    state.controller.lock().await.decide(&view, current_path)
}

/// Navigation decision for the UI's current path.
///
/// A first no-role resolution triggers the one-shot retry: with a cached
/// hint the UI is sent provisionally to the hinted home while the
/// resolver re-runs in the background; without one, the retry completes
/// inline and the refreshed state decides. A no-role result after the
/// retry forces sign-out and lands on the home path.
pub async fn navigate(state: &Arc<DaemonState>, params: &Value) -> Result {
    let current_path = params
        .get("current_path")
        .and_then(|v| v.as_str())
        .unwrap_or(HOME_PATH);

    match decide(state, current_path).await {
        Decision::Stay => Ok(serde_json::json!({"action": "stay"})),
        Decision::Navigate(to) => Ok(serde_json::json!({"action": "navigate", "to": to})),
        Decision::RetryResolve { provisional: Some(to) } => {
            let background = state.clone();
            tokio::spawn(async move {
                refresh_profile(&background).await;
            });
            Ok(serde_json::json!({"action": "navigate", "to": to, "provisional": true}))
        }
        Decision::RetryResolve { provisional: None } => {
            refresh_profile(state).await;
            match decide(state, current_path).await {
                Decision::Navigate(to) => {
                    Ok(serde_json::json!({"action": "navigate", "to": to}))
                }
                Decision::SignOut => {
                    force_sign_out(state).await;
                    Ok(serde_json::json!({
                        "action": "navigate", "to": HOME_PATH, "signed_out": true,
                    }))
                }
                _ => Ok(serde_json::json!({"action": "stay"})),
            }
        }
        Decision::SignOut => {
            force_sign_out(state).await;
            Ok(serde_json::json!({
                "action": "navigate", "to": HOME_PATH, "signed_out": true,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::{seed_student, test_state, unconfigured_state};
    use clearpath_store::memory::MemoryStore;

    #[tokio::test]
    async fn test_sign_in_student_resolves_profile() {
        let store = MemoryStore::new();
        seed_student(&store, "alice@u.edu", "u-1");
        let state = test_state(store);

        let snapshot = sign_in_student(
            &state,
            &serde_json::json!({"email": "alice@u.edu", "password": "secret"}),
        )
        .await
        .expect("sign in");

        assert_eq!(snapshot["role"], "student");
        assert_eq!(snapshot["loading"], false);
        assert_eq!(snapshot["profile"]["full_name"], "Alice Kila");

        let hint = state.local.lock().await.login_hint().expect("hint");
        assert_eq!(hint, Some(clearpath_types::session::LoginKind::Student));
        let persisted = state.local.lock().await.load_session().expect("session");
        assert!(persisted.is_some());
    }

    #[tokio::test]
    async fn test_sign_in_bad_credentials() {
        let store = MemoryStore::new();
        seed_student(&store, "alice@u.edu", "u-1");
        let state = test_state(store);

        let err = sign_in_student(
            &state,
            &serde_json::json!({"email": "alice@u.edu", "password": "nope"}),
        )
        .await
        .expect_err("rejected");
        assert_eq!(err.message, "AUTH_FAILED");
        assert!(state.auth.read().await.session.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_short_circuits() {
        let state = unconfigured_state();
        let err = sign_in_student(
            &state,
            &serde_json::json!({"email": "a@u.edu", "password": "x"}),
        )
        .await
        .expect_err("rejected");
        assert_eq!(err.message, "NOT_CONFIGURED");
    }

    #[tokio::test]
    async fn test_department_sign_in_wrong_code_rolls_back() {
        let store = MemoryStore::new();
        crate::commands::testutil::seed_officer(&store, "lena@u.edu", "u-5", "Library");
        store.insert(
            "departments",
            serde_json::json!({"name": "Mess", "code": "MESS"}),
        );
        let state = test_state(store);

        let err = sign_in_department(
            &state,
            &serde_json::json!({
                "email": "lena@u.edu",
                "password": "secret",
                "department_code": "MESS",
            }),
        )
        .await
        .expect_err("rejected");
        assert_eq!(err.message, "AUTH_FAILED");

        // The rollback signed the store session back out.
        let store = state.store.as_ref().expect("store");
        assert!(store.session().await.expect("session").is_none());
    }

    #[tokio::test]
    async fn test_department_sign_in_with_matching_code() {
        let store = MemoryStore::new();
        crate::commands::testutil::seed_officer(&store, "lena@u.edu", "u-5", "Library");
        store.insert(
            "departments",
            serde_json::json!({"name": "Library", "code": "LIB"}),
        );
        let state = test_state(store);

        let snapshot = sign_in_department(
            &state,
            &serde_json::json!({
                "email": "lena@u.edu",
                "password": "secret",
                "department_code": "LIB",
            }),
        )
        .await
        .expect("sign in");
        assert_eq!(snapshot["role"], "department");
    }

    #[tokio::test]
    async fn test_navigate_to_role_home_with_anti_loop() {
        let store = MemoryStore::new();
        seed_student(&store, "alice@u.edu", "u-1");
        let state = test_state(store);
        sign_in_student(
            &state,
            &serde_json::json!({"email": "alice@u.edu", "password": "secret"}),
        )
        .await
        .expect("sign in");

        let from_home = navigate(&state, &serde_json::json!({"current_path": "/"}))
            .await
            .expect("navigate");
        assert_eq!(from_home["action"], "navigate");
        assert_eq!(from_home["to"], "/student");

        let on_sub_page = navigate(
            &state,
            &serde_json::json!({"current_path": "/student/profile"}),
        )
        .await
        .expect("navigate");
        assert_eq!(on_sub_page["action"], "stay");
    }

    #[tokio::test]
    async fn test_orphaned_session_signed_out_after_retry() {
        // An account that authenticates but has no role row anywhere.
        let store = MemoryStore::new();
        store.register_account("ghost@u.edu", "secret", "u-9");
        let state = test_state(store);

        let store_ref = state.store.clone().expect("store");
        let session = store_ref
            .sign_in("ghost@u.edu", "secret")
            .await
            .expect("sign in");
        {
            let mut auth = state.auth.write().await;
            auth.session = Some(session);
            auth.loading = false;
            auth.profile = None;
        }
        // No hint cached, so the retry resolves inline, finds nothing
        // again, and forces sign-out.
        let result = navigate(&state, &serde_json::json!({"current_path": "/"}))
            .await
            .expect("navigate");
        assert_eq!(result["action"], "navigate");
        assert_eq!(result["to"], "/");
        assert_eq!(result["signed_out"], true);
        assert!(state.auth.read().await.session.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_hint_and_session() {
        let store = MemoryStore::new();
        seed_student(&store, "alice@u.edu", "u-1");
        let state = test_state(store);
        sign_in_student(
            &state,
            &serde_json::json!({"email": "alice@u.edu", "password": "secret"}),
        )
        .await
        .expect("sign in");

        sign_out(&state).await.expect("sign out");

        assert!(state.auth.read().await.session.is_none());
        assert_eq!(state.local.lock().await.login_hint().expect("hint"), None);
        assert!(state.local.lock().await.load_session().expect("session").is_none());
    }
}
