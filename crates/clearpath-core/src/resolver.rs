//! Profile resolution.
//!
//! Maps an authenticated session to at most one role profile by probing
//! the role tables in fixed priority order: admin, then student, then
//! department officer. An email present in more than one table resolves
//! to the higher-priority role; the resolver does not validate
//! exclusivity.
//!
//! On a match the resolver writes the session's backing account id into
//! the matched row (legacy rows were keyed by email only). That corrective
//! write is fire-and-forget: its failure is logged and never blocks
//! resolution. A lookup failure on one table counts as no-match for that
//! table and probing continues, so callers always receive either one
//! complete profile or none - never partial state.

use tracing::{debug, warn};

use clearpath_store::{queries, IdentityStore};
use clearpath_types::profile::RoleProfile;
use clearpath_types::session::Session;

/// Resolve the session's role profile, if any.
///
/// Idempotent: resolving the same session twice yields the same result
/// (the corrective id write is a no-op the second time).
pub async fn resolve(store: &dyn IdentityStore, session: &Session) -> Option<RoleProfile> {
    debug!(email = %session.email, user_id = %session.user_id, "resolving profile");

    match queries::admins::find_by_email(store, &session.email).await {
        Ok(Some(mut admin)) => {
            adopt_id(store, "admin_users", session).await;
            admin.id = session.user_id.clone();
            debug!(name = %admin.full_name, "resolved as admin");
            return Some(RoleProfile::Admin(admin));
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "admin lookup failed, continuing"),
    }

    match queries::students::find_by_email(store, &session.email).await {
        Ok(Some(mut student)) => {
            adopt_id(store, "students", session).await;
            student.id = session.user_id.clone();
            debug!(name = %student.full_name, "resolved as student");
            return Some(RoleProfile::Student(student));
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "student lookup failed, continuing"),
    }

    match queries::officers::find_by_email(store, &session.email).await {
        Ok(Some(mut officer)) => {
            adopt_id(store, "department_users", session).await;
            officer.id = session.user_id.clone();
            debug!(name = %officer.full_name, "resolved as department officer");
            return Some(RoleProfile::Department(officer));
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "officer lookup failed, continuing"),
    }

    debug!(email = %session.email, "no profile found");
    None
}

/// Repair the matched row's id to the session's backing account id.
async fn adopt_id(store: &dyn IdentityStore, table: &str, session: &Session) {
    if let Err(e) =
        queries::adopt_account_id(store, table, &session.email, &session.user_id).await
    {
        warn!(table, error = %e, "corrective id write failed");
    }
}
