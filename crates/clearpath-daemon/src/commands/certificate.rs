//! Certificate command handler.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use clearpath_core::{aggregator, certificate};

use crate::events::Event;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Generate the clearance certificate for the signed-in student.
///
/// Loads a fresh view and enforces the all-cleared precondition; the UI
/// is responsible for presenting (printing) the returned document, and a
/// presentation failure is its error to report.
pub async fn generate_certificate(state: &Arc<DaemonState>) -> Result {
    let student = super::student_profile(state).await?;
    let store = super::required_store(state)?;

    let view = aggregator::student_view(store.as_ref(), &student).await;
    let cert = certificate::render(&student, &view)
        .map_err(|e| RpcError::clearance_incomplete(&e.to_string()))?;

    info!(student = %student.student_id, certificate_id = %cert.id, "certificate issued");
    state.events.emit(Event::now(
        "CertificateIssued",
        serde_json::json!({"student_id": student.student_id, "certificate_id": cert.id}),
    ));

    Ok(serde_json::json!({"certificate_id": cert.id, "html": cert.html}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::auth::sign_in_student;
    use crate::commands::testutil::{seed_student, test_state};
    use clearpath_store::memory::MemoryStore;
    use clearpath_types::department::CATALOG;

    fn clear_everything(store: &MemoryStore, student_id: &str) {
        for dept in CATALOG {
            store.insert(
                "clearance_records",
                serde_json::json!({
                    "student_id": student_id,
                    "department": dept.name,
                    "status": "cleared",
                    "cleared_by": "Lena Officer",
                    "cleared_at": "2026-07-01T09:30:00+00:00",
                    "updated_by": "u-5",
                }),
            );
        }
    }

    #[tokio::test]
    async fn test_incomplete_clearance_is_rejected() {
        let store = MemoryStore::new();
        seed_student(&store, "alice@u.edu", "u-1");
        let state = test_state(store);
        sign_in_student(
            &state,
            &serde_json::json!({"email": "alice@u.edu", "password": "secret"}),
        )
        .await
        .expect("sign in");

        let err = generate_certificate(&state).await.expect_err("rejected");
        assert_eq!(err.message, "CLEARANCE_INCOMPLETE");
    }

    #[tokio::test]
    async fn test_fully_cleared_student_gets_document() {
        let store = MemoryStore::new();
        seed_student(&store, "alice@u.edu", "u-1");
        clear_everything(&store, "u-1");
        let state = test_state(store);
        sign_in_student(
            &state,
            &serde_json::json!({"email": "alice@u.edu", "password": "secret"}),
        )
        .await
        .expect("sign in");

        let result = generate_certificate(&state).await.expect("certificate");
        assert_eq!(result["certificate_id"], "U-1");
        let html = result["html"].as_str().expect("html");
        assert!(html.contains("Alice Kila"));
        assert!(html.contains("CLEARANCE CERTIFICATE"));
    }
}
