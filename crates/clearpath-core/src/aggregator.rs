//! Clearance view aggregation.
//!
//! Clearance records are sparse: a department writes a row only once it
//! acts on a student, and a missing row means pending. The aggregator
//! joins that sparse set against the full department catalog (student
//! view) or the full student list (officer view) so consumers always see
//! a complete, gap-filled picture.

use tracing::warn;

use clearpath_store::{queries, IdentityStore, StoreError};
use clearpath_types::clearance::{
    ClearanceRecord, ClearanceStatus, DepartmentClearance, StudentClearance,
};
use clearpath_types::department::CATALOG;
use clearpath_types::profile::{DepartmentProfile, StudentProfile};

/// Errors from the officer's record-clearance mutation.
#[derive(Debug, thiserror::Error)]
pub enum ClearanceError {
    /// Officers may only record clearance for their own department.
    #[error("officer for {officer} cannot record clearance for {requested}")]
    WrongDepartment { officer: String, requested: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The departments a student must clear: the fixed catalog plus the
/// student's home department, deduplicated by name (catalog order first,
/// home appended last when it is not already a catalog entry).
fn target_departments(student: &StudentProfile) -> Vec<String> {
    let mut targets: Vec<String> = CATALOG.iter().map(|d| d.name.to_string()).collect();
    if !targets.iter().any(|name| name == &student.department) {
        targets.push(student.department.clone());
    }
    targets
}

fn project(department: &str, record: Option<&ClearanceRecord>) -> DepartmentClearance {
    match record {
        Some(r) => DepartmentClearance {
            department: department.to_string(),
            status: r.status,
            notes: r.notes.clone(),
            cleared_at: r.cleared_at.clone(),
            cleared_by: r.cleared_by.clone(),
        },
        None => DepartmentClearance::pending(department),
    }
}

/// The student's complete clearance view: one entry per target
/// department, in catalog order.
///
/// A backend failure degrades to the fully synthesized pending view
/// instead of failing the page.
pub async fn student_view(
    store: &dyn IdentityStore,
    student: &StudentProfile,
) -> Vec<DepartmentClearance> {
    let targets = target_departments(student);

    let records = match queries::records::for_student(store, &student.id).await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, student = %student.student_id, "record load failed, showing pending");
            return targets.iter().map(DepartmentClearance::pending).collect();
        }
    };

    targets
        .iter()
        .map(|dept| project(dept, records.iter().find(|r| &r.department == dept)))
        .collect()
}

/// The officer's view of their department: one entry per student.
///
/// A failure fetching the student list yields an empty view (there is
/// nothing to enumerate); a failure fetching records degrades each entry
/// to pending.
pub async fn officer_view(
    store: &dyn IdentityStore,
    department: &str,
) -> Vec<StudentClearance> {
    let students = match queries::students::list(store).await {
        Ok(students) => students,
        Err(e) => {
            warn!(error = %e, department, "student list load failed");
            return Vec::new();
        }
    };

    let records = match queries::records::for_department(store, department).await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, department, "record load failed, showing pending");
            Vec::new()
        }
    };

    students
        .into_iter()
        .map(|student| {
            let entry = project(
                department,
                records.iter().find(|r| r.student_id == student.id),
            );
            StudentClearance {
                student,
                status: entry.status,
                notes: entry.notes,
                cleared_at: entry.cleared_at,
                cleared_by: entry.cleared_by,
            }
        })
        .collect()
}

/// Record a clearance decision for one student.
///
/// Writes the unique `(student_id, department)` record, last write wins.
/// Setting the status to cleared stamps the officer's name and the
/// current time. The caller reloads its view on success; on failure the
/// prior view state is left untouched.
pub async fn record_clearance(
    store: &dyn IdentityStore,
    officer: &DepartmentProfile,
    student_id: &str,
    department: &str,
    status: ClearanceStatus,
    notes: Option<String>,
) -> Result<(), ClearanceError> {
    if department != officer.department {
        return Err(ClearanceError::WrongDepartment {
            officer: officer.department.clone(),
            requested: department.to_string(),
        });
    }

    let mut record = ClearanceRecord {
        student_id: student_id.to_string(),
        department: department.to_string(),
        status,
        notes,
        cleared_by: None,
        cleared_at: None,
        updated_by: officer.id.clone(),
    };

    if status == ClearanceStatus::Cleared {
        record.cleared_by = Some(officer.full_name.clone());
        record.cleared_at = Some(chrono::Utc::now().to_rfc3339());
    }

    queries::records::upsert(store, &record).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearpath_store::memory::MemoryStore;
    use clearpath_types::profile::OfficerRole;
    use serde_json::json;

    fn student(home: &str) -> StudentProfile {
        StudentProfile {
            id: "u-1".to_string(),
            student_id: "20230001".to_string(),
            full_name: "Alice Kila".to_string(),
            email: "alice@u.edu".to_string(),
            department: home.to_string(),
            phone: None,
            course_code: None,
            year_level: None,
            clearance_reason: None,
        }
    }

    fn officer(department: &str) -> DepartmentProfile {
        DepartmentProfile {
            id: "u-5".to_string(),
            full_name: "Lena Officer".to_string(),
            email: "lena@u.edu".to_string(),
            department: department.to_string(),
            role: OfficerRole::DepartmentOfficer,
        }
    }

    fn seed_record(store: &MemoryStore, student_id: &str, department: &str, status: &str) {
        store.insert(
            "clearance_records",
            json!({
                "student_id": student_id,
                "department": department,
                "status": status,
                "notes": "seen",
                "updated_by": "u-5",
            }),
        );
    }

    #[tokio::test]
    async fn test_student_view_home_in_catalog_not_duplicated() {
        let store = MemoryStore::new();
        seed_record(&store, "u-1", "Library", "cleared");
        seed_record(&store, "u-1", "Computer Science", "pending");

        // Home department "Computer Science" is already a catalog entry.
        let view = student_view(&store, &student("Computer Science")).await;
        assert_eq!(view.len(), CATALOG.len());

        let names: Vec<&str> = view.iter().map(|e| e.department.as_str()).collect();
        let cs_entries = names.iter().filter(|n| **n == "Computer Science").count();
        assert_eq!(cs_entries, 1);

        assert_eq!(view[0].department, "Library");
        assert_eq!(view[0].status, ClearanceStatus::Cleared);
        // Record-backed entries carry their notes; synthesized ones don't.
        assert_eq!(view[0].notes.as_deref(), Some("seen"));
        assert_eq!(view[1].department, "Computer Science");
        assert_eq!(view[1].status, ClearanceStatus::Pending);
        assert_eq!(view[1].notes.as_deref(), Some("seen"));
        assert_eq!(view[2].department, "Engineering");
        assert_eq!(view[2].status, ClearanceStatus::Pending);
        assert!(view[2].notes.is_none());
    }

    #[tokio::test]
    async fn test_student_view_appends_unknown_home_department() {
        let store = MemoryStore::new();
        let view = student_view(&store, &student("Architecture")).await;
        assert_eq!(view.len(), CATALOG.len() + 1);
        assert_eq!(view.last().expect("entry").department, "Architecture");
    }

    #[tokio::test]
    async fn test_student_view_degrades_to_pending_on_error() {
        let store = MemoryStore::new();
        seed_record(&store, "u-1", "Library", "cleared");
        store.fail_table("clearance_records");

        let view = student_view(&store, &student("Computer Science")).await;
        assert_eq!(view.len(), CATALOG.len());
        assert!(view.iter().all(|e| e.status == ClearanceStatus::Pending));
    }

    #[tokio::test]
    async fn test_officer_view_one_entry_per_student() {
        let store = MemoryStore::new();
        store.insert(
            "students",
            json!({
                "id": "u-1",
                "student_id": "20230001",
                "full_name": "Alice Kila",
                "email": "alice@u.edu",
                "department": "Computer Science",
            }),
        );
        store.insert(
            "students",
            json!({
                "id": "u-2",
                "student_id": "20230002",
                "full_name": "Ben Tau",
                "email": "ben@u.edu",
                "department": "Business",
            }),
        );
        seed_record(&store, "u-1", "Library", "blocked");

        let view = officer_view(&store, "Library").await;
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].status, ClearanceStatus::Blocked);
        assert_eq!(view[1].status, ClearanceStatus::Pending);
    }

    #[tokio::test]
    async fn test_officer_view_empty_when_student_list_fails() {
        let store = MemoryStore::new();
        store.fail_table("students");
        assert!(officer_view(&store, "Library").await.is_empty());
    }

    #[tokio::test]
    async fn test_record_clearance_stamps_officer_and_time() {
        let store = MemoryStore::new();
        let lena = officer("Library");

        record_clearance(&store, &lena, "S1", "Library", ClearanceStatus::Cleared, None)
            .await
            .expect("record");

        let rows = store.rows("clearance_records");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["cleared_by"], "Lena Officer");
        assert!(rows[0]["cleared_at"].as_str().is_some_and(|s| !s.is_empty()));
        assert_eq!(rows[0]["updated_by"], "u-5");
    }

    #[tokio::test]
    async fn test_record_clearance_rejects_foreign_department() {
        let store = MemoryStore::new();
        let lena = officer("Library");

        let err = record_clearance(&store, &lena, "S1", "Mess", ClearanceStatus::Cleared, None)
            .await;
        assert!(matches!(err, Err(ClearanceError::WrongDepartment { .. })));
        assert!(store.rows("clearance_records").is_empty());
    }

    #[tokio::test]
    async fn test_record_then_reload_reflects_write() {
        let store = MemoryStore::new();
        store.insert(
            "students",
            json!({
                "id": "S1",
                "student_id": "20230009",
                "full_name": "Cara Vagi",
                "email": "cara@u.edu",
                "department": "Science",
            }),
        );
        let lena = officer("Library");

        record_clearance(&store, &lena, "S1", "Library", ClearanceStatus::Cleared, None)
            .await
            .expect("record");

        let view = officer_view(&store, "Library").await;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].status, ClearanceStatus::Cleared);
        assert_eq!(view[0].cleared_by.as_deref(), Some("Lena Officer"));
    }

    #[tokio::test]
    async fn test_second_write_wins() {
        let store = MemoryStore::new();
        let lena = officer("Library");

        record_clearance(&store, &lena, "S1", "Library", ClearanceStatus::Blocked, Some("fees".to_string()))
            .await
            .expect("first");
        record_clearance(&store, &lena, "S1", "Library", ClearanceStatus::Cleared, None)
            .await
            .expect("second");

        let rows = store.rows("clearance_records");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], "cleared");
    }
}
