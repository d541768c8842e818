//! Student table queries.

use clearpath_types::profile::StudentProfile;

use crate::{IdentityStore, Result};

const TABLE: &str = "students";

/// Find the student row for an email, expecting at most one.
pub async fn find_by_email(
    store: &dyn IdentityStore,
    email: &str,
) -> Result<Option<StudentProfile>> {
    let rows = store.select(TABLE, &[("email", email)]).await?;
    super::decode_single(TABLE, rows)
}

/// Find a student by backing account id, expecting at most one row.
pub async fn find_by_id(
    store: &dyn IdentityStore,
    id: &str,
) -> Result<Option<StudentProfile>> {
    let rows = store.select(TABLE, &[("id", id)]).await?;
    super::decode_single(TABLE, rows)
}

/// All students (officer and admin views).
pub async fn list(store: &dyn IdentityStore) -> Result<Vec<StudentProfile>> {
    let rows = store.select(TABLE, &[]).await?;
    rows.into_iter().map(|row| super::decode(TABLE, row)).collect()
}

/// Update a student's own contact fields.
pub async fn update_contact(
    store: &dyn IdentityStore,
    id: &str,
    full_name: &str,
    phone: Option<&str>,
) -> Result<()> {
    store
        .update(
            TABLE,
            &[("id", id)],
            serde_json::json!({"full_name": full_name, "phone": phone}),
        )
        .await
}

pub async fn count(store: &dyn IdentityStore) -> Result<u64> {
    store.count(TABLE, &[]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(
            TABLE,
            json!({
                "id": "u-1",
                "student_id": "20230001",
                "full_name": "Alice Kila",
                "email": "alice@u.edu",
                "department": "Computer Science",
                "created_at": "2026-01-01T00:00:00Z",
            }),
        );
        store
    }

    #[tokio::test]
    async fn test_find_by_email_ignores_extra_columns() {
        let store = seeded();
        let student = find_by_email(&store, "alice@u.edu")
            .await
            .expect("query")
            .expect("row");
        assert_eq!(student.student_id, "20230001");
        assert_eq!(student.phone, None);
    }

    #[tokio::test]
    async fn test_find_by_email_missing() {
        let store = seeded();
        let none = find_by_email(&store, "bob@u.edu").await.expect("query");
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_update_contact() {
        let store = seeded();
        update_contact(&store, "u-1", "Alice K. Kila", Some("+675 123"))
            .await
            .expect("update");
        let student = find_by_email(&store, "alice@u.edu")
            .await
            .expect("query")
            .expect("row");
        assert_eq!(student.full_name, "Alice K. Kila");
        assert_eq!(student.phone.as_deref(), Some("+675 123"));
    }
}
