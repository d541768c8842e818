//! Department officer table queries.

use clearpath_types::profile::DepartmentProfile;

use crate::{IdentityStore, Result};

const TABLE: &str = "department_users";

/// Find the officer row for an email, expecting at most one.
pub async fn find_by_email(
    store: &dyn IdentityStore,
    email: &str,
) -> Result<Option<DepartmentProfile>> {
    let rows = store.select(TABLE, &[("email", email)]).await?;
    super::decode_single(TABLE, rows)
}

/// Find the officer row for an email scoped to one department (portal
/// logins carry a department code that must match the officer's row).
pub async fn find_by_email_in_department(
    store: &dyn IdentityStore,
    email: &str,
    department: &str,
) -> Result<Option<DepartmentProfile>> {
    let rows = store
        .select(TABLE, &[("email", email), ("department", department)])
        .await?;
    super::decode_single(TABLE, rows)
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
                "id": "u-5",
                "full_name": "Lena Officer",
                "email": "lena@u.edu",
                "department": "Library",
                "role": "department_officer",
            }),
        );
        store
    }

    #[tokio::test]
    async fn test_find_by_email() {
        let store = seeded();
        let officer = find_by_email(&store, "lena@u.edu")
            .await
            .expect("query")
            .expect("row");
        assert_eq!(officer.department, "Library");
    }

    #[tokio::test]
    async fn test_department_scope() {
        let store = seeded();
        let hit = find_by_email_in_department(&store, "lena@u.edu", "Library")
            .await
            .expect("query");
        assert!(hit.is_some());

        let miss = find_by_email_in_department(&store, "lena@u.edu", "Mess")
            .await
            .expect("query");
        assert!(miss.is_none());
    }
}
