//! In-memory backend for tests and local development.
//!
//! Holds tables as plain JSON rows and honors the same upsert conflict
//! semantics as the REST backend. Per-table failure injection exercises
//! the degraded read paths.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use clearpath_types::session::Session;

use crate::{IdentityStore, Result, StoreError};

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    tables: HashMap<String, Vec<Value>>,
    failing: HashSet<String>,
    failing_writes: HashSet<String>,
    session: Option<Session>,
}

struct Account {
    password: String,
    user_id: String,
}

/// In-memory Identity Store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a sign-in credential bound to a backing account id.
    pub fn register_account(&self, email: &str, password: &str, user_id: &str) {
        self.lock().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user_id: user_id.to_string(),
            },
        );
    }

    /// Seed a table row.
    pub fn insert(&self, table: &str, row: Value) {
        self.lock().tables.entry(table.to_string()).or_default().push(row);
    }

    /// Make every operation on `table` fail until cleared.
    pub fn fail_table(&self, table: &str) {
        self.lock().failing.insert(table.to_string());
    }

    /// Make only update/upsert on `table` fail until cleared; reads keep
    /// working.
    pub fn fail_writes(&self, table: &str) {
        self.lock().failing_writes.insert(table.to_string());
    }

    pub fn clear_failure(&self, table: &str) {
        let mut inner = self.lock();
        inner.failing.remove(table);
        inner.failing_writes.remove(table);
    }

    /// Snapshot of a table's rows, for assertions.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    fn check_available(inner: &Inner, table: &str) -> Result<()> {
        if inner.failing.contains(table) {
            return Err(StoreError::Backend {
                status: 503,
                message: format!("injected failure for {table}"),
            });
        }
        Ok(())
    }

    fn check_writable(inner: &Inner, table: &str) -> Result<()> {
        Self::check_available(inner, table)?;
        if inner.failing_writes.contains(table) {
            return Err(StoreError::Backend {
                status: 503,
                message: format!("injected write failure for {table}"),
            });
        }
        Ok(())
    }

    fn matches(row: &Value, filters: &[(&str, &str)]) -> bool {
        filters.iter().all(|(col, val)| {
            row.get(*col).is_some_and(|v| match v {
                Value::String(s) => s == val,
                other => other.to_string() == *val,
            })
        })
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut inner = self.lock();
        let account = inner
            .accounts
            .get(email)
            .filter(|a| a.password == password)
            .ok_or_else(|| StoreError::Auth("invalid login credentials".to_string()))?;

        let session = Session {
            user_id: account.user_id.clone(),
            email: email.to_string(),
            access_token: format!("token-{}", account.user_id),
        };
        inner.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.lock().session = None;
        Ok(())
    }

    async fn session(&self) -> Result<Option<Session>> {
        Ok(self.lock().session.clone())
    }

    async fn restore_session(&self, session: Session) -> Result<()> {
        self.lock().session = Some(session);
        Ok(())
    }

    async fn select(&self, table: &str, filters: &[(&str, &str)]) -> Result<Vec<Value>> {
        let inner = self.lock();
        Self::check_available(&inner, table)?;
        Ok(inner
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| Self::matches(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, table: &str, filters: &[(&str, &str)]) -> Result<u64> {
        let inner = self.lock();
        Self::check_available(&inner, table)?;
        Ok(inner
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| Self::matches(row, filters)).count() as u64)
            .unwrap_or(0))
    }

    async fn update(&self, table: &str, filters: &[(&str, &str)], patch: Value) -> Result<()> {
        let mut inner = self.lock();
        Self::check_writable(&inner, table)?;
        let Some(patch) = patch.as_object() else {
            return Err(StoreError::Decode("patch must be an object".to_string()));
        };
        if let Some(rows) = inner.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| Self::matches(row, filters)) {
                if let Some(obj) = row.as_object_mut() {
                    for (k, v) in patch {
                        obj.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> Result<()> {
        let mut inner = self.lock();
        Self::check_writable(&inner, table)?;
        let Some(new) = row.as_object() else {
            return Err(StoreError::Decode("row must be an object".to_string()));
        };

        let keys: Vec<&str> = on_conflict.split(',').map(str::trim).collect();
        let rows = inner.tables.entry(table.to_string()).or_default();

        let existing = rows.iter_mut().find(|candidate| {
            keys.iter().all(|key| {
                candidate.get(*key).is_some() && candidate.get(*key) == new.get(*key)
            })
        });

        match existing {
            Some(target) => {
                // Merge-duplicates: provided columns overwrite, others stay.
                if let Some(obj) = target.as_object_mut() {
                    for (k, v) in new {
                        obj.insert(k.clone(), v.clone());
                    }
                }
            }
            None => rows.push(row),
        }
        Ok(())
    }
}
