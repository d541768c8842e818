//! # clearpath-store
//!
//! Client for the hosted Identity Store: password auth plus a generic row
//! query capability over the role and clearance tables. Row-level access
//! rules live server-side; this client never enforces them itself.
//!
//! Two backends implement the [`IdentityStore`] trait:
//!
//! - [`rest::RestStore`] speaks the hosted service's HTTP protocol.
//! - [`memory::MemoryStore`] is an in-memory backend for tests and local
//!   development, with per-table failure injection.
//!
//! [`queries`] layers typed per-table helpers over the trait, and
//! [`local::LocalState`] is the daemon's small on-disk state (login hint,
//! persisted session).

pub mod local;
pub mod memory;
pub mod queries;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;

use clearpath_types::session::Session;

/// Store error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend credentials absent; no network call was attempted.
    #[error("backend is not configured")]
    NotConfigured,

    /// Sign-in/sign-out rejected by the auth endpoint.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Transport-level failure (connection, timeout, malformed response).
    #[error("http error: {0}")]
    Http(String),

    /// The backend answered with a non-success status.
    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// A row did not decode into its typed shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Local state database error.
    #[error("local state error: {0}")]
    Local(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// The hosted Identity Store, as consumed by the client.
///
/// Auth operations bind an opaque session to an account email; row
/// operations are exact-match lookups and last-write-wins mutations over
/// named tables. Each operation fails with a distinguishable [`StoreError`].
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Password sign-in, producing the process-wide session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Destroy the current session. A no-op when already signed out.
    async fn sign_out(&self) -> Result<()>;

    /// The current session, if any.
    async fn session(&self) -> Result<Option<Session>>;

    /// Adopt a previously persisted session (restore-on-restart).
    async fn restore_session(&self, session: Session) -> Result<()>;

    /// Rows of `table` matching every `(column, value)` filter exactly.
    async fn select(&self, table: &str, filters: &[(&str, &str)]) -> Result<Vec<Value>>;

    /// Count of rows matching the filters, without fetching them.
    async fn count(&self, table: &str, filters: &[(&str, &str)]) -> Result<u64>;

    /// Patch every row matching the filters with the given columns.
    async fn update(&self, table: &str, filters: &[(&str, &str)], patch: Value) -> Result<()>;

    /// Insert `row`, merging into the existing row on a conflict over
    /// `on_conflict` (comma-separated column list). Last write wins.
    async fn upsert(&self, table: &str, row: Value, on_conflict: &str) -> Result<()>;
}
