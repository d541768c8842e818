//! Session and sign-in types.

use serde::{Deserialize, Serialize};

/// An authenticated session against the hosted backend.
///
/// Created by password sign-in, destroyed by sign-out. The daemon holds at
/// most one, and persists it locally so a restart can resume it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Backing account id; role rows are repaired to carry this id.
    pub user_id: String,
    pub email: String,
    /// Opaque bearer token presented on row queries.
    pub access_token: String,
}

/// Which portal a sign-in went through. Cached locally as a best-effort
/// redirect hint; never authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginKind {
    Student,
    Department,
    Admin,
}

impl LoginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginKind::Student => "student",
            LoginKind::Department => "department",
            LoginKind::Admin => "admin",
        }
    }

    /// Parse a stored hint; unknown values are discarded rather than erroring.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "student" => Some(LoginKind::Student),
            "department" => Some(LoginKind::Department),
            "admin" => Some(LoginKind::Admin),
            _ => None,
        }
    }
}
