//! Role profile structures.
//!
//! A signed-in account maps to at most one of three profiles, discriminated
//! by which role table produced the match. The resolved profile is carried
//! as a single tagged union so the three shapes can never be active at once.

use serde::{Deserialize, Serialize};

/// The role tag of a resolved profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Department,
    Admin,
}

/// A student row from the `students` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Backing account id. Repaired to the session's id on resolution.
    pub id: String,
    /// University-issued student number.
    pub student_id: String,
    pub full_name: String,
    pub email: String,
    /// Home academic department name.
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_level: Option<String>,
    /// Why clearance was initiated: discontinue, end_of_year, withdrawal,
    /// non_residence, exclusion, or industrial.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearance_reason: Option<String>,
}

/// Officer role within a department.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficerRole {
    DepartmentOfficer,
    Accounts,
}

/// A department officer row from the `department_users` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepartmentProfile {
    /// Backing account id. Repaired to the session's id on resolution.
    pub id: String,
    pub full_name: String,
    pub email: String,
    /// The one department this officer may clear students for.
    pub department: String,
    pub role: OfficerRole,
}

/// An administrator row from the `admin_users` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    /// Backing account id. Repaired to the session's id on resolution.
    pub id: String,
    pub full_name: String,
    pub email: String,
}

/// The resolved profile: exactly one variant active at a time.
///
/// Tagged with `kind` on the wire; `role` stays free for the officer
/// row's own role column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoleProfile {
    Student(StudentProfile),
    Department(DepartmentProfile),
    Admin(AdminProfile),
}

impl RoleProfile {
    /// The role tag of this profile.
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Student(_) => Role::Student,
            RoleProfile::Department(_) => Role::Department,
            RoleProfile::Admin(_) => Role::Admin,
        }
    }

    /// Backing account id.
    pub fn id(&self) -> &str {
        match self {
            RoleProfile::Student(p) => &p.id,
            RoleProfile::Department(p) => &p.id,
            RoleProfile::Admin(p) => &p.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            RoleProfile::Student(p) => &p.email,
            RoleProfile::Department(p) => &p.email,
            RoleProfile::Admin(p) => &p.email,
        }
    }

    pub fn full_name(&self) -> &str {
        match self {
            RoleProfile::Student(p) => &p.full_name,
            RoleProfile::Department(p) => &p.full_name,
            RoleProfile::Admin(p) => &p.full_name,
        }
    }
}
