//! Clearance records and derived view entries.

use serde::{Deserialize, Serialize};

use crate::profile::StudentProfile;

/// Per-department approval state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearanceStatus {
    #[default]
    Pending,
    Cleared,
    Blocked,
}

impl ClearanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearanceStatus::Pending => "pending",
            ClearanceStatus::Cleared => "cleared",
            ClearanceStatus::Blocked => "blocked",
        }
    }
}

impl std::str::FromStr for ClearanceStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClearanceStatus::Pending),
            "cleared" => Ok(ClearanceStatus::Cleared),
            "blocked" => Ok(ClearanceStatus::Blocked),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

impl std::fmt::Display for ClearanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized status string.
#[derive(Debug, thiserror::Error)]
#[error("unknown clearance status: {0}")]
pub struct StatusParseError(pub String);

/// A row from the `clearance_records` table.
///
/// At most one record exists per `(student_id, department)` pair; the
/// backend enforces this via upsert-on-conflict. A missing record means
/// the department's clearance is still pending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClearanceRecord {
    pub student_id: String,
    pub department: String,
    pub status: ClearanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Officer name, stamped when the record was set to cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_by: Option<String>,
    /// RFC 3339 timestamp, stamped when the record was set to cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_at: Option<String>,
    /// Account id of the officer who last wrote this record.
    pub updated_by: String,
}

/// One student-view entry: a department with its (possibly synthesized)
/// clearance state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepartmentClearance {
    pub department: String,
    pub status: ClearanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_by: Option<String>,
}

impl DepartmentClearance {
    /// Synthesized entry for a department with no record on file.
    pub fn pending(department: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            status: ClearanceStatus::Pending,
            notes: None,
            cleared_at: None,
            cleared_by: None,
        }
    }
}

/// One officer-view entry: a student with their state for the officer's
/// department.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudentClearance {
    pub student: StudentProfile,
    pub status: ClearanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ClearanceStatus::Pending,
            ClearanceStatus::Cleared,
            ClearanceStatus::Blocked,
        ] {
            let parsed: ClearanceStatus = status.as_str().parse().expect("parse");
            assert_eq!(parsed, status);
        }
        assert!("approved".parse::<ClearanceStatus>().is_err());
    }

    #[test]
    fn test_status_wire_form() {
        let json = serde_json::to_value(ClearanceStatus::Cleared).expect("serialize");
        assert_eq!(json, serde_json::json!("cleared"));
    }

    #[test]
    fn test_record_optional_fields_omitted() {
        let record = ClearanceRecord {
            student_id: "s-1".to_string(),
            department: "Library".to_string(),
            status: ClearanceStatus::Pending,
            notes: None,
            cleared_by: None,
            cleared_at: None,
            updated_by: "officer-1".to_string(),
        };
        let json = serde_json::to_value(&record).expect("serialize");
        assert!(json.get("cleared_by").is_none());
        assert!(json.get("notes").is_none());
    }
}
