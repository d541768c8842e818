//! Clearance certificate rendering.
//!
//! A pure formatting step: a fully cleared student's profile and view are
//! rendered into a self-contained printable HTML document. Presentation
//! (the print dialog, saving to disk) belongs to the caller; a failure to
//! present is reported there and never retried here.

use chrono::Utc;

use clearpath_types::clearance::{ClearanceStatus, DepartmentClearance};
use clearpath_types::profile::StudentProfile;

/// Certificate generation errors.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    /// One or more departments are not cleared; no document is produced.
    #[error("clearance incomplete: {0} department(s) not yet cleared")]
    Incomplete(usize),
}

/// A rendered certificate.
#[derive(Clone, Debug)]
pub struct Certificate {
    /// Identifier derived from the profile id (first 8 characters,
    /// uppercased).
    pub id: String,
    /// Self-contained printable HTML document.
    pub html: String,
}

/// Render the clearance certificate.
///
/// Precondition: every entry in `view` has status cleared. Otherwise
/// fails with [`CertificateError::Incomplete`] and produces no output.
pub fn render(
    student: &StudentProfile,
    view: &[DepartmentClearance],
) -> Result<Certificate, CertificateError> {
    let outstanding = view
        .iter()
        .filter(|entry| entry.status != ClearanceStatus::Cleared)
        .count();
    if outstanding > 0 {
        return Err(CertificateError::Incomplete(outstanding));
    }

    let id = certificate_id(&student.id);
    let issued = Utc::now().format("%-d %B %Y").to_string();

    let mut student_info = String::new();
    student_info.push_str(&format!(
        "      <p><strong>Name:</strong> {}</p>\n",
        escape(&student.full_name)
    ));
    student_info.push_str(&format!(
        "      <p><strong>Student ID:</strong> {}</p>\n",
        escape(&student.student_id)
    ));
    student_info.push_str(&format!(
        "      <p><strong>Department:</strong> {}</p>\n",
        escape(&student.department)
    ));
    if let Some(course) = &student.course_code {
        student_info.push_str(&format!(
            "      <p><strong>Course:</strong> {}</p>\n",
            escape(course)
        ));
    }
    if let Some(year) = &student.year_level {
        student_info.push_str(&format!(
            "      <p><strong>Year:</strong> {}</p>\n",
            escape(year)
        ));
    }
    if let Some(reason) = &student.clearance_reason {
        student_info.push_str(&format!(
            "      <p><strong>Reason:</strong> {}</p>\n",
            escape(&reason.replace('_', " ").to_uppercase())
        ));
    }

    let mut departments = String::new();
    for entry in view {
        departments.push_str("      <div class=\"department-item\">\n");
        departments.push_str(&format!(
            "        <strong>{}</strong><br>\n",
            escape(&entry.department)
        ));
        departments.push_str(&format!(
            "        Status: {}<br>\n",
            entry.status.as_str().to_uppercase()
        ));
        if let Some(cleared_at) = &entry.cleared_at {
            departments.push_str(&format!(
                "        Cleared on: {}<br>\n",
                escape(&display_date(cleared_at))
            ));
        }
        if let Some(cleared_by) = &entry.cleared_by {
            departments.push_str(&format!(
                "        Approved by: {}\n",
                escape(cleared_by)
            ));
        }
        departments.push_str("      </div>\n");
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Clearance Certificate - {student_id}</title>
  <style>
    body {{
      font-family: 'Times New Roman', serif;
      max-width: 800px;
      margin: 40px auto;
      padding: 40px;
      border: 3px double #800000;
    }}
    .header {{ text-align: center; margin-bottom: 40px; }}
    .logo {{ font-size: 48px; color: #800000; font-weight: bold; }}
    .university {{ font-size: 24px; color: #800000; margin: 10px 0; }}
    .title {{ font-size: 32px; color: #800000; margin: 30px 0; text-decoration: underline; }}
    .content {{ line-height: 2; font-size: 16px; }}
    .student-info {{ margin: 30px 0; padding: 20px; background: #f5f5f5; }}
    .department-item {{ padding: 10px; margin: 5px 0; border-left: 4px solid #DAA520; background: #f9f9f9; }}
    .signature {{ margin-top: 60px; text-align: right; }}
    .signature-line {{ border-top: 2px solid #000; width: 300px; margin: 10px 0 5px auto; }}
    .footer {{ margin-top: 50px; text-align: center; }}
    @media print {{ body {{ margin: 0; }} }}
  </style>
</head>
<body>
  <div class="header">
    <div class="logo">PNG UOT</div>
    <div class="university">Papua New Guinea University of Technology</div>
    <div class="title">CLEARANCE CERTIFICATE</div>
  </div>
  <div class="content">
    <p>This is to certify that:</p>
    <div class="student-info">
{student_info}    </div>
    <p>Has successfully completed clearance from the following departments:</p>
    <div class="department-list">
{departments}    </div>
    <p>This certificate confirms that the student has no outstanding obligations
    to the university and is cleared for:</p>
    <ul>
      <li>Collection of academic transcripts</li>
      <li>Final certificate collection</li>
      <li>Exit from university premises</li>
    </ul>
    <div class="signature">
      <div class="signature-line"></div>
      <p><strong>Registrar</strong></p>
      <p>Papua New Guinea University of Technology</p>
      <p>Date: {issued}</p>
    </div>
    <div class="footer">
      <p><em>This is an automatically generated certificate. Certificate ID: {id}</em></p>
    </div>
  </div>
</body>
</html>
"#,
        student_id = escape(&student.student_id),
    );

    Ok(Certificate { id, html })
}

/// Certificate identifier: the first 8 characters of the profile id,
/// uppercased.
fn certificate_id(profile_id: &str) -> String {
    profile_id.chars().take(8).collect::<String>().to_uppercase()
}

/// Render an RFC 3339 timestamp as a plain date; anything unparseable is
/// shown as-is.
fn display_date(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.format("%-d %B %Y").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Minimal HTML escaping for interpolated profile fields.
fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentProfile {
        StudentProfile {
            id: "a1b2c3d4-0000-1111".to_string(),
            student_id: "20230001".to_string(),
            full_name: "Alice Kila".to_string(),
            email: "alice@u.edu".to_string(),
            department: "Computer Science".to_string(),
            phone: None,
            course_code: Some("BSCS".to_string()),
            year_level: Some("4".to_string()),
            clearance_reason: Some("end_of_year".to_string()),
        }
    }

    fn cleared(department: &str) -> DepartmentClearance {
        DepartmentClearance {
            department: department.to_string(),
            status: ClearanceStatus::Cleared,
            notes: None,
            cleared_at: Some("2026-07-01T09:30:00+00:00".to_string()),
            cleared_by: Some("Lena Officer".to_string()),
        }
    }

    #[test]
    fn test_incomplete_view_produces_no_document() {
        let view = vec![
            cleared("Library"),
            DepartmentClearance::pending("Mess"),
            DepartmentClearance::pending("Bookshop"),
        ];
        let err = render(&student(), &view);
        assert!(matches!(err, Err(CertificateError::Incomplete(2))));
    }

    #[test]
    fn test_certificate_embeds_profile_and_departments() {
        let view = vec![cleared("Library"), cleared("Computer Science")];
        let cert = render(&student(), &view).expect("render");

        assert_eq!(cert.id, "A1B2C3D4");
        assert!(cert.html.contains("Alice Kila"));
        assert!(cert.html.contains("20230001"));
        assert!(cert.html.contains("END OF YEAR"));
        assert!(cert.html.contains("Library"));
        assert!(cert.html.contains("Approved by: Lena Officer"));
        assert!(cert.html.contains("Cleared on: 1 July 2026"));
        assert!(cert.html.contains("Certificate ID: A1B2C3D4"));
    }

    #[test]
    fn test_fields_are_escaped() {
        let mut s = student();
        s.full_name = "Alice <Kila> & Co".to_string();
        let cert = render(&s, &[cleared("Library")]).expect("render");
        assert!(cert.html.contains("Alice &lt;Kila&gt; &amp; Co"));
        assert!(!cert.html.contains("<Kila>"));
    }
}
