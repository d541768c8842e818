//! Reminder notification seam.
//!
//! Reminder delivery is an external collaborator: the application only
//! needs the interface. The shipped implementation records the reminder
//! in the daemon log and reports success; a real mail integration would
//! implement the same trait.

use async_trait::async_trait;
use tracing::info;

use clearpath_types::profile::StudentProfile;

/// Notification errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("reminder rejected: {0}")]
    Rejected(String),
}

/// Sends clearance reminders to students.
#[async_trait]
pub trait ReminderNotifier: Send + Sync {
    /// Remind a student about an outstanding clearance.
    async fn send_reminder(
        &self,
        student: &StudentProfile,
        department: &str,
    ) -> Result<(), NotifyError>;
}

/// Log-only notifier.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl ReminderNotifier for LogNotifier {
    async fn send_reminder(
        &self,
        student: &StudentProfile,
        department: &str,
    ) -> Result<(), NotifyError> {
        info!(
            student = %student.student_id,
            email = %student.email,
            department,
            "clearance reminder recorded"
        );
        Ok(())
    }
}
