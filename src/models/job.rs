//! Scan job model and status lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a scan job.
///
/// Terminal states (`Completed`, `Failed`, `Cancelled`) are final; a job
/// never leaves them once entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Parse from a database string, defaulting to `Pending` on unknown values.
    pub fn from_str(s: &str) -> Self {
        match s {
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            "cancelled" => JobStatus::Cancelled,
            _ => JobStatus::Pending,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A folder scan job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: i32,
    pub folder_path: String,
    pub status: JobStatus,
    pub total_files: i32,
    pub processed_files: i32,
    pub csv_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ScanJob {
    /// Progress as a percentage in [0, 100].
    pub fn progress_percentage(&self) -> f64 {
        if self.total_files <= 0 {
            0.0
        } else {
            (self.processed_files as f64 / self.total_files as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert_eq!(JobStatus::from_str(status.as_str()), status);
        }
    }

    #[test]
    fn test_unknown_status_defaults_to_pending() {
        assert_eq!(JobStatus::from_str("garbage"), JobStatus::Pending);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_progress_percentage() {
        let mut job = ScanJob {
            id: 1,
            folder_path: "/tmp/in".to_string(),
            status: JobStatus::Running,
            total_files: 4,
            processed_files: 1,
            csv_path: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        assert_eq!(job.progress_percentage(), 25.0);

        job.total_files = 0;
        assert_eq!(job.progress_percentage(), 0.0);
    }
}
