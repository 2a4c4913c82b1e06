//! Types for the mirror module.

use std::fmt;

/// One image to mirror: where it lands locally and which origin serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Local destination path, also the path component of the request URL.
    pub destination_path: String,
    /// Origin prefix the destination path is appended to.
    pub origin_host: String,
}

impl Job {
    /// Creates a new job.
    pub fn new(destination_path: impl Into<String>, origin_host: impl Into<String>) -> Self {
        Self {
            destination_path: destination_path.into(),
            origin_host: origin_host.into(),
        }
    }

    /// The URL this job is fetched from (`origin_host` + `destination_path`).
    pub fn url(&self) -> String {
        format!("{}{}", self.origin_host, self.destination_path)
    }
}

/// Result of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A file already exists at the destination.
    SkippedExists,
    /// Another worker is already fetching this destination.
    SkippedDuplicate,
    /// The origin answered with something other than 200.
    SkippedNotFound { status: u16 },
    /// Body fully written to disk.
    Success { bytes: u64 },
    /// Transport, create or write error.
    Failed { reason: String },
}

impl FetchOutcome {
    /// Short name used in logs and stats.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchOutcome::SkippedExists => "skipped_exists",
            FetchOutcome::SkippedDuplicate => "skipped_duplicate",
            FetchOutcome::SkippedNotFound { .. } => "skipped_not_found",
            FetchOutcome::Success { .. } => "success",
            FetchOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_url_is_plain_concatenation() {
        let job = Job::new("uploads/a.png", "https://cdn.example.com/");
        assert_eq!(job.url(), "https://cdn.example.com/uploads/a.png");

        // No slash normalization
        let job = Job::new("uploads/a.png", "https://cdn.example.com");
        assert_eq!(job.url(), "https://cdn.example.comuploads/a.png");
    }

    #[test]
    fn test_outcome_names() {
        assert_eq!(FetchOutcome::SkippedExists.to_string(), "skipped_exists");
        assert_eq!(
            FetchOutcome::SkippedNotFound { status: 404 }.as_str(),
            "skipped_not_found"
        );
        assert!(FetchOutcome::Success { bytes: 1 }.is_success());
        assert!(!FetchOutcome::Failed {
            reason: "boom".to_string()
        }
        .is_success());
    }
}
