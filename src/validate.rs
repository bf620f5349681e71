//! Pre-flight file validation
//!
//! Dropped or selected files are checked synchronously before the
//! staged notifier is ever involved. Rejects surface through the
//! modal-alert path, never through the progress banner, so the
//! error-path and progress-path UIs stay distinct.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// A file offered for upload, as seen by the drop handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCandidate {
    pub name: String,
    pub mime_type: String,
    pub bytes: u64,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

/// Why a candidate was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("unsupported file type: {mime_type}")]
    UnsupportedType { mime_type: String },

    #[error("file is {bytes} bytes, limit is {max_bytes}")]
    TooLarge { bytes: u64, max_bytes: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub file: FileCandidate,
    pub reason: RejectReason,
}

/// Result of validating one dropped batch
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<FileCandidate>,
    pub rejected: Vec<RejectedFile>,
}

/// Allowed types and size limit for an upload surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationPolicy {
    pub allowed_mime_types: HashSet<String>,
    /// Lowercase, without the leading dot
    pub allowed_extensions: HashSet<String>,
    pub max_bytes: u64,
}

impl ValidationPolicy {
    /// Policy for the dashboard's statement-upload surface:
    /// spreadsheet and statement formats, 10 MiB cap
    pub fn statement_uploads() -> Self {
        let mime_types = [
            "text/csv",
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/pdf",
        ];
        let extensions = ["csv", "xls", "xlsx", "pdf"];

        Self {
            allowed_mime_types: mime_types.iter().map(|s| s.to_string()).collect(),
            allowed_extensions: extensions.iter().map(|s| s.to_string()).collect(),
            max_bytes: 10 * 1024 * 1024,
        }
    }

    /// A file passes on either its MIME type or its extension; browsers
    /// report inconsistent MIME types for spreadsheet formats
    fn allows_type(&self, file: &FileCandidate) -> bool {
        if self.allowed_mime_types.contains(&file.mime_type) {
            return true;
        }
        file.extension()
            .map(|ext| self.allowed_extensions.contains(&ext))
            .unwrap_or(false)
    }

    fn check(&self, file: &FileCandidate) -> Result<(), RejectReason> {
        if !self.allows_type(file) {
            return Err(RejectReason::UnsupportedType {
                mime_type: file.mime_type.clone(),
            });
        }
        if file.bytes > self.max_bytes {
            return Err(RejectReason::TooLarge {
                bytes: file.bytes,
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Partition a dropped batch into accepted and rejected files
    pub fn validate(&self, files: &[FileCandidate]) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        for file in files {
            match self.check(file) {
                Ok(()) => outcome.accepted.push(file.clone()),
                Err(reason) => outcome.rejected.push(RejectedFile {
                    file: file.clone(),
                    reason,
                }),
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ValidationPolicy {
        ValidationPolicy::statement_uploads()
    }

    #[test]
    fn test_accepts_known_mime_type() {
        let outcome = policy().validate(&[FileCandidate::new("q3.csv", "text/csv", 1024)]);
        assert_eq!(outcome.accepted.len(), 1);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_falls_back_to_extension_for_generic_mime() {
        let file = FileCandidate::new("ledger.xlsx", "application/octet-stream", 2048);
        let outcome = policy().validate(&[file]);
        assert_eq!(outcome.accepted.len(), 1);
    }

    #[test]
    fn test_rejects_unsupported_type() {
        let file = FileCandidate::new("notes.exe", "application/x-msdownload", 512);
        let outcome = policy().validate(&[file]);
        assert!(outcome.accepted.is_empty());
        assert!(matches!(
            outcome.rejected[0].reason,
            RejectReason::UnsupportedType { .. }
        ));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let file = FileCandidate::new("huge.csv", "text/csv", 11 * 1024 * 1024);
        let outcome = policy().validate(&[file]);
        assert!(matches!(
            outcome.rejected[0].reason,
            RejectReason::TooLarge { .. }
        ));
    }

    #[test]
    fn test_exactly_at_limit_is_accepted() {
        let file = FileCandidate::new("edge.csv", "text/csv", 10 * 1024 * 1024);
        let outcome = policy().validate(&[file]);
        assert_eq!(outcome.accepted.len(), 1);
    }

    #[test]
    fn test_mixed_batch_partitions() {
        let files = vec![
            FileCandidate::new("good.csv", "text/csv", 100),
            FileCandidate::new("bad.gif", "image/gif", 100),
            FileCandidate::new("big.pdf", "application/pdf", 20 * 1024 * 1024),
        ];
        let outcome = policy().validate(&files);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 2);
    }
}
