//! Core domain types for submission notifications.
//!
//! Organizational units and submissions are owned by external registries and
//! only ever read; the notification resource is the one thing this system
//! writes.

use serde::{Deserialize, Serialize};

// ── Eligibility ──────────────────────────────────────────────────

/// One (submission, target unit) pair that still needs a notification.
///
/// Recomputed on every query and never persisted. A submission related to
/// several target units yields one row per unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRow {
    pub target_unit: String,
    pub target_unit_uuid: String,
    pub target_unit_label: String,
    pub creator_unit_label: String,
    pub decision_type_label: String,
    /// `nmo:sentDate` exactly as stored (usually an `xsd:dateTime` lexical form).
    pub sent_date: String,
    pub email_address: String,
    pub submission_uri: String,
}

/// Reference to a submission contributing to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionRef {
    pub submission_uri: String,
}

impl SubmissionRef {
    pub fn new(submission_uri: impl Into<String>) -> Self {
        Self {
            submission_uri: submission_uri.into(),
        }
    }
}

impl From<&EligibilityRow> for SubmissionRef {
    fn from(row: &EligibilityRow) -> Self {
        Self::new(row.submission_uri.clone())
    }
}

// ── Email ────────────────────────────────────────────────────────

/// Caller-supplied content of a notification email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    /// IRI of the new email resource. Its last path segment becomes `mu:uuid`.
    pub uri: String,
    pub subject: String,
    pub html_content: String,
    pub plain_text_content: String,
    pub to: String,
    pub bcc: Option<String>,
}

impl EmailDraft {
    /// Trailing path segment of the email IRI, if non-empty.
    pub fn uuid(&self) -> Option<&str> {
        self.uri.rsplit('/').next().filter(|segment| !segment.is_empty())
    }

    /// Blind-copy address, treating an empty string as absent.
    pub fn bcc(&self) -> Option<&str> {
        self.bcc.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }
}

/// The complete email resource as it is stored in the outbound graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailNotification {
    pub uri: String,
    pub uuid: String,
    pub folder: String,
    pub subject: String,
    pub html_content: String,
    pub plain_text_content: String,
    pub from: String,
    pub to: String,
    pub bcc: Option<String>,
    /// The target unit first, then every contributing submission.
    pub relations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(uri: &str, bcc: Option<&str>) -> EmailDraft {
        EmailDraft {
            uri: uri.to_string(),
            subject: "s".to_string(),
            html_content: "<p>h</p>".to_string(),
            plain_text_content: "h".to_string(),
            to: "a@example.org".to_string(),
            bcc: bcc.map(str::to_string),
        }
    }

    #[test]
    fn test_uuid_is_trailing_segment() {
        let d = draft("http://data.lblod.info/id/emails/7d3f1c2e", None);
        assert_eq!(d.uuid(), Some("7d3f1c2e"));
    }

    #[test]
    fn test_uuid_missing_on_trailing_slash() {
        assert_eq!(draft("http://data.lblod.info/id/emails/", None).uuid(), None);
    }

    #[test]
    fn test_blank_bcc_is_absent() {
        assert_eq!(draft("http://x/1", Some("  ")).bcc(), None);
        assert_eq!(draft("http://x/1", None).bcc(), None);
        assert_eq!(
            draft("http://x/1", Some("audit@example.org")).bcc(),
            Some("audit@example.org")
        );
    }

    #[test]
    fn test_submission_ref_from_row() {
        let row = EligibilityRow {
            target_unit: "http://data.lblod.info/id/bestuurseenheden/a".to_string(),
            target_unit_uuid: "a".to_string(),
            target_unit_label: "A".to_string(),
            creator_unit_label: "B".to_string(),
            decision_type_label: "approval".to_string(),
            sent_date: "2024-01-02T10:00:00Z".to_string(),
            email_address: "a@example.org".to_string(),
            submission_uri: "http://data.lblod.info/submissions/1".to_string(),
        };
        assert_eq!(
            SubmissionRef::from(&row),
            SubmissionRef::new("http://data.lblod.info/submissions/1")
        );
    }
}
