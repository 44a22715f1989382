//! Group eligibility rows into one batch per recipient.

use std::collections::BTreeMap;

use serde::Serialize;

use subnote_core::{EligibilityRow, SubmissionRef};

/// Everything one notification email will cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientBatch {
    pub target_unit: String,
    pub target_unit_label: String,
    /// Distinct notification addresses of the unit, sorted.
    pub email_addresses: Vec<String>,
    pub items: Vec<BatchItem>,
}

/// One submission as listed in the email body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub submission_uri: String,
    pub creator_unit_label: String,
    pub decision_type_label: String,
    pub sent_date: String,
}

impl RecipientBatch {
    /// Value for `nmo:emailTo`: every address of the unit, comma separated.
    pub fn recipients(&self) -> String {
        self.email_addresses.join(", ")
    }

    pub fn submissions(&self) -> Vec<SubmissionRef> {
        self.items
            .iter()
            .map(|item| SubmissionRef::new(item.submission_uri.clone()))
            .collect()
    }
}

/// Group rows by target unit.
///
/// A unit gets exactly one batch, so one email relates each (submission,
/// unit) pair. A unit with several notification addresses has all of them on
/// that one email. Within a batch a submission appears once, even if the
/// query returned it several times (e.g. a decision type with labels in
/// several languages). Batches, addresses and items are ordered so runs are
/// reproducible.
pub fn plan(rows: &[EligibilityRow]) -> Vec<RecipientBatch> {
    let mut batches: BTreeMap<&str, RecipientBatch> = BTreeMap::new();

    for row in rows {
        let batch = batches
            .entry(row.target_unit.as_str())
            .or_insert_with(|| RecipientBatch {
                target_unit: row.target_unit.clone(),
                target_unit_label: row.target_unit_label.clone(),
                email_addresses: Vec::new(),
                items: Vec::new(),
            });

        if !batch.email_addresses.contains(&row.email_address) {
            batch.email_addresses.push(row.email_address.clone());
        }

        if batch
            .items
            .iter()
            .any(|item| item.submission_uri == row.submission_uri)
        {
            continue;
        }
        batch.items.push(BatchItem {
            submission_uri: row.submission_uri.clone(),
            creator_unit_label: row.creator_unit_label.clone(),
            decision_type_label: row.decision_type_label.clone(),
            sent_date: row.sent_date.clone(),
        });
    }

    batches
        .into_values()
        .map(|mut batch| {
            batch.email_addresses.sort();
            batch
                .items
                .sort_by(|a, b| a.submission_uri.cmp(&b.submission_uri));
            batch
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(target: &str, email: &str, submission: &str, decision: &str) -> EligibilityRow {
        EligibilityRow {
            target_unit: format!("http://data.lblod.info/id/bestuurseenheden/{target}"),
            target_unit_uuid: target.to_string(),
            target_unit_label: format!("Unit {target}"),
            creator_unit_label: "Unit B".to_string(),
            decision_type_label: decision.to_string(),
            sent_date: "2024-03-01T09:30:00Z".to_string(),
            email_address: email.to_string(),
            submission_uri: format!("http://data.lblod.info/submissions/{submission}"),
        }
    }

    #[test]
    fn test_groups_by_recipient() {
        let rows = vec![
            row("a", "a@example.org", "2", "approval"),
            row("c", "c@example.org", "1", "approval"),
            row("a", "a@example.org", "1", "budget"),
        ];

        let batches = plan(&rows);

        assert_eq!(batches.len(), 2);
        assert!(batches[0].target_unit.ends_with("/a"));
        assert_eq!(batches[0].items.len(), 2);
        assert!(batches[0].items[0].submission_uri.ends_with("/1"));
        assert_eq!(batches[0].items[0].decision_type_label, "budget");
        assert!(batches[1].target_unit.ends_with("/c"));
        assert_eq!(batches[1].submissions().len(), 1);
    }

    #[test]
    fn test_repeated_submission_listed_once() {
        let rows = vec![
            row("a", "a@example.org", "1", "approval"),
            row("a", "a@example.org", "1", "goedkeuring"),
        ];

        let batches = plan(&rows);

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].items.len(), 1);
        assert_eq!(batches[0].items[0].decision_type_label, "approval");
    }

    #[test]
    fn test_one_batch_per_unit_across_addresses() {
        let rows = vec![
            row("a", "secretariaat@example.org", "1", "approval"),
            row("a", "a@example.org", "1", "approval"),
            row("a", "a@example.org", "2", "approval"),
            row("a", "secretariaat@example.org", "2", "approval"),
        ];

        let batches = plan(&rows);

        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].email_addresses,
            vec!["a@example.org", "secretariaat@example.org"]
        );
        assert_eq!(batches[0].recipients(), "a@example.org, secretariaat@example.org");
        assert_eq!(batches[0].items.len(), 2);
    }

    #[test]
    fn test_no_rows_no_batches() {
        assert!(plan(&[]).is_empty());
    }
}
