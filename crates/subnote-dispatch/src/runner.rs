//! One dispatch run: find → plan → compose → write.
//!
//! Recipients are written one after another. A failed eligibility query
//! aborts the run; a failed write only skips that recipient, whose rows stay
//! eligible for the next run.

use serde::Serialize;

use subnote_core::config::EmailSettings;
use subnote_graph::GraphClient;

use crate::compose::compose_email;
use crate::error::Result;
use crate::plan::{plan, RecipientBatch};

/// Outcome of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub rows: usize,
    pub recipients: usize,
    pub written: usize,
    pub failed: usize,
    pub submissions: usize,
    pub dry_run: bool,
}

impl DispatchReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Execute a single dispatch run.
///
/// With `dry_run` every insert is built and logged but nothing is written.
pub async fn run_once(
    graph: &GraphClient,
    email: &EmailSettings,
    dry_run: bool,
) -> Result<DispatchReport> {
    let rows = graph.find_eligible_submissions().await?;
    let batches = plan(&rows);

    let mut report = DispatchReport {
        rows: rows.len(),
        recipients: batches.len(),
        dry_run,
        ..Default::default()
    };

    for batch in &batches {
        let outcome = if dry_run {
            preview(graph, batch, email)
        } else {
            write(graph, batch, email).await
        };

        match outcome {
            Ok(count) => {
                if !dry_run {
                    report.written += 1;
                }
                report.submissions += count;
            }
            Err(e) => {
                tracing::error!(
                    target_unit = %batch.target_unit,
                    recipients = %batch.recipients(),
                    error = %e,
                    "Skipping recipient"
                );
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        rows = report.rows,
        recipients = report.recipients,
        written = report.written,
        failed = report.failed,
        submissions = report.submissions,
        dry_run,
        "Dispatch run complete"
    );
    Ok(report)
}

async fn write(graph: &GraphClient, batch: &RecipientBatch, email: &EmailSettings) -> Result<usize> {
    let draft = compose_email(batch, email);
    let submissions = batch.submissions();
    graph
        .write_notification(&submissions, &draft, &batch.target_unit)
        .await?;
    Ok(submissions.len())
}

fn preview(graph: &GraphClient, batch: &RecipientBatch, email: &EmailSettings) -> Result<usize> {
    let draft = compose_email(batch, email);
    let submissions = batch.submissions();
    let notification = graph.notification_resource(&submissions, &draft, &batch.target_unit)?;
    let insert = graph.notification_insert(&notification)?;
    tracing::info!(
        target_unit = %batch.target_unit,
        recipients = %batch.recipients(),
        update = %insert.to_sparql(),
        "Dry run: notification not written"
    );
    Ok(submissions.len())
}
