//! Write operations: enqueue a notification email in the outbox.
//!
//! The writer trusts its caller: the batch must already be deduplicated by
//! the eligibility query. Writing the same (submission, unit) pair twice is
//! not detected here.

use subnote_core::{EmailDraft, EmailNotification, SubmissionRef};

use crate::client::{GraphClient, GraphError};
use crate::sparql::{InsertData, Iri, Term};

impl GraphClient {
    /// Persist one email relating `target_unit` and every submission in a
    /// single `INSERT DATA` request, and return the stored resource.
    pub async fn write_notification(
        &self,
        submissions: &[SubmissionRef],
        email: &EmailDraft,
        target_unit: &str,
    ) -> Result<EmailNotification, GraphError> {
        let notification = self.notification_resource(submissions, email, target_unit)?;
        let insert = self.notification_insert(&notification)?;

        self.store()
            .update(&insert.to_sparql())
            .await
            .map_err(GraphError::WriteFailure)?;

        tracing::info!(
            email = %notification.uri,
            target_unit = %target_unit,
            submissions = notification.relations.len() - 1,
            "Notification queued"
        );
        Ok(notification)
    }

    /// Assemble the email resource, checking every precondition.
    pub fn notification_resource(
        &self,
        submissions: &[SubmissionRef],
        email: &EmailDraft,
        target_unit: &str,
    ) -> Result<EmailNotification, GraphError> {
        if submissions.is_empty() {
            return Err(GraphError::InvalidRequest(
                "a notification needs at least one submission".to_string(),
            ));
        }
        if email.to.trim().is_empty() {
            return Err(GraphError::InvalidRequest(format!(
                "email {} has no recipient",
                email.uri
            )));
        }
        let uuid = email.uuid().ok_or_else(|| {
            GraphError::InvalidRequest(format!(
                "email uri {:?} has no trailing path segment to use as uuid",
                email.uri
            ))
        })?;

        let mut relations = vec![target_unit.to_string()];
        for submission in submissions {
            if !relations.contains(&submission.submission_uri) {
                relations.push(submission.submission_uri.clone());
            }
        }

        Ok(EmailNotification {
            uri: email.uri.clone(),
            uuid: uuid.to_string(),
            folder: self.layout().outbox_folder.as_str().to_string(),
            subject: email.subject.clone(),
            html_content: email.html_content.clone(),
            plain_text_content: email.plain_text_content.clone(),
            from: self.from_address().to_string(),
            to: email.to.clone(),
            bcc: email.bcc().map(str::to_string),
            relations,
        })
    }

    /// Build the insert for a notification resource.
    ///
    /// Every IRI is validated here; an invalid one rejects the whole insert.
    pub fn notification_insert(
        &self,
        notification: &EmailNotification,
    ) -> Result<InsertData, GraphError> {
        let subject = iri(&notification.uri)?;
        let mut insert = InsertData::new(self.layout().system_email_graph.clone(), subject);

        insert
            .push("rdf:type", Term::Name("nmo:Email"))
            .push("mu:uuid", Term::Literal(notification.uuid.clone()))
            .push("nmo:isPartOf", Term::Iri(iri(&notification.folder)?))
            .push("nmo:htmlMessageContent", Term::Literal(notification.html_content.clone()))
            .push(
                "nmo:plainTextMessageContent",
                Term::Literal(notification.plain_text_content.clone()),
            )
            .push("nmo:messageSubject", Term::Literal(notification.subject.clone()))
            .push("nmo:emailTo", Term::Literal(notification.to.clone()))
            .push("nmo:messageFrom", Term::Literal(notification.from.clone()))
            .push_opt("nmo:bcc", notification.bcc.clone().map(Term::Literal));

        for relation in &notification.relations {
            insert.push("dct:relation", Term::Iri(iri(relation)?));
        }
        Ok(insert)
    }
}

fn iri(value: &str) -> Result<Iri, GraphError> {
    Iri::parse(value).map_err(GraphError::InvalidRequest)
}
