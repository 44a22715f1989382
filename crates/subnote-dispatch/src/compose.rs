//! Email content for a recipient batch.

use chrono::{DateTime, NaiveDateTime};
use uuid::Uuid;

use subnote_core::config::EmailSettings;
use subnote_core::EmailDraft;

use crate::plan::{BatchItem, RecipientBatch};

/// Build the email for one batch under a freshly minted IRI.
pub fn compose_email(batch: &RecipientBatch, settings: &EmailSettings) -> EmailDraft {
    compose_email_with_id(batch, settings, Uuid::new_v4())
}

/// Same as [`compose_email`] with a caller-chosen id.
pub fn compose_email_with_id(batch: &RecipientBatch, settings: &EmailSettings, id: Uuid) -> EmailDraft {
    let base = settings.email_base_uri.trim_end_matches('/');

    EmailDraft {
        uri: format!("{base}/{id}"),
        subject: settings.subject.clone(),
        html_content: html_body(batch, settings.app_base_url.as_deref()),
        plain_text_content: plain_body(batch, settings.app_base_url.as_deref()),
        to: batch.recipients(),
        bcc: settings.bcc_address.clone(),
    }
}

fn plain_body(batch: &RecipientBatch, app_url: Option<&str>) -> String {
    let mut body = format!(
        "Dear {},\n\nThe following submissions were sent to your organization:\n\n",
        batch.target_unit_label
    );
    for item in &batch.items {
        body.push_str(&format!("- {}\n", describe(item)));
    }
    if let Some(url) = app_url {
        body.push_str(&format!("\nYou can consult them at {url}\n"));
    }
    body
}

fn html_body(batch: &RecipientBatch, app_url: Option<&str>) -> String {
    let mut body = format!(
        "<p>Dear {},</p>\n<p>The following submissions were sent to your organization:</p>\n<ul>\n",
        escape_html(&batch.target_unit_label)
    );
    for item in &batch.items {
        body.push_str(&format!("  <li>{}</li>\n", escape_html(&describe(item))));
    }
    body.push_str("</ul>\n");
    if let Some(url) = app_url {
        let url = escape_html(url);
        body.push_str(&format!(
            "<p>You can consult them at <a href=\"{url}\">{url}</a></p>\n"
        ));
    }
    body
}

fn describe(item: &BatchItem) -> String {
    format!(
        "{} from {}, sent on {}",
        item.decision_type_label,
        item.creator_unit_label,
        format_sent_date(&item.sent_date)
    )
}

/// `dd/mm/YYYY` for `xsd:dateTime` values, with or without an offset;
/// anything else is shown as stored.
pub fn format_sent_date(raw: &str) -> String {
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return date.format("%d/%m/%Y").to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> RecipientBatch {
        RecipientBatch {
            target_unit: "http://data.lblod.info/id/bestuurseenheden/a".to_string(),
            target_unit_label: "Unit A".to_string(),
            email_addresses: vec!["a@example.org".to_string()],
            items: vec![
                BatchItem {
                    submission_uri: "http://data.lblod.info/submissions/1".to_string(),
                    creator_unit_label: "Unit <B> & co".to_string(),
                    decision_type_label: "approval".to_string(),
                    sent_date: "2024-03-01T09:30:00Z".to_string(),
                },
                BatchItem {
                    submission_uri: "http://data.lblod.info/submissions/2".to_string(),
                    creator_unit_label: "Unit C".to_string(),
                    decision_type_label: "budget".to_string(),
                    sent_date: "yesterday".to_string(),
                },
            ],
        }
    }

    fn settings() -> EmailSettings {
        EmailSettings {
            from_address: "noreply@example.org".to_string(),
            bcc_address: Some("audit@example.org".to_string()),
            app_base_url: Some("https://loket.example.org".to_string()),
            ..EmailSettings::default()
        }
    }

    #[test]
    fn test_uri_ends_with_id() {
        let id = Uuid::new_v4();
        let email = compose_email_with_id(&batch(), &settings(), id);
        assert_eq!(email.uri, format!("http://data.lblod.info/id/emails/{id}"));
        assert_eq!(email.uuid(), Some(id.to_string().as_str()));
    }

    #[test]
    fn test_uri_without_trailing_slash_in_base() {
        let mut s = settings();
        s.email_base_uri = "http://example.org/emails".to_string();
        let id = Uuid::new_v4();
        let email = compose_email_with_id(&batch(), &s, id);
        assert_eq!(email.uri, format!("http://example.org/emails/{id}"));
    }

    #[test]
    fn test_recipient_and_bcc_from_batch_and_settings() {
        let email = compose_email(&batch(), &settings());
        assert_eq!(email.to, "a@example.org");
        assert_eq!(email.bcc.as_deref(), Some("audit@example.org"));
        assert_eq!(email.subject, "New submissions received");
    }

    #[test]
    fn test_bodies_list_every_submission() {
        let email = compose_email(&batch(), &settings());
        assert!(email
            .plain_text_content
            .contains("- approval from Unit <B> & co, sent on 01/03/2024"));
        assert!(email
            .plain_text_content
            .contains("- budget from Unit C, sent on yesterday"));
        assert!(email
            .html_content
            .contains("<li>approval from Unit &lt;B&gt; &amp; co, sent on 01/03/2024</li>"));
        assert!(email
            .html_content
            .contains("<a href=\"https://loket.example.org\">"));
    }

    #[test]
    fn test_format_sent_date() {
        assert_eq!(format_sent_date("2024-12-31T23:00:00+01:00"), "31/12/2024");
        assert_eq!(format_sent_date("not a date"), "not a date");
    }

    #[test]
    fn test_format_sent_date_without_offset() {
        assert_eq!(format_sent_date("2024-03-01T09:30:00"), "01/03/2024");
        assert_eq!(format_sent_date("2024-03-01T09:30:00.250"), "01/03/2024");
    }

    #[test]
    fn test_every_unit_address_is_a_recipient() {
        let mut b = batch();
        b.email_addresses.push("secretariaat@example.org".to_string());
        let email = compose_email(&b, &settings());
        assert_eq!(email.to, "a@example.org, secretariaat@example.org");
    }
}
