//! Invite fan-out.
//!
//! One document is generated per request and one message is delivered per
//! deduplicated attendee. Delivery failures are collected per recipient
//! and never abort the rest of the batch; the caller gets a count summary
//! instead of an all-or-nothing result. Rate pacing across batches belongs
//! to the mailer and its caller.

use crate::error::InviteResult;
use crate::html::render_invite_html;
use crate::ics::generate_invite;
use crate::invite::InviteRequest;
use crate::mime;
use crate::protocol::OutboundMessage;
use crate::transport::MailTransport;
use chrono::NaiveDate;
use tracing::{info, warn};

/// The address identity invites are sent from.
#[derive(Debug, Clone)]
pub struct SenderIdentity {
    pub from: String,
    /// Defaults to the poll creator's address so replies reach the organizer.
    pub reply_to: Option<String>,
}

/// Outcome of one fan-out.
#[derive(Debug)]
pub struct SendReport {
    pub uid: String,
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
    pub failures: Vec<SendFailure>,
}

#[derive(Debug)]
pub struct SendFailure {
    pub email: String,
    pub error: String,
}

/// Subject line in the reference client's style.
pub fn invite_subject(title: &str, start_date: NaiveDate) -> String {
    format!(
        "Invitation: {} - {}",
        title,
        start_date.format("%a %b %-d, %Y")
    )
}

/// Generate the invite for a request and deliver it to every attendee.
///
/// Structural errors (validation, timezone, non-ASCII payload) surface
/// before any message leaves; transport errors are per-recipient.
pub async fn send_invites<T: MailTransport>(
    transport: &T,
    sender: &SenderIdentity,
    request: &InviteRequest,
) -> InviteResult<SendReport> {
    let invite = generate_invite(request)?;
    // Catch the 7bit conflict before the first recipient, not mid-batch.
    mime::ensure_seven_bit(&invite.ics)?;

    let subject = invite_subject(&request.title, request.start.date);
    let html_body = render_invite_html(request);
    let reply_to = sender
        .reply_to
        .clone()
        .unwrap_or_else(|| request.creator_email.trim().to_string());

    let total = invite.attendees.len();
    let mut sent = 0usize;
    let mut failures = Vec::new();

    for attendee in &invite.attendees {
        let message = OutboundMessage {
            from: sender.from.clone(),
            to: attendee.email.clone(),
            reply_to: Some(reply_to.clone()),
            subject: subject.clone(),
            html_body: html_body.clone(),
            ics_text: invite.ics.clone(),
        };

        match transport.send(&message).await {
            Ok(()) => sent += 1,
            Err(e) => {
                warn!(recipient = %attendee.email, error = %e, "invite delivery failed");
                failures.push(SendFailure {
                    email: attendee.email.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        uid = %invite.uid,
        sent,
        failed = failures.len(),
        total,
        "invite fan-out complete"
    );

    Ok(SendReport {
        uid: invite.uid,
        sent,
        failed: failures.len(),
        total,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InviteError;
    use crate::invite::{AttendeeInput, LocalStamp};
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct FakeMailer {
        fail_for: Vec<&'static str>,
        delivered: Mutex<Vec<OutboundMessage>>,
    }

    impl FakeMailer {
        fn new(fail_for: Vec<&'static str>) -> Self {
            FakeMailer {
                fail_for,
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    impl MailTransport for FakeMailer {
        async fn send(&self, message: &OutboundMessage) -> InviteResult<()> {
            if self.fail_for.contains(&message.to.as_str()) {
                return Err(InviteError::Mailer("mailbox unavailable".to_string()));
            }
            self.delivered.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn make_request(attendees: &[(&str, &str)]) -> InviteRequest {
        InviteRequest {
            poll_id: "p1".to_string(),
            option_id: "o1".to_string(),
            creator_name: "Jane".to_string(),
            creator_email: "jane@x.com".to_string(),
            title: "Sync".to_string(),
            description: None,
            location: None,
            url: "https://convoke.example/p/p1".to_string(),
            start: LocalStamp {
                date: NaiveDate::from_ymd_opt(2025, 11, 15).unwrap(),
                hour: 13,
                minute: 0,
            },
            end: LocalStamp {
                date: NaiveDate::from_ymd_opt(2025, 11, 15).unwrap(),
                hour: 17,
                minute: 0,
            },
            timezone: "America/Los_Angeles".to_string(),
            attendees: attendees
                .iter()
                .map(|(name, email)| AttendeeInput {
                    name: Some(name.to_string()),
                    email: email.to_string(),
                })
                .collect(),
            created: None,
        }
    }

    fn sender() -> SenderIdentity {
        SenderIdentity {
            from: "polls@convoke.example".to_string(),
            reply_to: None,
        }
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_abort_batch() {
        let mailer = FakeMailer::new(vec!["bob@x.com"]);
        let request = make_request(&[
            ("Alice", "alice@x.com"),
            ("Bob", "bob@x.com"),
            ("Carol", "carol@x.com"),
        ]);

        let report = send_invites(&mailer, &sender(), &request).await.unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].email, "bob@x.com");
        assert!(report.failures[0].error.contains("mailbox unavailable"));

        let delivered = mailer.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        assert!(delivered.iter().all(|m| m.to != "bob@x.com"));
    }

    #[tokio::test]
    async fn test_duplicate_attendees_receive_one_message() {
        let mailer = FakeMailer::new(vec![]);
        let request = make_request(&[("Bob", "BOB@x.com"), ("Robert", "bob@x.com")]);

        let report = send_invites(&mailer, &sender(), &request).await.unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.sent, 1);
        assert_eq!(mailer.delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reply_to_defaults_to_organizer() {
        let mailer = FakeMailer::new(vec![]);
        let request = make_request(&[("Bob", "bob@x.com")]);

        send_invites(&mailer, &sender(), &request).await.unwrap();

        let delivered = mailer.delivered.lock().unwrap();
        assert_eq!(delivered[0].reply_to.as_deref(), Some("jane@x.com"));
        assert_eq!(delivered[0].from, "polls@convoke.example");
        assert!(delivered[0].ics_text.contains("METHOD:REQUEST"));
    }

    #[tokio::test]
    async fn test_validation_errors_surface_before_any_send() {
        let mailer = FakeMailer::new(vec![]);
        let mut request = make_request(&[("Bob", "bob@x.com")]);
        request.timezone = "Mars/Olympus_Mons".to_string();

        let err = send_invites(&mailer, &sender(), &request).await.unwrap_err();
        assert!(matches!(err, InviteError::UnknownTimezone(_)));
        assert!(mailer.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_subject_line_format() {
        let subject = invite_subject("Sync", NaiveDate::from_ymd_opt(2025, 11, 15).unwrap());
        assert_eq!(subject, "Invitation: Sync - Sat Nov 15, 2025");
    }
}
