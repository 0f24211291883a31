//! MIME envelope construction for invite emails.
//!
//! Builds the transport-ready raw message: headers, one HTML body part,
//! and the calendar attachment, which appears exactly once.
//! Duplicating the calendar as both inline text/calendar and attachment
//! confuses some clients, as does re-encoding it (base64 or
//! quoted-printable), so both parts are 7bit and the ICS payload is
//! required to be 7-bit-clean ASCII.

use crate::error::{InviteError, InviteResult};
use crate::ics::fold::{fold, unfold};
use crate::protocol::OutboundMessage;
use uuid::Uuid;

/// Build the raw RFC 2822 message for one recipient.
pub fn build_envelope(message: &OutboundMessage) -> InviteResult<String> {
    // Transport libraries vary in how faithfully they preserve multi-line
    // strings; re-normalize endings and undo any soft-wrap before
    // embedding. For already-normalized input this is byte-identical.
    let ics = fold(&unfold(&message.ics_text));
    ensure_seven_bit(&ics)?;

    let boundary = format!("convoke-{}", Uuid::new_v4());
    let mut out = String::with_capacity(ics.len() + message.html_body.len() + 512);

    push_header(&mut out, "From", &message.from);
    push_header(&mut out, "To", &message.to);
    if let Some(reply_to) = &message.reply_to {
        push_header(&mut out, "Reply-To", reply_to);
    }
    push_header(&mut out, "Subject", &message.subject);
    push_header(&mut out, "MIME-Version", "1.0");
    push_header(
        &mut out,
        "Content-Type",
        &format!("multipart/mixed; boundary=\"{}\"", boundary),
    );
    out.push_str("\r\n");

    out.push_str(&format!("--{}\r\n", boundary));
    push_header(&mut out, "Content-Type", "text/html; charset=UTF-8");
    push_header(&mut out, "Content-Transfer-Encoding", "7bit");
    out.push_str("\r\n");
    out.push_str(&crlf_endings(&message.html_body));
    out.push_str("\r\n");

    out.push_str(&format!("--{}\r\n", boundary));
    push_header(
        &mut out,
        "Content-Type",
        "text/calendar; charset=UTF-8; method=REQUEST; name=\"invite.ics\"",
    );
    push_header(
        &mut out,
        "Content-Disposition",
        "attachment; filename=\"invite.ics\"",
    );
    push_header(&mut out, "Content-Transfer-Encoding", "7bit");
    out.push_str("\r\n");
    out.push_str(&ics);

    out.push_str(&format!("--{}--\r\n", boundary));
    Ok(out)
}

/// Check that a calendar payload can travel as 7bit.
///
/// Non-ASCII content would need a different transfer encoding, which the
/// invite format deliberately avoids; surface the conflict instead of
/// silently mis-encoding.
pub fn ensure_seven_bit(text: &str) -> InviteResult<()> {
    match text.bytes().position(|b| b > 0x7F) {
        Some(offset) => Err(InviteError::NonAsciiPayload {
            byte: text.as_bytes()[offset],
            offset,
        }),
        None => Ok(()),
    }
}

fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

/// Normalize mixed line endings to CRLF.
fn crlf_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(ics: &str) -> OutboundMessage {
        OutboundMessage {
            from: "polls@convoke.example".to_string(),
            to: "bob@x.com".to_string(),
            reply_to: Some("jane@x.com".to_string()),
            subject: "Invitation: Sync".to_string(),
            html_body: "<p>You are invited.</p>".to_string(),
            ics_text: ics.to_string(),
        }
    }

    const ICS: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n";

    #[test]
    fn test_envelope_has_one_calendar_part_and_one_html_part() {
        let raw = build_envelope(&message(ICS)).unwrap();
        assert_eq!(raw.matches("Content-Type: text/calendar").count(), 1);
        assert_eq!(raw.matches("Content-Type: text/html").count(), 1);
        assert_eq!(raw.matches("Content-Transfer-Encoding: 7bit").count(), 2);
        assert_eq!(raw.matches("Content-Disposition: attachment").count(), 1);
    }

    #[test]
    fn test_envelope_headers_and_boundary_terminator() {
        let raw = build_envelope(&message(ICS)).unwrap();
        assert!(raw.starts_with("From: polls@convoke.example\r\n"));
        assert!(raw.contains("Reply-To: jane@x.com\r\n"));
        assert!(raw.contains("MIME-Version: 1.0\r\n"));
        assert!(raw.contains("multipart/mixed; boundary=\"convoke-"));

        let boundary = raw
            .split("boundary=\"")
            .nth(1)
            .and_then(|s| s.split('"').next())
            .unwrap()
            .to_string();
        assert_eq!(raw.matches(&format!("--{}\r\n", boundary)).count(), 2);
        assert!(raw.ends_with(&format!("--{}--\r\n", boundary)));
    }

    #[test]
    fn test_envelope_rewraps_soft_wrapped_ics() {
        // A transport layer softened the folding: bare LF endings. The
        // envelope re-normalizes to CRLF before embedding.
        let raw = build_envelope(&message(
            "BEGIN:VCALENDAR\nVERSION:2.0\nEND:VCALENDAR\n",
        ))
        .unwrap();
        assert!(raw.contains("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n"));
    }

    #[test]
    fn test_non_ascii_ics_is_rejected() {
        let err = build_envelope(&message(
            "BEGIN:VCALENDAR\r\nSUMMARY:Café\r\nEND:VCALENDAR\r\n",
        ))
        .unwrap_err();
        assert!(matches!(err, InviteError::NonAsciiPayload { .. }), "{err}");
    }

    #[test]
    fn test_boundary_differs_per_message() {
        let a = build_envelope(&message(ICS)).unwrap();
        let b = build_envelope(&message(ICS)).unwrap();
        let boundary = |raw: &str| {
            raw.split("boundary=\"")
                .nth(1)
                .and_then(|s| s.split('"').next())
                .unwrap()
                .to_string()
        };
        assert_ne!(boundary(&a), boundary(&b));
    }
}
