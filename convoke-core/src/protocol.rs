//! Mailer protocol types.
//!
//! Defines the JSON protocol used for communication between the invite
//! pipeline and mailer binaries over stdin/stdout. The protocol is
//! language-agnostic: any executable that speaks it can deliver mail
//! (SMTP relay, hosted email API, dry-run logger).

use serde::{Deserialize, Serialize};

/// Commands that mailers must implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Send,
}

/// One fully-rendered message for one recipient.
///
/// This is the whole contract with the transport: mailers must deliver the
/// calendar text exactly as given (7bit, no re-encoding): base64 or
/// quoted-printable re-encoding has been observed to stop clients from
/// rendering the invite inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub from: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html_body: String,
    pub ics_text: String,
}

/// Request sent to the mailer.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    pub params: OutboundMessage,
}

/// Response sent back by the mailer.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data }).unwrap()
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::to_string(&Response::<()>::Error {
            error: msg.to_string(),
        })
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = Request {
            command: Command::Send,
            params: OutboundMessage {
                from: "polls@convoke.example".to_string(),
                to: "bob@x.com".to_string(),
                reply_to: None,
                subject: "Invitation: Sync".to_string(),
                html_body: "<p>hi</p>".to_string(),
                ics_text: "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n".to_string(),
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"command\":\"send\""));
        assert!(json.contains("\"to\":\"bob@x.com\""));
    }

    #[test]
    fn test_response_round_trip() {
        let ok: Response<()> = serde_json::from_str("{\"status\":\"success\",\"data\":null}").unwrap();
        assert!(matches!(ok, Response::Success { .. }));

        let err: Response<()> =
            serde_json::from_str("{\"status\":\"error\",\"error\":\"rate limited\"}").unwrap();
        match err {
            Response::Error { error } => assert_eq!(error, "rate limited"),
            Response::Success { .. } => panic!("expected error"),
        }
    }
}
