//! Invite document construction.
//!
//! Drives the `icalendar` crate to produce the raw VCALENDAR/VEVENT text
//! for a meeting request. The raw output is not client-safe on its own:
//! the conformance passes in [`super::normalize`] repair the library's
//! folding, strip its calendar-name hints, and inject the VTIMEZONE block
//! it cannot emit.

use crate::error::{InviteError, InviteResult};
use crate::ics::escape::{escape_text, sanitize_cn};
use crate::ics::normalize::normalize;
use crate::ics::vtimezone;
use crate::invite::{Attendee, InviteRequest, dedup_attendees};
use chrono::{DateTime, NaiveDateTime, Utc};
use icalendar::{Calendar, Component, EventLike, Property};

/// Product identifier stamped on every generated document.
pub const PRODID: &str = "-//Convoke//Convoke Invites//EN";

/// A generated invite, ready for the MIME envelope and fan-out.
#[derive(Debug, Clone)]
pub struct Invite {
    /// Stable event identifier, also reused on retried sends
    pub uid: String,
    /// Deduplicated recipients, in first-seen order
    pub attendees: Vec<Attendee>,
    /// Normalized, client-safe ICS text (CRLF, folded at 75 octets)
    pub ics: String,
}

/// Builder output before conformance normalization.
#[derive(Debug, Clone)]
pub struct RawInvite {
    pub uid: String,
    pub attendees: Vec<Attendee>,
    /// The generator library's serialized text, defects and all
    pub ics: String,
}

/// Build and normalize the invite document for a request.
pub fn generate_invite(request: &InviteRequest) -> InviteResult<Invite> {
    let raw = generate_raw_ics(request)?;
    let ics = normalize(&raw.ics)?;
    Ok(Invite {
        uid: raw.uid,
        attendees: raw.attendees,
        ics,
    })
}

/// Build the raw (un-normalized) invite document for a request.
///
/// Validates the request, deduplicates attendees, and refuses to proceed
/// if the timezone has no known transition rules, since emitting
/// TZID-qualified times without a resolvable definition would corrupt
/// displayed times.
pub fn generate_raw_ics(request: &InviteRequest) -> InviteResult<RawInvite> {
    let (start, end) = validate_times(request)?;
    validate_fields(request)?;

    let attendees = dedup_attendees(&request.attendees);
    if attendees.is_empty() {
        return Err(InviteError::InvalidInput {
            field: "attendees",
            reason: "at least one attendee is required".to_string(),
        });
    }
    for attendee in &attendees {
        if !valid_email(&attendee.email) {
            return Err(InviteError::InvalidInput {
                field: "attendees",
                reason: format!("malformed email '{}'", attendee.email),
            });
        }
    }

    vtimezone::lookup(&request.timezone)?;

    let created = request.created.unwrap_or_else(Utc::now);
    let uid = event_uid(&request.poll_id, &request.option_id, created);
    let ics = build_calendar(request, &attendees, &uid, created, start, end);

    Ok(RawInvite {
        uid,
        attendees,
        ics,
    })
}

fn validate_times(request: &InviteRequest) -> InviteResult<(NaiveDateTime, NaiveDateTime)> {
    let start = request.start.to_naive().ok_or(InviteError::InvalidInput {
        field: "start",
        reason: "hour/minute out of range".to_string(),
    })?;
    let end = request.end.to_naive().ok_or(InviteError::InvalidInput {
        field: "end",
        reason: "hour/minute out of range".to_string(),
    })?;
    if start >= end {
        return Err(InviteError::InvalidInput {
            field: "end",
            reason: "must be after start".to_string(),
        });
    }
    Ok((start, end))
}

fn validate_fields(request: &InviteRequest) -> InviteResult<()> {
    if request.title.trim().is_empty() {
        return Err(InviteError::InvalidInput {
            field: "title",
            reason: "must not be empty".to_string(),
        });
    }
    if !valid_email(request.creator_email.trim()) {
        return Err(InviteError::InvalidInput {
            field: "creator_email",
            reason: format!("malformed email '{}'", request.creator_email),
        });
    }
    Ok(())
}

fn valid_email(s: &str) -> bool {
    let mut parts = s.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !domain.is_empty()
                && !s.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

/// Derive the event UID from shortened poll/option references plus the
/// creation timestamp. Bounded well under one folded line so the UID token
/// itself is never split.
fn event_uid(poll_id: &str, option_id: &str, created: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{}@convoke",
        short_ref(poll_id),
        short_ref(option_id),
        created.timestamp()
    )
}

/// Shorten an identifier to at most 8 alphanumeric characters.
fn short_ref(id: &str) -> String {
    let short: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_lowercase();
    if short.is_empty() { "0".to_string() } else { short }
}

fn build_calendar(
    request: &InviteRequest,
    attendees: &[Attendee],
    uid: &str,
    created: DateTime<Utc>,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> String {
    let mut cal = Calendar::new();
    cal.append_property(Property::new("METHOD", "REQUEST"));
    // Calendar-name hints; stripped again during normalization since strict
    // parsers reject them.
    cal.append_property(Property::new("X-WR-CALNAME", escape_text(&request.title)));
    cal.append_property(Property::new("X-WR-TIMEZONE", &request.timezone));

    let mut event = icalendar::Event::new();
    event.uid(uid);
    event.summary(&escape_text(&request.title));

    let stamp = created.format("%Y%m%dT%H%M%SZ").to_string();
    event.add_property("DTSTAMP", &stamp);
    event.add_property("CREATED", &stamp);
    event.add_property("LAST-MODIFIED", &stamp);
    // SEQUENCE increments only when event details change; there is no
    // update path, so a regenerated invite keeps 0.
    event.add_property("SEQUENCE", "0");

    add_local_datetime(&mut event, "DTSTART", start, &request.timezone);
    add_local_datetime(&mut event, "DTEND", end, &request.timezone);

    if let Some(desc) = &request.description {
        event.description(&escape_text(desc));
    }
    if let Some(loc) = &request.location {
        event.location(&escape_text(loc));
    }
    event.add_property("URL", &request.url);
    event.add_property("STATUS", "CONFIRMED");
    event.add_property("X-MICROSOFT-CDO-BUSYSTATUS", "BUSY");

    let mut organizer = Property::new(
        "ORGANIZER",
        format!("mailto:{}", request.creator_email.trim()),
    );
    let cn = sanitize_cn(&request.creator_name);
    if !cn.is_empty() {
        organizer.add_parameter("CN", &cn);
    }
    event.append_property(organizer);

    for attendee in attendees {
        let mut prop = Property::new("ATTENDEE", format!("mailto:{}", attendee.email));
        prop.add_parameter("CUTYPE", "INDIVIDUAL");
        prop.add_parameter("ROLE", "REQ-PARTICIPANT");
        prop.add_parameter("PARTSTAT", "NEEDS-ACTION");
        prop.add_parameter("RSVP", "TRUE");
        prop.add_parameter("CN", &sanitize_cn(&attendee.name));
        event.append_multi_property(prop);
    }

    let event = event.done();
    cal.push(event);
    let cal = cal.done();

    set_prodid(&cal.to_string())
}

/// Emit a TZID-qualified local time, never a bare UTC `Z` timestamp;
/// clients do not reliably re-localize plain UTC to the organizer's
/// intended wall-clock time.
fn add_local_datetime(event: &mut icalendar::Event, name: &str, dt: NaiveDateTime, tzid: &str) {
    let mut prop = Property::new(name, dt.format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", tzid);
    event.append_property(prop);
}

/// Replace the icalendar crate's default PRODID with ours.
fn set_prodid(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODID);
        } else {
            result.push_str(line);
        }
        result.push_str("\r\n");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invite::{AttendeeInput, LocalStamp};
    use chrono::{NaiveDate, TimeZone};

    fn stamp(date: (i32, u32, u32), hour: u32, minute: u32) -> LocalStamp {
        LocalStamp {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            hour,
            minute,
        }
    }

    fn make_request() -> InviteRequest {
        InviteRequest {
            poll_id: "p-4fd2c8e91a".to_string(),
            option_id: "opt-77b1".to_string(),
            creator_name: "Jane".to_string(),
            creator_email: "jane@x.com".to_string(),
            title: "Sync".to_string(),
            description: None,
            location: None,
            url: "https://convoke.example/p/4fd2c8e91a".to_string(),
            start: stamp((2025, 11, 15), 13, 0),
            end: stamp((2025, 11, 15), 17, 0),
            timezone: "America/Los_Angeles".to_string(),
            attendees: vec![AttendeeInput {
                name: Some("Bob".to_string()),
                email: "bob@x.com".to_string(),
            }],
            created: Some(chrono::Utc.with_ymd_and_hms(2025, 11, 1, 9, 30, 0).unwrap()),
        }
    }

    #[test]
    fn test_end_must_be_after_start() {
        let mut request = make_request();
        request.end = request.start;
        let err = generate_raw_ics(&request).unwrap_err();
        assert!(
            matches!(err, InviteError::InvalidInput { field: "end", .. }),
            "{err}"
        );
    }

    #[test]
    fn test_empty_attendees_rejected() {
        let mut request = make_request();
        request.attendees.clear();
        let err = generate_raw_ics(&request).unwrap_err();
        assert!(matches!(
            err,
            InviteError::InvalidInput {
                field: "attendees",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_organizer_email_rejected() {
        let mut request = make_request();
        request.creator_email = "not-an-email".to_string();
        let err = generate_raw_ics(&request).unwrap_err();
        assert!(matches!(
            err,
            InviteError::InvalidInput {
                field: "creator_email",
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_timezone_propagates() {
        let mut request = make_request();
        request.timezone = "Europe/Berlin".to_string();
        let err = generate_raw_ics(&request).unwrap_err();
        assert!(matches!(err, InviteError::UnsupportedTimezone(_)));
    }

    #[test]
    fn test_uid_is_stable_and_bounded() {
        let request = make_request();
        let a = generate_raw_ics(&request).unwrap();
        let b = generate_raw_ics(&request).unwrap();
        assert_eq!(a.uid, b.uid, "same created instant must reuse the UID");
        assert_eq!(a.uid, "p4fd2c8e-opt77b1-1761989400@convoke");
        assert!("UID:".len() + a.uid.len() <= 60, "UID line must never fold");
    }

    #[test]
    fn test_raw_output_carries_generator_hints_but_no_vtimezone() {
        let raw = generate_raw_ics(&make_request()).unwrap();
        assert!(raw.ics.contains("METHOD:REQUEST"));
        assert!(raw.ics.contains("X-WR-CALNAME:Sync"));
        assert!(raw.ics.contains("PRODID:-//Convoke//Convoke Invites//EN"));
        assert!(!raw.ics.contains("BEGIN:VTIMEZONE"));
    }

    #[test]
    fn test_generated_invite_matches_reference_shape() {
        let invite = generate_invite(&make_request()).unwrap();
        let ics = &invite.ics;

        assert!(ics.contains("METHOD:REQUEST"));
        assert_eq!(ics.matches("BEGIN:VTIMEZONE").count(), 1);
        assert!(ics.contains("TZID:America/Los_Angeles"));
        assert!(ics.contains("DTSTART;TZID=America/Los_Angeles:20251115T130000"));
        assert!(ics.contains("DTEND;TZID=America/Los_Angeles:20251115T170000"));
        assert!(ics.contains("ORGANIZER;CN=Jane:mailto:jane@x.com"));
        assert!(ics.contains("STATUS:CONFIRMED"));
        assert!(ics.contains("TRANSP:OPAQUE"));
        assert!(ics.contains("SEQUENCE:0"));

        // Attendee lines are folded; assert on the logical line.
        let logical = crate::ics::fold::unfold(ics);
        let attendee_line = logical
            .iter()
            .find(|l| l.starts_with("ATTENDEE"))
            .expect("attendee line");
        // Parameter order is the generator's; assert each one.
        for fragment in [
            "CUTYPE=INDIVIDUAL",
            "ROLE=REQ-PARTICIPANT",
            "PARTSTAT=NEEDS-ACTION",
            "RSVP=TRUE",
            "CN=Bob",
        ] {
            assert!(
                attendee_line.contains(fragment),
                "missing {fragment} in: {attendee_line}"
            );
        }
        assert!(attendee_line.contains("mailto:bob@x.com"));

        // Calendar-name hints must not survive normalization.
        assert!(!ics.contains("X-WR-"));
        for line in ics.lines() {
            assert!(line.len() <= 75, "overlong line: {line}");
        }
    }

    #[test]
    fn test_duplicate_attendees_produce_one_line() {
        let mut request = make_request();
        request.attendees = vec![
            AttendeeInput {
                name: Some("Bob One".to_string()),
                email: "BOB@x.com".to_string(),
            },
            AttendeeInput {
                name: Some("Bob Two".to_string()),
                email: "bob@x.com".to_string(),
            },
        ];
        let invite = generate_invite(&request).unwrap();
        let logical = crate::ics::fold::unfold(&invite.ics);
        let attendee_lines: Vec<&String> = logical
            .iter()
            .filter(|l| l.starts_with("ATTENDEE"))
            .collect();
        assert_eq!(attendee_lines.len(), 1, "ICS:\n{}", invite.ics);
        assert!(attendee_lines[0].contains("CN=Bob Two"));
    }
}
