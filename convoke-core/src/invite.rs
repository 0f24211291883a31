//! Poll-neutral invite input types.
//!
//! These types represent a single invite-send request in a storage-agnostic
//! way. The web application converts its poll/vote rows into these types,
//! and the pipeline (builder, normalizer, envelope, fan-out) works
//! exclusively with them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything needed to generate and send one meeting invite.
///
/// All fields arrive pre-validated at the HTTP layer except the structural
/// checks the builder re-asserts (start < end, non-empty attendees, email
/// shape, resolvable timezone).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteRequest {
    /// Identifier of the poll this invite was scheduled from
    pub poll_id: String,
    /// Identifier of the winning time option
    pub option_id: String,
    /// Organizer display name
    pub creator_name: String,
    /// Organizer email address
    pub creator_email: String,
    /// Meeting title (SUMMARY)
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    /// Link back to the poll page
    pub url: String,
    /// Wall-clock start in the poll's timezone
    pub start: LocalStamp,
    /// Wall-clock end in the poll's timezone
    pub end: LocalStamp,
    /// IANA timezone identifier (e.g. "America/Los_Angeles")
    pub timezone: String,
    pub attendees: Vec<AttendeeInput>,
    /// Creation instant for DTSTAMP and the UID suffix.
    /// Defaults to the current time; retried sends should pass the original
    /// instant so the regenerated document keeps the same UID.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// A wall-clock instant without timezone or seconds, as stored per poll option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalStamp {
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
}

impl LocalStamp {
    /// Combine into a NaiveDateTime. None if hour/minute are out of range.
    pub fn to_naive(self) -> Option<NaiveDateTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).map(|t| self.date.and_time(t))
    }
}

/// An attendee as supplied by the vote rows (one row per response, so the
/// same person can appear more than once).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendeeInput {
    /// Display name; falls back to the email local-part if absent
    pub name: Option<String>,
    pub email: String,
}

/// A deduplicated attendee, ready for document construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
}

/// Deduplicate attendees by lower-cased email.
///
/// A person must receive exactly one invite line even if they produced
/// multiple response rows. The first occurrence keeps its position; the
/// last-supplied spelling of name and email wins, matching the "most
/// recent vote wins" semantics upstream.
pub fn dedup_attendees(inputs: &[AttendeeInput]) -> Vec<Attendee> {
    let mut seen: Vec<(String, Attendee)> = Vec::with_capacity(inputs.len());

    for input in inputs {
        let key = input.email.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        let attendee = Attendee {
            name: display_name(input),
            email: input.email.trim().to_string(),
        };
        match seen.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = attendee,
            None => seen.push((key, attendee)),
        }
    }

    seen.into_iter().map(|(_, a)| a).collect()
}

/// Resolve an attendee's display name, falling back to the email local-part.
fn display_name(input: &AttendeeInput) -> String {
    match input.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => input
            .email
            .trim()
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}
