//! Static timezone transition rules and VTIMEZONE rendering.
//!
//! Clients without a built-in timezone database (and some with one) need a
//! VTIMEZONE block to localize TZID-qualified times. Rules are kept as a
//! small static table of literal property text per zone: the set of zones
//! the scheduling app accepts is small and the exact rule text matters more
//! than generality. An identifier outside the table is a hard error:
//! substituting UTC would silently shift the displayed meeting time.

use crate::error::{InviteError, InviteResult};

/// Transition rules for one IANA timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimezoneRules {
    pub tzid: &'static str,
    pub standard: Observance,
    /// None for zones that do not observe daylight saving.
    pub daylight: Option<Observance>,
}

/// One STANDARD or DAYLIGHT observance, as literal iCalendar property text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observance {
    /// Short name (TZNAME), e.g. "PST"
    pub name: &'static str,
    /// First transition instant in local time, e.g. "19700308T020000"
    pub dtstart: &'static str,
    /// Yearly recurrence, e.g. "FREQ=YEARLY;BYMONTH=3;BYDAY=2SU".
    /// None for fixed-offset zones (single observance, no transitions).
    pub rrule: Option<&'static str>,
    /// UTC offset in effect before the transition, e.g. "-0800"
    pub offset_from: &'static str,
    /// UTC offset in effect after the transition
    pub offset_to: &'static str,
}

/// US/Canada daylight rules since 2007: DST begins the second Sunday of
/// March and ends the first Sunday of November, both at 02:00 local.
const DST_START: &str = "19700308T020000";
const DST_START_RULE: &str = "FREQ=YEARLY;BYMONTH=3;BYDAY=2SU";
const DST_END: &str = "19701101T020000";
const DST_END_RULE: &str = "FREQ=YEARLY;BYMONTH=11;BYDAY=1SU";

const fn dst_zone(
    tzid: &'static str,
    std_name: &'static str,
    dst_name: &'static str,
    std_offset: &'static str,
    dst_offset: &'static str,
) -> TimezoneRules {
    TimezoneRules {
        tzid,
        standard: Observance {
            name: std_name,
            dtstart: DST_END,
            rrule: Some(DST_END_RULE),
            offset_from: dst_offset,
            offset_to: std_offset,
        },
        daylight: Some(Observance {
            name: dst_name,
            dtstart: DST_START,
            rrule: Some(DST_START_RULE),
            offset_from: std_offset,
            offset_to: dst_offset,
        }),
    }
}

const fn fixed_zone(
    tzid: &'static str,
    name: &'static str,
    offset: &'static str,
) -> TimezoneRules {
    TimezoneRules {
        tzid,
        standard: Observance {
            name,
            dtstart: "19700101T000000",
            rrule: None,
            offset_from: offset,
            offset_to: offset,
        },
        daylight: None,
    }
}

/// Zones the scheduling app accepts.
static TIMEZONES: &[TimezoneRules] = &[
    dst_zone("America/Los_Angeles", "PST", "PDT", "-0800", "-0700"),
    dst_zone("America/Vancouver", "PST", "PDT", "-0800", "-0700"),
    dst_zone("America/Denver", "MST", "MDT", "-0700", "-0600"),
    dst_zone("America/Edmonton", "MST", "MDT", "-0700", "-0600"),
    fixed_zone("America/Phoenix", "MST", "-0700"),
    dst_zone("America/Chicago", "CST", "CDT", "-0600", "-0500"),
    dst_zone("America/Winnipeg", "CST", "CDT", "-0600", "-0500"),
    fixed_zone("America/Mexico_City", "CST", "-0600"),
    dst_zone("America/New_York", "EST", "EDT", "-0500", "-0400"),
    dst_zone("America/Toronto", "EST", "EDT", "-0500", "-0400"),
    dst_zone("America/Halifax", "AST", "ADT", "-0400", "-0300"),
    dst_zone("America/Anchorage", "AKST", "AKDT", "-0900", "-0800"),
    fixed_zone("Pacific/Honolulu", "HST", "-1000"),
];

/// Look up the transition rules for an IANA timezone identifier.
///
/// Identifiers that are valid IANA names but outside the supported table
/// get a distinct error from strings that are not timezones at all; both
/// are hard failures, never a fallback zone.
pub fn lookup(tzid: &str) -> InviteResult<&'static TimezoneRules> {
    if let Some(rules) = TIMEZONES.iter().find(|z| z.tzid == tzid) {
        return Ok(rules);
    }
    if tzid.parse::<chrono_tz::Tz>().is_ok() {
        Err(InviteError::UnsupportedTimezone(tzid.to_string()))
    } else {
        Err(InviteError::UnknownTimezone(tzid.to_string()))
    }
}

/// Render the VTIMEZONE block as logical (unfolded) lines.
pub fn vtimezone_lines(rules: &TimezoneRules) -> Vec<String> {
    let mut lines = Vec::with_capacity(18);
    lines.push("BEGIN:VTIMEZONE".to_string());
    lines.push(format!("TZID:{}", rules.tzid));
    push_observance(&mut lines, "STANDARD", &rules.standard);
    if let Some(daylight) = &rules.daylight {
        push_observance(&mut lines, "DAYLIGHT", daylight);
    }
    lines.push("END:VTIMEZONE".to_string());
    lines
}

fn push_observance(lines: &mut Vec<String>, kind: &str, obs: &Observance) {
    lines.push(format!("BEGIN:{}", kind));
    lines.push(format!("DTSTART:{}", obs.dtstart));
    if let Some(rrule) = obs.rrule {
        lines.push(format!("RRULE:{}", rrule));
    }
    lines.push(format!("TZOFFSETFROM:{}", obs.offset_from));
    lines.push(format!("TZOFFSETTO:{}", obs.offset_to));
    lines.push(format!("TZNAME:{}", obs.name));
    lines.push(format!("END:{}", kind));
}
