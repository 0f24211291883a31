//! Conformance repairs for generated calendar documents.
//!
//! The generator library's output has known gaps against what calendar
//! clients (Gmail in particular) accept: calendar-name hints that strict
//! parsers reject, no VTIMEZONE support, delimiter-blind line folding,
//! quoted CN values. Each repair here is an independent, idempotent pass
//! over the unfolded logical lines; the passes run in a fixed order and
//! the result is refolded with the delimiter-aware fold.
//!
//! Ordering constraints: the deleting passes run before the blank-line
//! collapse, and VTIMEZONE injection runs after non-standard-property
//! stripping so the injected block is never itself stripped.

use crate::error::InviteResult;
use crate::ics::fold::{fold, unfold};
use crate::ics::vtimezone;
use tracing::debug;

/// Repair a serialized calendar document into its client-safe form.
///
/// Safe to re-run: `normalize(normalize(x)) == normalize(x)`. Fails only
/// when a TZID-qualified time references a timezone with no known
/// transition rules; a dangling TZID would silently corrupt displayed
/// times, so the send must not proceed.
pub fn normalize(raw: &str) -> InviteResult<String> {
    let lines = unfold(raw);
    let lines = strip_nonstandard_properties(lines);
    let lines = strip_empty_values(lines);
    let lines = unquote_cn_parameters(lines);
    let lines = ensure_calscale(lines);
    let lines = inject_vtimezone(lines)?;
    let lines = ensure_transparency(lines);
    let lines = collapse_blank_runs(lines);
    debug!(lines = lines.len(), "normalized calendar document");
    Ok(fold(&lines))
}

/// Drop properties outside the iCalendar grammar: bare NAME lines and the
/// X-WR-* calendar hints some generators emit.
fn strip_nonstandard_properties(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .filter(|line| {
            !(line.starts_with("NAME:")
                || line.starts_with("NAME;")
                || line.starts_with("X-WR-")
                || line.starts_with("TIMEZONE-ID:"))
        })
        .collect()
}

/// Drop property lines with nothing after the value colon.
fn strip_empty_values(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .filter(|line| match line.split_once(':') {
            Some((_, value)) => !value.trim().is_empty(),
            None => true,
        })
        .collect()
}

/// Remove quoting around CN parameter values on ORGANIZER/ATTENDEE lines.
///
/// Quoted CN is technically legal but rejected or mis-displayed by at
/// least one major client; the reference output is unquoted.
fn unquote_cn_parameters(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| {
            if line.starts_with("ORGANIZER") || line.starts_with("ATTENDEE") {
                unquote_cn(line)
            } else {
                line
            }
        })
        .collect()
}

fn unquote_cn(mut line: String) -> String {
    while let Some(start) = line.find("CN=\"") {
        let value_start = start + 4;
        match line[value_start..].find('"') {
            Some(rel_end) => {
                let end = value_start + rel_end;
                line.remove(end);
                line.remove(start + 3);
            }
            None => break,
        }
    }
    line
}

/// Insert `CALSCALE:GREGORIAN` right after `VERSION:2.0` when absent.
fn ensure_calscale(mut lines: Vec<String>) -> Vec<String> {
    if lines.iter().any(|l| l.starts_with("CALSCALE")) {
        return lines;
    }
    if let Some(pos) = lines.iter().position(|l| l.starts_with("VERSION:")) {
        lines.insert(pos + 1, "CALSCALE:GREGORIAN".to_string());
    }
    lines
}

/// Inject a VTIMEZONE block after the METHOD line whenever a DTSTART/DTEND
/// is TZID-qualified and no block is present.
fn inject_vtimezone(mut lines: Vec<String>) -> InviteResult<Vec<String>> {
    if lines.iter().any(|l| l == "BEGIN:VTIMEZONE") {
        return Ok(lines);
    }
    let Some(tzid) = lines.iter().find_map(|l| tzid_parameter(l)) else {
        return Ok(lines);
    };

    let rules = vtimezone::lookup(&tzid)?;
    let block = vtimezone::vtimezone_lines(rules);

    let at = lines
        .iter()
        .position(|l| l.starts_with("METHOD:"))
        .map(|i| i + 1)
        .or_else(|| {
            lines
                .iter()
                .position(|l| l == "BEGIN:VCALENDAR")
                .map(|i| i + 1)
        })
        .unwrap_or(0);
    lines.splice(at..at, block);
    Ok(lines)
}

/// Extract the TZID parameter value from a DTSTART/DTEND line.
fn tzid_parameter(line: &str) -> Option<String> {
    let rest = line
        .strip_prefix("DTSTART;")
        .or_else(|| line.strip_prefix("DTEND;"))?;
    let value = rest.split_once("TZID=")?.1;
    let end = value.find(|c| c == ';' || c == ':')?;
    Some(value[..end].to_string())
}

/// Insert `TRANSP:OPAQUE` after `STATUS:CONFIRMED` when transparency was
/// not emitted, so the event blocks time on the recipient's calendar.
fn ensure_transparency(mut lines: Vec<String>) -> Vec<String> {
    if lines.iter().any(|l| l.starts_with("TRANSP")) {
        return lines;
    }
    if let Some(pos) = lines.iter().position(|l| l == "STATUS:CONFIRMED") {
        lines.insert(pos + 1, "TRANSP:OPAQUE".to_string());
    }
    lines
}

/// Collapse runs of consecutive blank lines (left behind by the deleting
/// passes) down to a single blank line.
fn collapse_blank_runs(lines: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(lines.len());
    let mut blanks = 0usize;
    for line in lines {
        if line.is_empty() {
            blanks += 1;
            if blanks > 1 {
                continue;
            }
        } else {
            blanks = 0;
        }
        out.push(line);
    }
    out
}
