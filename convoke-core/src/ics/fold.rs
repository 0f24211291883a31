//! Content-line folding and unfolding (RFC 5545 §3.1).
//!
//! Folding is octet-based: a physical line may carry at most 75 octets
//! before its CRLF. Instead of cutting blindly at the limit, the fold scans
//! backward for a property delimiter so a `NAME=VALUE` parameter token is
//! never split right after its `=`, since some clients fail to reparse a
//! value folded that way (`RSVP=TR` / ` UE`).

/// Maximum octets per physical line, excluding the CRLF terminator.
const MAX_OCTETS: usize = 75;

/// Lower bound of the backward scan window when looking for a safe break.
const SCAN_FLOOR: usize = 55;

/// Fold logical lines into CRLF-terminated physical lines.
///
/// Continuation segments are prefixed with exactly one space, which counts
/// toward the 75-octet limit.
pub fn fold(logical_lines: &[String]) -> String {
    let mut out = String::new();

    for line in logical_lines {
        let mut rest = line.as_str();
        let mut continuation = false;

        loop {
            let limit = if continuation {
                MAX_OCTETS - 1
            } else {
                MAX_OCTETS
            };

            if continuation {
                out.push(' ');
            }

            if rest.len() <= limit {
                out.push_str(rest);
                out.push_str("\r\n");
                break;
            }

            let cut = break_point(rest, limit);
            out.push_str(&rest[..cut]);
            out.push_str("\r\n");
            rest = &rest[cut..];
            continuation = true;
        }
    }

    out
}

/// Reassemble logical lines from folded text.
///
/// Any line beginning with a single space or tab is appended to the
/// previous logical line with exactly that one character stripped. Line
/// endings may be CRLF or bare LF; a trailing terminator does not produce
/// an empty final line.
pub fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let normalized = text.replace("\r\n", "\n");
    let mut parts: Vec<&str> = normalized.split('\n').collect();
    if parts.last() == Some(&"") {
        parts.pop();
    }

    for part in parts {
        if (part.starts_with(' ') || part.starts_with('\t')) && !lines.is_empty() {
            // unwrap safe: the guard above ensures a previous line exists
            lines.last_mut().unwrap().push_str(&part[1..]);
        } else {
            lines.push(part.to_string());
        }
    }

    lines
}

/// Pick how many octets of `rest` go into the current segment.
///
/// Prefers cutting just after a `;`, `:` or `,` found scanning backward
/// from `limit` to the scan floor, skipping delimiters immediately preceded
/// by `=`. Falls back to a hard cut at `limit` (backed off to a UTF-8
/// boundary), accepting that the fallback may split a token.
fn break_point(rest: &str, limit: usize) -> usize {
    let bytes = rest.as_bytes();
    let floor = SCAN_FLOOR.min(limit);

    let mut i = limit;
    while i >= floor && i >= 1 {
        let b = bytes[i - 1];
        if matches!(b, b';' | b':' | b',') && (i < 2 || bytes[i - 2] != b'=') {
            return i;
        }
        i -= 1;
    }

    let mut cut = limit;
    while cut > 0 && !rest.is_char_boundary(cut) {
        cut -= 1;
    }
    cut
}
