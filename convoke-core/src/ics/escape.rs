//! Escaping for iCalendar TEXT values and parameter values.

/// Escape a string for use as an iCalendar TEXT value (RFC 5545 §3.3.11).
///
/// Escapes backslash, comma, and semicolon; newlines become literal `\n`.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Sanitize a display name for use as an unquoted CN parameter value.
///
/// Quoting CN is rejected or mis-displayed by at least one major client, so
/// instead of quoting we replace the characters that would terminate the
/// parameter. Runs of replaced characters collapse to a single space.
pub fn sanitize_cn(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for c in name.chars() {
        match c {
            '"' | ';' | ':' | ',' | '\n' | '\r' => {
                if !out.is_empty() {
                    pending_space = true;
                }
            }
            _ => {
                if pending_space {
                    out.push(' ');
                    pending_space = false;
                }
                out.push(c);
            }
        }
    }
    out.trim().to_string()
}
