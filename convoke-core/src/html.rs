//! HTML body for the invite email.
//!
//! The calendar attachment is what clients act on; the HTML part is the
//! human-readable fallback. Non-ASCII characters are emitted as numeric
//! entities so the part stays 7-bit-clean alongside the 7bit calendar
//! attachment.

use crate::invite::InviteRequest;

/// Render the invite email body.
pub fn render_invite_html(request: &InviteRequest) -> String {
    let mut body = String::with_capacity(512);
    body.push_str("<div style=\"font-family:Helvetica,Arial,sans-serif;line-height:1.5\">\r\n");
    body.push_str(&format!("<h2>{}</h2>\r\n", escape_html(&request.title)));
    body.push_str(&format!(
        "<p>{} has scheduled this meeting from your poll responses.</p>\r\n",
        escape_html(&request.creator_name)
    ));
    body.push_str(&format!(
        "<p><strong>When:</strong> {}</p>\r\n",
        escape_html(&format_when(request))
    ));
    if let Some(location) = &request.location {
        body.push_str(&format!(
            "<p><strong>Where:</strong> {}</p>\r\n",
            escape_html(location)
        ));
    }
    if let Some(description) = &request.description {
        body.push_str(&format!("<p>{}</p>\r\n", escape_html(description)));
    }
    body.push_str(&format!(
        "<p><a href=\"{}\">View the poll</a></p>\r\n",
        escape_html(&request.url)
    ));
    body.push_str("</div>\r\n");
    body
}

/// Human-readable meeting time, e.g.
/// "Saturday, November 15, 2025, 1:00 PM to 5:00 PM (America/Los_Angeles)".
fn format_when(request: &InviteRequest) -> String {
    let (Some(start), Some(end)) = (request.start.to_naive(), request.end.to_naive()) else {
        return request.timezone.clone();
    };
    if request.start.date == request.end.date {
        format!(
            "{}, {} to {} ({})",
            start.format("%A, %B %-d, %Y"),
            start.format("%-I:%M %p"),
            end.format("%-I:%M %p"),
            request.timezone
        )
    } else {
        format!(
            "{} to {} ({})",
            start.format("%A, %B %-d, %Y %-I:%M %p"),
            end.format("%A, %B %-d, %Y %-I:%M %p"),
            request.timezone
        )
    }
}

/// Escape text for HTML, entity-encoding anything outside printable ASCII.
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c if (c as u32) > 0x7E => {
                out.push_str(&format!("&#{};", c as u32));
            }
            _ => out.push(c),
        }
    }
    out
}
