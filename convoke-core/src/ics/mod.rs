//! ICS document construction and repair.
//!
//! This module produces the single-event meeting request (VCALENDAR with
//! one VTIMEZONE and one VEVENT) according to RFC 5545: escaping and
//! folding primitives, the static timezone table, the document builder,
//! and the conformance normalizer that repairs the generator library's
//! output into the byte shape clients accept.

pub mod escape;
pub mod fold;
mod generate;
mod normalize;
pub mod vtimezone;

pub use generate::{Invite, PRODID, RawInvite, generate_invite, generate_raw_ics};
pub use normalize::normalize;
