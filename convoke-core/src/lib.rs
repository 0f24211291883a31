//! Core pipeline for the convoke scheduling app's calendar invites.
//!
//! This crate turns a validated invite request into delivered meeting
//! invites in four stages:
//! - `ics::generate` builds the raw VCALENDAR/VEVENT document
//! - `ics::normalize` repairs it into the byte shape calendar clients accept
//! - `mime` wraps the result in a transport-ready MIME envelope
//! - `send` fans messages out per attendee through an external mailer
//!
//! The pipeline is pure and synchronous; only the mailer subprocess call
//! suspends. Poll storage, HTTP, and actual delivery live outside this
//! crate.

pub mod error;
pub mod html;
pub mod ics;
pub mod invite;
pub mod mime;
pub mod protocol;
pub mod send;
pub mod transport;

// Re-export the request/attendee types at crate root for convenience
pub use error::{InviteError, InviteResult};
pub use invite::*;
