//! # forge-core
//!
//! Shared vocabulary for the Forge relay:
//! - [`request`] — the two analysis request kinds, their event names,
//!   prompt templates, and the typed inbound payload
//! - [`text`] — output sanitization (code-fence trimming) and UTF-8-safe
//!   truncation for log previews
//! - [`logging`] — `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod logging;
pub mod request;
pub mod text;
