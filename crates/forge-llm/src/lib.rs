//! # forge-llm
//!
//! Streaming client for the Gemini `streamGenerateContent` API (API-key
//! authentication over SSE).
//!
//! The [`GeminiClient`] turns a request into a stream of text fragments;
//! [`collect_text`] consumes that stream into the full response body.
//! [`sse`] handles line buffering and `data:` extraction, [`types`] holds
//! the wire structs, and [`GeminiError`] is the error taxonomy surfaced to
//! callers.

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod sse;
pub mod types;

pub use client::{FragmentStream, GeminiClient, GenerateRequest, collect_text};
pub use error::GeminiError;
