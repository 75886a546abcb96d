//! Policy Compass: security policy ingestion, compliance analysis and
//! remediation ticketing.
//!
//! A PDF goes through three stages, each an independent async call on
//! [`pipeline::PolicyPipeline`]:
//!
//! 1. [`extract`] validates the upload and pulls out page text, metadata and
//!    a preview, streaming per-page progress.
//! 2. [`analysis`] sends the text to an LLM engine and validates the
//!    structured compliance result.
//! 3. [`tickets`] files one issue per remediation item, isolating failures.

pub mod analysis;
pub mod auth;
pub mod cli;
pub mod config;
pub mod extract;
pub mod http_client;
pub mod pipeline;
pub mod render;
pub mod tickets;
pub mod utils;
