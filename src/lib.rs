//! Browser-driven Twitter/X data extraction.
//!
//! X exposes no stable public API for trending topics, search, timelines or
//! tweet detail, so this crate drives a real Chromium against a persistent
//! authenticated profile instead. The core is three pieces:
//! - a session manager owning the profile and its lock across concurrent
//!   invocations
//! - a navigator that falls back across candidate URLs when the primary
//!   DOM target is absent
//! - an extractor whose field routines tolerate partial failures without
//!   aborting a listing
//!
//! Capabilities compose those three and speak JSON over stdin/stdout.

pub mod config;
pub mod error;
pub mod extract;
pub mod features;
pub mod harness;
pub mod nav;
pub mod session;

// Re-export main types
pub use config::Config;
pub use error::Error;
pub use harness::Envelope;
pub use nav::{NavigationTarget, Navigator};
pub use session::Session;
