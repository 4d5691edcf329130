//! Session lifecycle for the persistent authenticated profile.
//!
//! Covers lock reconciliation before launch, the browsing context itself,
//! and the auth marker written by the interactive login flow.

pub mod auth;
mod lock;
mod manager;

pub use lock::{LockReconciler, LockState, ProcessProbe, SysinfoProbe};
pub use manager::{with_session, Session};
