//! Capability handlers.
//!
//! Thin consumers of the core: each composes the session manager, navigator
//! and extractor for one capability and maps the outcome into an envelope.
//! All session access goes through the scoped acquisition helper.

pub mod read_replies;
pub mod read_tweet;
pub mod search;
pub mod trending;
pub mod user_posts;
