//! Core domain + application logic for the group link-moderation bot.
//!
//! This crate is intentionally framework-agnostic. The chat platform lives
//! behind a port (trait) implemented in the adapter crate; the rule
//! evaluator, ban store, presence tracker, and command parsing all run
//! against plain data and can be tested without a network.

pub mod command;
pub mod config;
pub mod domain;
pub mod effects;
pub mod engine;
pub mod errors;
pub mod extractor;
pub mod logging;
pub mod moderation;
pub mod port;
pub mod presence;
pub mod store;

pub use errors::{Error, Result};
