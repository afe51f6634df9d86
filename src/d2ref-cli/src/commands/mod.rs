//! Command handlers for d2ref CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod configure;
pub mod ingest;
pub mod patches;
pub mod special_value;
