//! Command-line operations for holders and issuers.
pub mod api;
