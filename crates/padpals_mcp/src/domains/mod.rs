//! View-model conversions from client domain types into tool results.
//!
//! - [`tracker`]: cycle entries, statistics and the month calendar grid
//! - [`shop`]: catalogue and cart summaries

pub mod shop;
pub mod tracker;
