//! Profit projections for a resale ticket inventory.
//!
//! The [`domain`] module holds the projection engine and everything built on
//! it; [`infra`] talks to the inventory backend; [`util`] carries settings,
//! logging and display formatting.

pub mod domain;
pub mod infra;
pub mod util;
