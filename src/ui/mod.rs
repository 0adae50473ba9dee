//! ui
//!
//! Terminal output.
//!
//! All user-facing text goes through [`output`], so the message contract
//! stays in one place.

pub mod output;
