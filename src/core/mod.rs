//! core
//!
//! Core domain types, storage and configuration for lgit.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, BranchName, Reference, Commit
//! - [`paths`] - Where lgit keeps its files inside a repository
//! - [`config`] - Configuration schema and loading
//! - [`ops`] - Replay session store and the repository lock
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Stored formats are strict and versioned

pub mod config;
pub mod ops;
pub mod paths;
pub mod types;
