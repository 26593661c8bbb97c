//! Shoebox Core - Shared record types.
//!
//! This crate provides the record shapes used across all Shoebox components:
//! - `admin` - Data layer (remote store adapter, local fallback store, services)
//! - `cli` - Command-line front end for the admin operations
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, users, products, per-size stock and validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
