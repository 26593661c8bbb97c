//! Shoebox Admin data layer.
//!
//! Every dashboard operation goes through [`DataLayer`]: it tries the hosted
//! remote store first and serves the request from the local fallback store
//! when the remote store is unconfigured or does not answer.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`schema`] - Mapping between record fields and remote columns
//! - [`remote`] - Remote store adapter
//! - [`fallback`] - Local fallback store
//! - [`services`] - Caller-facing operations
//! - [`images`] - Product image upload
//! - [`dashboard`], [`listing`] - Overview counts, search and pagination
//! - [`auth`] - Dashboard passcode gate

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fallback;
pub mod images;
pub mod listing;
pub mod remote;
pub mod schema;
pub mod services;

pub use config::{ConfigError, RemoteConfig, ShoeboxConfig};
pub use error::DataError;
pub use services::{DataLayer, ProductService, UserService};
