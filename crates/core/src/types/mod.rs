//! Core types for Shoebox.
//!
//! This module provides the internal record shapes and the [`Record`] trait
//! that lets storage code treat users and products uniformly.

pub mod id;
pub mod product;
pub mod record;
pub mod role;
pub mod stock;
pub mod user;
pub mod validation;

pub use id::*;
pub use product::{NewProduct, Product, ProductPatch};
pub use record::Record;
pub use role::Role;
pub use stock::{Size, SizeRun, StockPatch};
pub use user::{NewUser, User, UserPatch};
pub use validation::ValidationError;
