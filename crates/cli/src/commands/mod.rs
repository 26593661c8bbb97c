//! Command implementations.

pub mod products;
pub mod session;
pub mod users;
