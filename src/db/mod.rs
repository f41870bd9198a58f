//! User store module.
//!
//! Provides SQLite storage for registered notification recipients.

mod store;

pub use store::*;
