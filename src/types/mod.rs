//! Shared types.

pub mod error;

pub use error::{DatabaseError, Result, ERR_NOT_FOUND};
