//! Domain model.
//!
//! # Invariants
//! - A `User` carries an id only after the store assigned one.

pub mod user;
