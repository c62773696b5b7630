//! Use-case services.
//!
//! # Responsibility
//! - Apply business rules above raw persistence.
//! - Keep the console layer decoupled from storage details.

pub mod user_service;
