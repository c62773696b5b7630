//! Persistence layer.
//!
//! # Responsibility
//! - Define the user data access contract.
//! - Isolate SQLite queries and transaction handling from the service layer.
//!
//! # Invariants
//! - Every repository call is its own transaction.
//! - Store failures surface after rollback; nothing is retried.

pub mod user_repo;
