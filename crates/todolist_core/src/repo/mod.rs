//! Persistence layer for to-do records.
//!
//! # Responsibility
//! - Define the record store contract used by services.
//! - Keep SQL and transaction handling behind that contract.
//!
//! # Invariants
//! - Store APIs return semantic errors (`ItemNotFound`, `Validation`) in
//!   addition to storage failures.

pub mod record_store;
