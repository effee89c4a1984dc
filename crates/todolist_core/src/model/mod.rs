//! Domain model for to-do items and their categories.
//!
//! # Responsibility
//! - Define the records owned by the record store.
//! - Own name validation shared by insert and update paths.
//!
//! # Invariants
//! - Every record is identified by a stable UUID assigned at creation.
//! - An item references at most one category; the category side is derived.

pub mod category;
pub mod item;
pub mod validation;
