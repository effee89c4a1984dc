//! Use-case services over the record store.
//!
//! # Responsibility
//! - Keep presentation callers decoupled from storage details.

pub mod list_service;
