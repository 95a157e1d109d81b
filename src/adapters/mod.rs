//! Infrastructure adapters. Implement outbound ports.
//!
//! SQLite and in-memory storage, CSV import, terminal UI. Map errors to DomainError.

pub mod import;
pub mod persistence;
pub mod ui;
