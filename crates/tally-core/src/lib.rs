//! # tally-core
//!
//! Core types, directive parsing, and error types for Tally.
//!
//! This crate provides the foundational types shared across all Tally crates:
//! - Entity structs for students, session entries, and generated invoices
//! - Directive parsing (model output → typed function call)
//! - Name resolution outcomes and candidate selection
//! - Statement policy for model-authored SQL
//! - Cross-cutting error types

pub mod directive;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod resolution;

pub use errors::CoreError;
