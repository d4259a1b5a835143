//! # formwork-core: Foundational Types for formwork
//!
//! This crate is the leaf of the formwork workspace. It defines the pieces
//! a form schema is assembled from without knowing anything about schemas
//! themselves:
//!
//! - [`error`]: the aggregated validation error surface. Every failure is a
//!   `(field path, reason)` pair and failures are collected, never
//!   short-circuited.
//! - [`types`]: the [`FieldType`] capability consulted by a field
//!   descriptor (coerce, check, encode) and the built-in scalar handlers.
//! - [`object`]: the plain-object binding surface: the [`AttrObject`]
//!   trait and the dynamic [`Object`] used as a fresh binding target.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `formwork-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Raw data is always `serde_json::Value`; there is no private value model.

pub mod error;
pub mod object;
pub mod types;

// Re-export primary types for ergonomic imports.
pub use error::{CoercionError, FieldError, FieldErrors, Reason, ValidationError};
pub use object::{Attr, AttrObject, AttrView, Object};
pub use types::{BoolType, FieldType, FloatType, IntType, StrType};
