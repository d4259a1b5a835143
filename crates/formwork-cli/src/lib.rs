//! # formwork-cli: Command-Line Interface
//!
//! ## Subcommands
//!
//! - `check`: decode a JSON/YAML document with a declared form, print the
//!   encoded result, exit non-zero listing every failure otherwise
//! - `forms`: list the forms of a schema document and their fields
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handlers delegate to `formwork-schema`; each keeps a pure function
//!   that the tests exercise without touching the filesystem.

pub mod check;
pub mod forms;
