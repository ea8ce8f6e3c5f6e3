//! Shared types and models for the Reception and Release Management service
//!
//! This crate contains the record types, the R&R form transition table and the
//! field clearing rules shared between the backend and the web client (via WASM).

#[macro_use]
pub mod types;
pub mod lifecycle;
pub mod models;
pub mod onchange;
pub mod validation;

pub use lifecycle::*;
pub use models::*;
pub use onchange::*;
pub use types::*;
pub use validation::*;
