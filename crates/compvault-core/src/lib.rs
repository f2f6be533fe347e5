//! Core abstractions for compvault: the component model, revision-token
//! state, the error taxonomy and the contents-provider contract.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod component;
pub mod contents;
pub mod error;
pub mod revision;

pub use error::{Result, VaultError};
