//! Common utilities for mongoscope
//!
//! This crate provides the error type shared by the database helper and the HTTP gateway.

pub mod error;

pub use error::{MongoscopeError, Result};
