//! Core types and utilities for the handheld boot-code interpreter.

pub mod config;
pub mod error;

pub use error::{Error, MalformedReason, Result};
pub use config::*;
