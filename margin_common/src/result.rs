//! Result type alias shared across the workspace.
//!
//! This module defines a convenient alias that defaults the error type to the
//! common `MarginError`, so functions can simply return `Result<T>`.
use crate::error::MarginError;

/// Workspace-wide `Result` alias with `MarginError` as the default error.
pub type Result<T, E = MarginError> = std::result::Result<T, E>;
