//! Error types shared by every layer of the crate.

use std::{fmt, io};
use thiserror::Error;

use crate::wm::SurfaceId;

#[derive(Error, Debug)]
pub enum Error {
    /// A caller broke a documented precondition (colour query before the
    /// registry exists, malformed geometry, destroying the root, ...).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Failed to allocate a {rows}x{cols} surface at ({row}, {col}): {reason}")]
    Allocation {
        row: u16,
        col: u16,
        rows: u16,
        cols: u16,
        reason: &'static str,
    },

    #[error("Unknown surface: {0}")]
    UnknownSurface(SurfaceId),

    #[error("Session is not open")]
    NotOpen,

    #[error("Session has been closed")]
    Closed,

    #[error("Terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),

    /// A `Display` impl passed to `print` reported an error
    #[error("Formatting failed")]
    Format(#[from] fmt::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        Error::InvariantViolation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
