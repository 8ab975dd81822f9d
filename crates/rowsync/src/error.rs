//! Error types for rowsync.

use crate::model::Address;

/// Result type alias for rowsync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while registering renderers, addressing rows or
/// applying edit scripts.
///
/// Errors are `Clone` so they can be published through a [`Signal`].
///
/// [`Signal`]: rowsync_core::Signal
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A renderer is already registered for this item type.
    #[error("a renderer is already registered for item type '{type_name}'")]
    DuplicateRendererKey { type_name: &'static str },

    /// No renderer is registered for this item type.
    #[error("no renderer registered for item type '{type_name}'")]
    RendererNotFound { type_name: &'static str },

    /// The address does not name an existing section/row.
    #[error("invalid address: {address}")]
    InvalidAddress { address: Address },

    /// A row index is outside a section's current bounds.
    #[error("row {index} out of range for section of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    /// An edit script cannot be applied to the host's current rows.
    #[error("inconsistent edit script for section {section}: {reason}")]
    InconsistentEditScript { section: usize, reason: String },

    /// The host handed a cell of a different type than the renderer builds.
    #[error("cell for reuse id '{reuse_id}' is not a '{expected}'")]
    CellTypeMismatch {
        reuse_id: String,
        expected: &'static str,
    },

    /// Configuration could not be read or parsed.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a duplicate-key error.
    pub fn duplicate_renderer(type_name: &'static str) -> Self {
        Self::DuplicateRendererKey { type_name }
    }

    /// Create a missing-renderer error.
    pub fn renderer_not_found(type_name: &'static str) -> Self {
        Self::RendererNotFound { type_name }
    }

    /// Create an invalid-address error.
    pub fn invalid_address(address: Address) -> Self {
        Self::InvalidAddress { address }
    }

    /// Create an out-of-range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create an inconsistent edit script error.
    pub fn inconsistent(section: usize, reason: impl Into<String>) -> Self {
        Self::InconsistentEditScript {
            section,
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
