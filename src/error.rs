//! Error types for engine construction and binding.
//!
//! Two concerns, two enums:
//! - [`ConfigError`] - the engine options cannot be used as given
//! - [`BindingError`] - a directive or a store access names something that does not exist
//!
//! Both surface synchronously. Construction either wires every directive or
//! fails with the first error.

use thiserror::Error;

/// Problems with the engine options themselves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The mount selector matched no node in the document.
    #[error("mount selector `{selector}` matched no node")]
    MountNotFound { selector: String },

    /// A data property name is empty or contains a path separator.
    #[error("invalid property name `{name}`: names must be non-empty and contain neither `.` nor `&`")]
    InvalidPropertyName { name: String },

    /// The data given to the engine is not an object.
    #[error("engine data must be an object")]
    DataNotObject,
}

/// Problems resolving a directive or a data path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The path does not resolve to a property in the store.
    #[error("unknown property path `{path}`")]
    UnknownPath { path: String },

    /// A click directive names a method missing from the method table.
    #[error("unknown method `{name}`")]
    UnknownMethod { name: String },

    /// A model directive sits on a node that has no editable value.
    #[error("model binding `{path}` requires an input or textarea, found `{tag}`")]
    NotInputCapable { path: String, tag: String },

    /// The path is empty or has an empty segment (`a..b`).
    #[error("invalid property path `{path}`")]
    InvalidPath { path: String },
}

/// Any error the engine can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

impl BindingError {
    pub(crate) fn unknown_path(path: impl std::fmt::Display) -> Self {
        Self::UnknownPath { path: path.to_string() }
    }
}
