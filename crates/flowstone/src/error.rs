//! Build-time failures.
//!
//! All of these indicate a malformed model description and are raised
//! before the simulation ever runs. The one non-fatal condition — a
//! dangling fall-through edge at `build()` — is logged as a warning
//! instead, because transactions walking off the graph end quietly at
//! runtime.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("empty string is not a valid label")]
    EmptyLabel,

    #[error(
        "label \"{name}\" must follow a block; terminate and immediate transfers cannot be labelled"
    )]
    LabelWithoutBlock { name: String },

    #[error("redeclaration of label \"{name}\"")]
    LabelRedeclaration { name: String },

    #[error("redeclaration of storage \"{name}\"")]
    StorageRedeclaration { name: String },

    #[error("reference to undeclared queue \"{name}\"")]
    UnknownQueue { name: String },

    #[error("reference to undeclared storage \"{name}\"")]
    UnknownStorage { name: String },

    #[error("label \"{name}\" is never bound to a block")]
    UnresolvedLabel { name: String },
}
