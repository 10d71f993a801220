//! Error taxonomy for the graph core.
//!
//! Only four conditions exist, and only one of them is fatal:
//!
//! - [`GraphError::StoreUnavailable`]: the backing snapshot could not be
//!   loaded (or failed integrity validation). Fatal at construction, never
//!   retried internally.
//! - [`GraphError::NotFound`]: an id lookup missed, or no path exists.
//!   Always a normal negative result, never a panic.
//! - [`GraphError::EmptyCollection`]: sampling from a label with no nodes.
//! - [`GraphError::InvalidArgument`]: malformed request input. Note that an
//!   unresolvable movie id supplied as a *filter* is not an error; filters
//!   are permissive and simply match nothing.

use thiserror::Error;

use crate::model::Label;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("backing store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },

    #[error("no {label} nodes to sample from")]
    EmptyCollection { label: Label },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl GraphError {
    pub fn store_unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True for the non-fatal "id does not exist" classification.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
