//! Per-reference resolution state.
//!
//! Every async lookup a view depends on (blob URL, embedded post, handle) is
//! tracked as a [`Resolution`]. Views read a snapshot of this state and never
//! wait; lookups run between renders and settle through generation-tagged
//! [`Ticket`]s so results for a reference that is no longer displayed are
//! discarded.

mod context;
mod session;
mod slot;
mod table;

#[cfg(test)]
mod tests;

pub use context::RenderContext;
pub use session::{Record, RenderSession, Rendered, SubjectView};
pub use slot::ResolutionSlot;
pub use table::{Resource, ResourceKey, ResourceTable};

use crate::error::ResolveError;

/// Lifecycle of one lookup. `Resolved` and `Failed` are terminal within a
/// generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Pending,
    Resolved(T),
    Failed(String),
}

impl<T> Default for Resolution<T> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T> Resolution<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Pending | Self::Failed(_) => None,
        }
    }

    pub fn as_ref(&self) -> Resolution<&T> {
        match self {
            Self::Pending => Resolution::Pending,
            Self::Resolved(value) => Resolution::Resolved(value),
            Self::Failed(reason) => Resolution::Failed(reason.clone()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Self::Pending => Resolution::Pending,
            Self::Resolved(value) => Resolution::Resolved(f(value)),
            Self::Failed(reason) => Resolution::Failed(reason),
        }
    }
}

impl<T> From<Result<T, ResolveError>> for Resolution<T> {
    fn from(result: Result<T, ResolveError>) -> Self {
        match result {
            Ok(value) => Self::Resolved(value),
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

/// Permission to settle one lookup, valid only for the generation it was
/// issued in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticket<K> {
    pub generation: u64,
    pub key: K,
}
