use super::{Resolution, Ticket};
use crate::error::ResolveError;

/// Resolution state for a single changing reference.
///
/// Watching a different key starts a new generation and resets the state to
/// `Pending`; a ticket from an earlier generation can no longer settle it.
#[derive(Debug, Clone)]
pub struct ResolutionSlot<K, T> {
    key: Option<K>,
    generation: u64,
    state: Resolution<T>,
}

impl<K, T> Default for ResolutionSlot<K, T> {
    fn default() -> Self {
        Self {
            key: None,
            generation: 0,
            state: Resolution::Pending,
        }
    }
}

impl<K: Clone + PartialEq, T> ResolutionSlot<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &Resolution<T> {
        &self.state
    }

    /// Point the slot at `key`. Returns a ticket when a lookup should start,
    /// `None` when the key is unchanged.
    pub fn watch(&mut self, key: K) -> Option<Ticket<K>> {
        if self.key.as_ref() == Some(&key) {
            return None;
        }
        self.generation += 1;
        self.key = Some(key.clone());
        self.state = Resolution::Pending;
        Some(Ticket {
            generation: self.generation,
            key,
        })
    }

    /// Ticket for the current key while it is still pending.
    pub fn pending_ticket(&self) -> Option<Ticket<K>> {
        match (&self.key, &self.state) {
            (Some(key), Resolution::Pending) => Some(Ticket {
                generation: self.generation,
                key: key.clone(),
            }),
            _ => None,
        }
    }

    /// Store a lookup result. Stale tickets and already settled state are
    /// left untouched and `false` is returned.
    pub fn settle(&mut self, ticket: &Ticket<K>, result: Result<T, ResolveError>) -> bool {
        if ticket.generation != self.generation || self.key.as_ref() != Some(&ticket.key) {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale settlement"
            );
            return false;
        }
        if !self.state.is_pending() {
            return false;
        }
        if let Err(err) = &result {
            tracing::warn!(error = %err, "lookup failed");
        }
        self.state = result.into();
        true
    }

    /// Settle immediately with a value the caller already has.
    pub fn show(&mut self, key: K, value: T) {
        self.generation += 1;
        self.key = Some(key);
        self.state = Resolution::Resolved(value);
    }
}
