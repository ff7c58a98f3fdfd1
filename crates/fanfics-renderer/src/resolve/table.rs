use super::{Resolution, Ticket};
use crate::bsky::PostRecord;
use crate::error::ResolveError;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::sync::Arc;

/// Something a view needs from a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKey {
    /// Displayable URL for a blob in `owner`'s repository
    Blob { owner: SmolStr, cid: SmolStr },
    /// An `app.bsky.feed.post` record
    Post { repo: SmolStr, rkey: SmolStr },
    /// Current handle for a DID
    Handle { did: SmolStr },
}

/// A settled lookup value.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Url(String),
    Post(Arc<PostRecord>),
    Handle(SmolStr),
}

/// Resolution state for every reference seen in the current generation.
#[derive(Debug, Default)]
pub struct ResourceTable {
    generation: u64,
    entries: HashMap<ResourceKey, Resolution<Resource>>,
}

impl ResourceTable {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drop all state and invalidate outstanding tickets.
    pub fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.entries.clear();
    }

    pub fn get(&self, key: &ResourceKey) -> Option<&Resolution<Resource>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mark unseen keys `Pending` and hand out tickets for them. Keys that
    /// already have state get no ticket, so nothing is fetched twice.
    pub fn request(&mut self, keys: impl IntoIterator<Item = ResourceKey>) -> Vec<Ticket<ResourceKey>> {
        let mut tickets = Vec::new();
        for key in keys {
            if self.entries.contains_key(&key) {
                continue;
            }
            self.entries.insert(key.clone(), Resolution::Pending);
            tickets.push(Ticket {
                generation: self.generation,
                key,
            });
        }
        tickets
    }

    pub fn settle(
        &mut self,
        ticket: &Ticket<ResourceKey>,
        result: Result<Resource, ResolveError>,
    ) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                key = ?ticket.key,
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale settlement"
            );
            return false;
        }
        let Some(state) = self.entries.get_mut(&ticket.key) else {
            return false;
        };
        if !state.is_pending() {
            return false;
        }
        if let Err(err) = &result {
            tracing::warn!(key = ?ticket.key, error = %err, "resource lookup failed");
        }
        *state = result.into();
        true
    }

    /// Insert a known value directly, bypassing the ticket flow.
    pub fn insert(&mut self, key: ResourceKey, state: Resolution<Resource>) {
        self.entries.insert(key, state);
    }
}
