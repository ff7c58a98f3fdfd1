use super::{Resolution, Resource, ResourceKey, ResourceTable};
use crate::bsky::PostRecord;
use crate::config::RenderConfig;
use crate::types::BlobRef;
use smol_str::SmolStr;
use std::cell::RefCell;
use std::sync::Arc;

/// Read-only view of the resolution table for one render pass.
///
/// Lookups that have no state yet render as `Pending` and are recorded so the
/// caller can request them before the next pass.
#[derive(Debug)]
pub struct RenderContext<'s> {
    config: &'s RenderConfig,
    table: &'s ResourceTable,
    demand: RefCell<Vec<ResourceKey>>,
}

impl<'s> RenderContext<'s> {
    pub fn new(config: &'s RenderConfig, table: &'s ResourceTable) -> Self {
        Self {
            config,
            table,
            demand: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &'s RenderConfig {
        self.config
    }

    /// References seen during this pass that have no state, in first-seen
    /// order without duplicates.
    pub fn into_demand(self) -> Vec<ResourceKey> {
        self.demand.into_inner()
    }

    fn lookup(&self, key: ResourceKey) -> Resolution<&'s Resource> {
        match self.table.get(&key) {
            Some(state) => state.as_ref(),
            None => {
                let mut demand = self.demand.borrow_mut();
                if !demand.contains(&key) {
                    demand.push(key);
                }
                Resolution::Pending
            }
        }
    }

    /// Displayable URL for a blob owned by `owner`.
    pub fn blob(&self, owner: &str, blob: Option<&BlobRef>) -> Resolution<String> {
        let Some(cid) = blob.and_then(BlobRef::cid) else {
            return Resolution::Failed("missing blob reference".into());
        };
        if owner.is_empty() {
            return Resolution::Failed("blob owner unknown".into());
        }
        let key = ResourceKey::Blob {
            owner: owner.into(),
            cid: cid.into(),
        };
        match self.lookup(key) {
            Resolution::Resolved(Resource::Url(url)) => Resolution::Resolved(url.clone()),
            Resolution::Resolved(other) => unexpected(other),
            Resolution::Pending => Resolution::Pending,
            Resolution::Failed(reason) => Resolution::Failed(reason),
        }
    }

    pub fn post(&self, repo: &str, rkey: &str) -> Resolution<Arc<PostRecord>> {
        let key = ResourceKey::Post {
            repo: repo.into(),
            rkey: rkey.into(),
        };
        match self.lookup(key) {
            Resolution::Resolved(Resource::Post(post)) => Resolution::Resolved(post.clone()),
            Resolution::Resolved(other) => unexpected(other),
            Resolution::Pending => Resolution::Pending,
            Resolution::Failed(reason) => Resolution::Failed(reason),
        }
    }

    pub fn handle(&self, did: &str) -> Resolution<SmolStr> {
        let key = ResourceKey::Handle { did: did.into() };
        match self.lookup(key) {
            Resolution::Resolved(Resource::Handle(handle)) => Resolution::Resolved(handle.clone()),
            Resolution::Resolved(other) => unexpected(other),
            Resolution::Pending => Resolution::Pending,
            Resolution::Failed(reason) => Resolution::Failed(reason),
        }
    }
}

fn unexpected<T>(resource: &Resource) -> Resolution<T> {
    tracing::warn!(?resource, "resource settled with the wrong kind");
    Resolution::Failed("unexpected resource kind".into())
}
