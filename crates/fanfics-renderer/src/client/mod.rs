//! Async collaborators: blob URLs, repository records and handles.

mod memory;
#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
mod xrpc;

pub use memory::StaticResolver;
#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
pub use xrpc::XrpcResolver;

use crate::bsky::{POST_COLLECTION, PostRecord};
use crate::error::ResolveError;
use crate::resolve::{Resource, ResourceKey};
use smol_str::SmolStr;
use std::sync::Arc;

/// Turns a blob reference into a displayable URL.
pub trait BlobResolver {
    fn resolve_blob(
        &self,
        owner: &str,
        cid: &str,
    ) -> impl std::future::Future<Output = Result<String, ResolveError>>;
}

/// Fetches a record's `value` from a repository.
///
/// A missing record is reported as [`ResolveError::NotFound`], distinct from
/// transport failures.
pub trait RecordFetcher {
    fn get_record(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, ResolveError>>;
}

/// Resolves a DID to its current handle.
pub trait HandleResolver {
    fn resolve_handle(
        &self,
        did: &str,
    ) -> impl std::future::Future<Output = Result<SmolStr, ResolveError>>;
}

/// Resolver that knows nothing; every lookup fails as not found.
impl BlobResolver for () {
    async fn resolve_blob(&self, _owner: &str, cid: &str) -> Result<String, ResolveError> {
        Err(ResolveError::NotFound(cid.to_string()))
    }
}

impl RecordFetcher for () {
    async fn get_record(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<serde_json::Value, ResolveError> {
        Err(ResolveError::NotFound(format!("at://{repo}/{collection}/{rkey}")))
    }
}

impl HandleResolver for () {
    async fn resolve_handle(&self, did: &str) -> Result<SmolStr, ResolveError> {
        Err(ResolveError::NotFound(did.to_string()))
    }
}

/// Substitutes `{did}` and `{cid}` into a URL template, e.g. a CDN path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobUrlTemplate {
    template: String,
}

impl BlobUrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn url(&self, owner: &str, cid: &str) -> Result<String, ResolveError> {
        if owner.is_empty() || cid.is_empty() {
            return Err(ResolveError::InvalidReference(format!(
                "blob {cid:?} owned by {owner:?}"
            )));
        }
        Ok(self.template.replace("{did}", owner).replace("{cid}", cid))
    }
}

impl Default for BlobUrlTemplate {
    fn default() -> Self {
        Self::new(crate::config::ServiceConfig::default().blob_url_template)
    }
}

impl BlobResolver for BlobUrlTemplate {
    async fn resolve_blob(&self, owner: &str, cid: &str) -> Result<String, ResolveError> {
        self.url(owner, cid)
    }
}

/// Look up one resource through whichever collaborator serves its kind.
pub async fn fetch_resource<R>(resolver: &R, key: &ResourceKey) -> Result<Resource, ResolveError>
where
    R: BlobResolver + RecordFetcher + HandleResolver,
{
    match key {
        ResourceKey::Blob { owner, cid } => {
            resolver.resolve_blob(owner, cid).await.map(Resource::Url)
        }
        ResourceKey::Post { repo, rkey } => {
            let value = resolver.get_record(repo, POST_COLLECTION, rkey).await?;
            let post: PostRecord = serde_json::from_value(value).map_err(|err| {
                ResolveError::Malformed(format!("at://{repo}/{POST_COLLECTION}/{rkey}: {err}"))
            })?;
            Ok(Resource::Post(Arc::new(post)))
        }
        ResourceKey::Handle { did } => resolver.resolve_handle(did).await.map(Resource::Handle),
    }
}
