use super::{BlobResolver, BlobUrlTemplate, HandleResolver, RecordFetcher};
use crate::error::ResolveError;
use crate::types::RecordUri;
use smol_str::SmolStr;
use std::collections::HashMap;

/// In-memory collaborator for tests and offline rendering.
///
/// Records and handles are served from maps. Blobs are served from explicit
/// entries first, then from the optional URL template.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    records: HashMap<(SmolStr, SmolStr, SmolStr), serde_json::Value>,
    handles: HashMap<SmolStr, SmolStr>,
    blobs: HashMap<(SmolStr, SmolStr), String>,
    template: Option<BlobUrlTemplate>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, template: BlobUrlTemplate) -> Self {
        self.template = Some(template);
        self
    }

    /// Serve `value` for the record named by the AT URI `uri`.
    pub fn with_record(mut self, uri: &str, value: serde_json::Value) -> Self {
        match RecordUri::parse(uri) {
            Ok(parsed) => match parsed.record() {
                Some((collection, rkey)) => {
                    self.records.insert(
                        (parsed.authority.clone(), collection.into(), rkey.into()),
                        value,
                    );
                }
                None => tracing::warn!(uri, "static record needs a collection and rkey"),
            },
            Err(err) => tracing::warn!(uri, error = %err, "ignoring static record"),
        }
        self
    }

    pub fn with_handle(mut self, did: &str, handle: &str) -> Self {
        self.handles.insert(did.into(), handle.into());
        self
    }

    pub fn with_blob(mut self, owner: &str, cid: &str, url: impl Into<String>) -> Self {
        self.blobs.insert((owner.into(), cid.into()), url.into());
        self
    }
}

impl BlobResolver for StaticResolver {
    async fn resolve_blob(&self, owner: &str, cid: &str) -> Result<String, ResolveError> {
        if let Some(url) = self.blobs.get(&(SmolStr::new(owner), SmolStr::new(cid))) {
            return Ok(url.clone());
        }
        match &self.template {
            Some(template) => template.url(owner, cid),
            None => Err(ResolveError::NotFound(format!("blob {cid}"))),
        }
    }
}

impl RecordFetcher for StaticResolver {
    async fn get_record(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<serde_json::Value, ResolveError> {
        self.records
            .get(&(SmolStr::new(repo), SmolStr::new(collection), SmolStr::new(rkey)))
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(format!("at://{repo}/{collection}/{rkey}")))
    }
}

impl HandleResolver for StaticResolver {
    async fn resolve_handle(&self, did: &str) -> Result<SmolStr, ResolveError> {
        self.handles
            .get(did)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(did.to_string()))
    }
}
