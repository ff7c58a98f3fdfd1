use super::{BlobResolver, BlobUrlTemplate, HandleResolver, RecordFetcher};
use crate::config::ServiceConfig;
use crate::error::ResolveError;
use serde::Deserialize;
use smol_str::SmolStr;
use url::Url;

/// HTTP collaborator: records via `com.atproto.repo.getRecord` on a record
/// service, handles via DID documents, blobs via a URL template.
#[derive(Debug, Clone)]
pub struct XrpcResolver {
    http: reqwest::Client,
    services: ServiceConfig,
    blobs: BlobUrlTemplate,
}

#[derive(Debug, Deserialize)]
struct GetRecordOutput {
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct XrpcErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DidDocument {
    #[serde(default)]
    also_known_as: Vec<String>,
}

impl XrpcResolver {
    pub fn new(services: ServiceConfig) -> Self {
        Self::with_client(reqwest::Client::new(), services)
    }

    pub fn with_client(http: reqwest::Client, services: ServiceConfig) -> Self {
        let blobs = BlobUrlTemplate::new(services.blob_url_template.clone());
        Self {
            http,
            services,
            blobs,
        }
    }

    pub fn get_record_url(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<Url, ResolveError> {
        let base = self.services.record_service.trim_end_matches('/');
        Url::parse_with_params(
            &format!("{base}/xrpc/com.atproto.repo.getRecord"),
            &[("repo", repo), ("collection", collection), ("rkey", rkey)],
        )
        .map_err(|e| ResolveError::InvalidReference(format!("record service {base}: {e}")))
    }

    /// Where the DID document for `did` lives.
    pub fn did_document_url(&self, did: &str) -> Result<Url, ResolveError> {
        let url = if did.starts_with("did:plc:") {
            let base = self.services.plc_directory.trim_end_matches('/');
            format!("{base}/{did}")
        } else if let Some(host) = did.strip_prefix("did:web:") {
            // Path segments are colon separated, ports are percent-encoded
            let mut parts = host.split(':');
            let domain = parts.next().unwrap_or_default().replace("%3A", ":");
            let path: Vec<&str> = parts.collect();
            if path.is_empty() {
                format!("https://{domain}/.well-known/did.json")
            } else {
                format!("https://{domain}/{}/did.json", path.join("/"))
            }
        } else {
            return Err(ResolveError::InvalidReference(format!(
                "unsupported DID method: {did}"
            )));
        };
        Url::parse(&url).map_err(|e| ResolveError::InvalidReference(format!("{did}: {e}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        what: &str,
    ) -> Result<T, ResolveError> {
        tracing::debug!(%url, "xrpc request");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ResolveError::Fetch {
                what: what.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| ResolveError::Fetch {
                what: what.to_string(),
                source: Box::new(e),
            });
        }

        // getRecord answers 400 with `RecordNotFound` for missing records
        let body = response.json::<XrpcErrorBody>().await.ok();
        let not_found = status == reqwest::StatusCode::NOT_FOUND
            || body
                .as_ref()
                .and_then(|b| b.error.as_deref())
                .is_some_and(|error| error == "RecordNotFound");
        if not_found {
            return Err(ResolveError::NotFound(what.to_string()));
        }
        let detail = body
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| status.to_string());
        Err(ResolveError::Fetch {
            what: what.to_string(),
            source: format!("{status}: {detail}").into(),
        })
    }
}

impl Default for XrpcResolver {
    fn default() -> Self {
        Self::new(ServiceConfig::default())
    }
}

impl RecordFetcher for XrpcResolver {
    async fn get_record(
        &self,
        repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<serde_json::Value, ResolveError> {
        let url = self.get_record_url(repo, collection, rkey)?;
        let what = format!("at://{repo}/{collection}/{rkey}");
        let output: GetRecordOutput = self.get_json(url, &what).await?;
        Ok(output.value)
    }
}

impl HandleResolver for XrpcResolver {
    async fn resolve_handle(&self, did: &str) -> Result<SmolStr, ResolveError> {
        let url = self.did_document_url(did)?;
        let document: DidDocument = self.get_json(url, did).await?;
        document
            .also_known_as
            .iter()
            .find_map(|aka| aka.strip_prefix("at://"))
            .map(SmolStr::new)
            .ok_or_else(|| ResolveError::NotFound(format!("handle for {did}")))
    }
}

impl BlobResolver for XrpcResolver {
    async fn resolve_blob(&self, owner: &str, cid: &str) -> Result<String, ResolveError> {
        self.blobs.url(owner, cid)
    }
}
