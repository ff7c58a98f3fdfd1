//! Render and service configuration.
//!
//! Both structs are plain serde data with defaults so callers can build them
//! from whatever config format they like; the CLI reads KDL overrides.

use serde::{Deserialize, Serialize};

/// How `pub.leaflet.blocks.math` blocks are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathMode {
    /// TeX source in a `<pre>` block
    #[default]
    Preformatted,
    /// MathML rendered with pulldown-latex
    MathMl,
}

/// Knobs for view construction. Injected into the session, never global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderConfig {
    /// Base of the bluesky web client, used for profile, hashtag and post links
    pub web_base: String,
    /// Base of the leaflet web client, used for document canonical links
    pub leaflet_base: String,
    pub iframe_default_height: u32,
    pub max_list_depth: usize,
    pub max_embed_depth: usize,
    pub math: MathMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            web_base: "https://bsky.app".into(),
            leaflet_base: "https://leaflet.pub".into(),
            iframe_default_height: 400,
            max_list_depth: 20,
            max_embed_depth: 3,
            math: MathMode::Preformatted,
        }
    }
}

impl RenderConfig {
    pub fn profile_url(&self, did: &str) -> String {
        format!("{}/profile/{}", self.web_base.trim_end_matches('/'), did)
    }

    pub fn hashtag_url(&self, tag: &str) -> String {
        format!("{}/hashtag/{}", self.web_base.trim_end_matches('/'), tag)
    }

    pub fn post_url(&self, did: &str, rkey: &str) -> String {
        format!(
            "{}/profile/{}/post/{}",
            self.web_base.trim_end_matches('/'),
            did,
            rkey
        )
    }

    pub fn document_url(&self, did: &str, rkey: &str) -> String {
        format!("{}/p/{}/{}", self.leaflet_base.trim_end_matches('/'), did, rkey)
    }
}

/// Endpoints for the network collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// `{did}` and `{cid}` are substituted
    pub blob_url_template: String,
    /// Host answering `com.atproto.repo.getRecord` for any repo
    pub record_service: String,
    pub plc_directory: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            blob_url_template: "https://cdn.bsky.app/img/feed_fullsize/plain/{did}/{cid}@jpeg"
                .into(),
            record_service: "https://slingshot.microcosm.blue".into(),
            plc_directory: "https://plc.directory".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: RenderConfig =
            serde_json::from_str(r#"{"webBase": "https://example.social/", "math": "mathml"}"#)
                .unwrap();
        assert_eq!(config.math, MathMode::MathMl);
        assert_eq!(config.max_list_depth, 20);
        assert_eq!(
            config.profile_url("did:plc:abc"),
            "https://example.social/profile/did:plc:abc"
        );
    }

    #[test]
    fn link_builders() {
        let config = RenderConfig::default();
        assert_eq!(
            config.post_url("did:plc:abc", "3kxyz"),
            "https://bsky.app/profile/did:plc:abc/post/3kxyz"
        );
        assert_eq!(config.hashtag_url("wip"), "https://bsky.app/hashtag/wip");
        assert_eq!(
            config.document_url("did:plc:abc", "3kdoc"),
            "https://leaflet.pub/p/did:plc:abc/3kdoc"
        );
    }
}
