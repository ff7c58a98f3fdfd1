//! Record fragments shared by leaflet and bluesky records.

use crate::error::RenderError;
use jacquard::types::string::AtUri;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use smol_str::SmolStr;

/// `deserialize_with` for optional fields: a value of the wrong shape reads
/// as `None` instead of rejecting the surrounding record.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(value) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            tracing::debug!(error = %err, "ignoring malformed optional field");
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CidLink {
    #[serde(rename = "$link")]
    pub link: SmolStr,
}

/// A blob reference: `{ ref: { $link }, mimeType, size }`, or the legacy
/// `{ cid, mimeType }` shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobRef {
    #[serde(rename = "ref", default)]
    pub link: Option<CidLink>,
    #[serde(default)]
    pub cid: Option<SmolStr>,
    #[serde(default)]
    pub mime_type: Option<SmolStr>,
    #[serde(default, deserialize_with = "lenient")]
    pub size: Option<u64>,
}

impl BlobRef {
    pub fn from_cid(cid: &str) -> Self {
        Self {
            link: Some(CidLink { link: cid.into() }),
            ..Default::default()
        }
    }

    /// Content identifier, preferring `ref.$link` over the legacy `cid`.
    pub fn cid(&self) -> Option<&str> {
        self.link
            .as_ref()
            .map(|l| l.link.as_str())
            .or(self.cid.as_deref())
            .filter(|cid| !cid.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AspectRatio {
    pub width: i64,
    pub height: i64,
}

impl AspectRatio {
    /// CSS `aspect-ratio` value, when both sides are positive.
    pub fn css(&self) -> Option<String> {
        (self.width > 0 && self.height > 0).then(|| format!("{} / {}", self.width, self.height))
    }
}

/// `com.atproto.repo.strongRef`; the CID is optional since only the URI is
/// used for lookups.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StrongRef {
    pub uri: String,
    #[serde(default)]
    pub cid: Option<SmolStr>,
}

/// The parts of an AT URI the renderer cares about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordUri {
    pub authority: SmolStr,
    pub collection: Option<SmolStr>,
    pub rkey: Option<SmolStr>,
}

impl RecordUri {
    pub fn parse(uri: &str) -> Result<Self, RenderError> {
        let at_uri = AtUri::new(uri).map_err(|e| RenderError::InvalidUri(format!("{uri}: {e}")))?;
        let authority: &str = at_uri.authority().as_ref();
        let collection: Option<&str> = at_uri.collection().map(|c| c.as_ref());
        let rkey: Option<&str> = at_uri.rkey().map(|r| r.as_ref());
        Ok(Self {
            authority: authority.into(),
            collection: collection.map(SmolStr::new),
            rkey: rkey.map(SmolStr::new),
        })
    }

    /// Collection and record key, when the URI names a single record.
    pub fn record(&self) -> Option<(&str, &str)> {
        match (&self.collection, &self.rkey) {
            (Some(collection), Some(rkey)) => Some((collection.as_str(), rkey.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "at://{}", self.authority)?;
        if let Some(collection) = &self.collection {
            write!(f, "/{collection}")?;
        }
        if let Some(rkey) = &self.rkey {
            write!(f, "/{rkey}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_ref_prefers_link() {
        let blob: BlobRef = serde_json::from_str(
            r#"{"$type": "blob", "ref": {"$link": "bafkreiaaa"}, "mimeType": "image/png", "size": 1024}"#,
        )
        .unwrap();
        assert_eq!(blob.cid(), Some("bafkreiaaa"));

        let legacy: BlobRef =
            serde_json::from_str(r#"{"cid": "bafkreibbb", "mimeType": "image/jpeg"}"#).unwrap();
        assert_eq!(legacy.cid(), Some("bafkreibbb"));

        let empty: BlobRef = serde_json::from_str(r#"{"mimeType": "image/jpeg"}"#).unwrap();
        assert_eq!(empty.cid(), None);
    }

    #[test]
    fn aspect_ratio_needs_positive_sides() {
        assert_eq!(
            AspectRatio {
                width: 16,
                height: 9
            }
            .css()
            .as_deref(),
            Some("16 / 9")
        );
        assert_eq!(AspectRatio { width: 0, height: 9 }.css(), None);
    }

    #[test]
    fn parses_record_uri() {
        let uri = RecordUri::parse("at://did:plc:abc/app.bsky.feed.post/3kabc").unwrap();
        assert_eq!(uri.authority, "did:plc:abc");
        assert_eq!(uri.record(), Some(("app.bsky.feed.post", "3kabc")));
        assert_eq!(uri.to_string(), "at://did:plc:abc/app.bsky.feed.post/3kabc");
    }

    #[test]
    fn rejects_garbage_uri() {
        assert!(RecordUri::parse("not a uri").is_err());
    }
}
