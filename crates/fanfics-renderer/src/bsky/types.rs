use crate::error::RenderError;
use crate::facet::Facet;
use crate::types::{AspectRatio, BlobRef, StrongRef, lenient};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use smol_str::SmolStr;

pub const POST_COLLECTION: &str = "app.bsky.feed.post";

/// An `app.bsky.feed.post` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    pub text: String,
    #[serde(default, deserialize_with = "lenient")]
    pub facets: Option<Vec<Facet>>,
    #[serde(default)]
    pub embed: Option<Embed>,
    #[serde(default)]
    pub reply: Option<ReplyRef>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl PostRecord {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json).map_err(|source| RenderError::InvalidRecord {
            collection: POST_COLLECTION,
            source,
        })
    }

    pub fn from_value(value: Value) -> Result<Self, RenderError> {
        serde_json::from_value(value).map_err(|source| RenderError::InvalidRecord {
            collection: POST_COLLECTION,
            source,
        })
    }

    pub fn facets(&self) -> &[Facet] {
        self.facets.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplyRef {
    pub parent: StrongRef,
    #[serde(default)]
    pub root: Option<StrongRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedImage {
    #[serde(default)]
    pub image: Option<BlobRef>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub aspect_ratio: Option<AspectRatio>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImagesEmbed {
    #[serde(default)]
    pub images: Vec<EmbeddedImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalLink {
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumb: Option<BlobRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalEmbed {
    pub external: ExternalLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordEmbed {
    pub record: StrongRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordWithMediaEmbed {
    pub media: Box<Embed>,
    pub record: Option<RecordEmbed>,
}

/// The `embed` union of a post.
///
/// Known variants with a broken payload and unrecognised `$type`s both
/// become [`Embed::Unknown`]; an unreadable embed never rejects the post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Embed {
    Images(ImagesEmbed),
    External(ExternalEmbed),
    Record(RecordEmbed),
    RecordWithMedia(RecordWithMediaEmbed),
    Unknown { embed_type: SmolStr },
}

impl Embed {
    pub fn from_value(value: Value) -> Self {
        let embed_type: SmolStr = value
            .get("$type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .into();
        let parsed = match embed_type.as_str() {
            "app.bsky.embed.images" => serde_json::from_value(value).map(Self::Images),
            "app.bsky.embed.external" => serde_json::from_value(value).map(Self::External),
            "app.bsky.embed.record" => serde_json::from_value(value).map(Self::Record),
            "app.bsky.embed.recordWithMedia" => Ok(Self::record_with_media(value)),
            _ => {
                tracing::debug!(%embed_type, "unrecognised embed type");
                return Self::Unknown { embed_type };
            }
        };
        parsed.unwrap_or_else(|err| {
            tracing::warn!(%embed_type, error = %err, "malformed embed, ignoring");
            Self::Unknown { embed_type }
        })
    }

    fn record_with_media(mut value: Value) -> Self {
        let media = value
            .get_mut("media")
            .map(Value::take)
            .map(Self::from_value)
            .unwrap_or(Self::Unknown {
                embed_type: SmolStr::default(),
            });
        let record = value
            .get_mut("record")
            .map(Value::take)
            .and_then(|record| serde_json::from_value(record).ok());
        Self::RecordWithMedia(RecordWithMediaEmbed {
            media: Box::new(media),
            record,
        })
    }
}

impl<'de> Deserialize<'de> for Embed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_with_images_embed() {
        let post = PostRecord::from_json(
            r#"{
                "$type": "app.bsky.feed.post",
                "text": "new chapter!",
                "createdAt": "2024-05-01T12:00:00.000Z",
                "embed": {
                    "$type": "app.bsky.embed.images",
                    "images": [{
                        "alt": "cover art",
                        "image": {"$type": "blob", "ref": {"$link": "bafkcover"}, "mimeType": "image/jpeg", "size": 10},
                        "aspectRatio": {"width": 3, "height": 4}
                    }]
                }
            }"#,
        )
        .unwrap();
        let Some(Embed::Images(images)) = &post.embed else {
            panic!("expected images embed, got {:?}", post.embed);
        };
        assert_eq!(images.images.len(), 1);
        assert_eq!(images.images[0].alt.as_deref(), Some("cover art"));
        assert!(post.facets().is_empty());
    }

    #[test]
    fn missing_text_is_rejected() {
        let err = PostRecord::from_json(r#"{"createdAt": "2024-05-01T12:00:00Z"}"#).unwrap_err();
        assert!(matches!(err, RenderError::InvalidRecord { .. }));
    }

    #[test]
    fn unknown_and_broken_embeds_degrade() {
        let post = PostRecord::from_json(
            r#"{"text": "", "embed": {"$type": "app.bsky.embed.video", "video": {}}}"#,
        )
        .unwrap();
        assert_eq!(
            post.embed,
            Some(Embed::Unknown {
                embed_type: "app.bsky.embed.video".into()
            })
        );

        let post = PostRecord::from_json(
            r#"{"text": "", "embed": {"$type": "app.bsky.embed.external", "external": {}}}"#,
        )
        .unwrap();
        assert_eq!(
            post.embed,
            Some(Embed::Unknown {
                embed_type: "app.bsky.embed.external".into()
            })
        );
    }

    #[test]
    fn record_with_media_keeps_both_halves() {
        let embed = Embed::from_value(serde_json::json!({
            "$type": "app.bsky.embed.recordWithMedia",
            "record": {
                "$type": "app.bsky.embed.record",
                "record": {"uri": "at://did:plc:q/app.bsky.feed.post/1", "cid": "bafy"}
            },
            "media": {"$type": "app.bsky.embed.images", "images": []}
        }));
        let Embed::RecordWithMedia(composite) = embed else {
            panic!("expected recordWithMedia");
        };
        assert_eq!(*composite.media, Embed::Images(ImagesEmbed { images: vec![] }));
        assert_eq!(
            composite.record.map(|r| r.record.uri),
            Some("at://did:plc:q/app.bsky.feed.post/1".to_string())
        );
    }
}
