use crate::error::RenderError;
use crate::facet::Facet;
use crate::types::{AspectRatio, BlobRef, StrongRef, lenient};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use smol_str::SmolStr;

pub const DOCUMENT_COLLECTION: &str = "pub.leaflet.document";

const BLOCK_PREFIX: &str = "pub.leaflet.blocks.";
const LINEAR_PAGE: &str = "pub.leaflet.pages.linearDocument";

/// Plain text with facets: the shape shared by text, header and blockquote
/// blocks.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextBlock {
    pub plaintext: String,
    #[serde(default, deserialize_with = "lenient")]
    pub facets: Option<Vec<Facet>>,
}

impl TextBlock {
    pub fn facets(&self) -> &[Facet] {
        self.facets.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HeaderBlock {
    #[serde(default, deserialize_with = "lenient")]
    pub level: Option<i64>,
    #[serde(flatten)]
    pub text: TextBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBlock {
    #[serde(default)]
    pub image: Option<BlobRef>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub aspect_ratio: Option<AspectRatio>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListItem {
    pub content: Block,
    #[serde(default)]
    pub children: Option<Vec<ListItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UnorderedListBlock {
    #[serde(default)]
    pub children: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteBlock {
    pub src: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub preview_image: Option<BlobRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IframeBlock {
    pub url: String,
    #[serde(default, deserialize_with = "lenient")]
    pub height: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MathBlock {
    pub tex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeBlock {
    pub plaintext: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BskyPostBlock {
    pub post_ref: StrongRef,
}

/// A leaflet content block, discriminated by `$type`.
///
/// Unrecognised types become [`Block::Unknown`]. A recognised type with a
/// missing required field is a producer error and fails deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Text(TextBlock),
    Header(HeaderBlock),
    Blockquote(TextBlock),
    Image(ImageBlock),
    UnorderedList(UnorderedListBlock),
    Website(WebsiteBlock),
    Iframe(IframeBlock),
    Math(MathBlock),
    Code(CodeBlock),
    HorizontalRule,
    BskyPost(BskyPostBlock),
    Unknown { block_type: SmolStr },
}

impl Block {
    /// Lexicon name of the block, e.g. `text` or `unorderedList`.
    pub fn name(&self) -> &str {
        match self {
            Block::Text(_) => "text",
            Block::Header(_) => "header",
            Block::Blockquote(_) => "blockquote",
            Block::Image(_) => "image",
            Block::UnorderedList(_) => "unorderedList",
            Block::Website(_) => "website",
            Block::Iframe(_) => "iframe",
            Block::Math(_) => "math",
            Block::Code(_) => "code",
            Block::HorizontalRule => "horizontalRule",
            Block::BskyPost(_) => "bskyPost",
            Block::Unknown { block_type } => block_type,
        }
    }
}

fn payload<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value)
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let block_type = value
            .get("$type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let Some(name) = block_type.strip_prefix(BLOCK_PREFIX) else {
            return Ok(Block::Unknown {
                block_type: block_type.into(),
            });
        };
        let block = match name {
            "text" => payload(value).map(Block::Text),
            "header" => payload(value).map(Block::Header),
            "blockquote" => payload(value).map(Block::Blockquote),
            "image" => payload(value).map(Block::Image),
            "unorderedList" => payload(value).map(Block::UnorderedList),
            "website" => payload(value).map(Block::Website),
            "iframe" => payload(value).map(Block::Iframe),
            "math" => payload(value).map(Block::Math),
            "code" => payload(value).map(Block::Code),
            "horizontalRule" => Ok(Block::HorizontalRule),
            "bskyPost" => payload(value).map(Block::BskyPost),
            _ => Ok(Block::Unknown {
                block_type: block_type.as_str().into(),
            }),
        };
        block.map_err(|e| D::Error::custom(format!("{block_type}: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockWrapper {
    pub block: Block,
    #[serde(default)]
    pub alignment: Option<String>,
}

/// An ordered sequence of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LinearDocument {
    #[serde(default)]
    pub blocks: Vec<BlockWrapper>,
}

impl LinearDocument {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json).map_err(|source| RenderError::InvalidRecord {
            collection: LINEAR_PAGE,
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Linear(LinearDocument),
    Unknown { page_type: SmolStr },
}

impl<'de> Deserialize<'de> for Page {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value.get("$type").and_then(Value::as_str) {
            None | Some(LINEAR_PAGE) => payload(value).map(Page::Linear).map_err(D::Error::custom),
            Some(other) => Ok(Page::Unknown {
                page_type: other.into(),
            }),
        }
    }
}

/// A `pub.leaflet.document` record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl DocumentRecord {
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json).map_err(|source| RenderError::InvalidRecord {
            collection: DOCUMENT_COLLECTION,
            source,
        })
    }

    pub fn from_value(value: Value) -> Result<Self, RenderError> {
        serde_json::from_value(value).map_err(|source| RenderError::InvalidRecord {
            collection: DOCUMENT_COLLECTION,
            source,
        })
    }
}
