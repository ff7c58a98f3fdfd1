use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use std::ops::Range;

/// Lexicon namespaces whose facet features share one vocabulary.
const FEATURE_NAMESPACES: &[&str] = &[
    "app.bsky.richtext.facet",
    "pub.leaflet.richtext.facet",
    "blog.pckt.richtext.facet",
];

/// Half-open UTF-8 byte interval as it appears on the wire.
///
/// Values are kept signed so that negative offsets from a misbehaving
/// producer survive deserialization and can be clamped instead of rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteRange {
    #[serde(default)]
    pub byte_start: i64,
    #[serde(default)]
    pub byte_end: i64,
}

impl ByteRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            byte_start: start,
            byte_end: end,
        }
    }

    pub fn start(&self) -> usize {
        clamp_offset(self.byte_start)
    }

    pub fn end(&self) -> usize {
        clamp_offset(self.byte_end)
    }

    pub fn is_empty(&self) -> bool {
        self.start() >= self.end()
    }

    /// Both offsets of an `index` object, when both are integers.
    fn from_value(value: &Value) -> Option<Self> {
        Some(Self::new(
            value.get("byteStart")?.as_i64()?,
            value.get("byteEnd")?.as_i64()?,
        ))
    }

    /// Clamped byte range, or `None` when nothing is left after clamping.
    pub fn to_range(self) -> Option<Range<usize>> {
        if self.is_empty() {
            None
        } else {
            Some(self.start()..self.end())
        }
    }
}

/// Negative offsets clamp to 0; offsets past the address space saturate.
fn clamp_offset(offset: i64) -> usize {
    usize::try_from(offset.max(0)).unwrap_or(usize::MAX)
}

/// A single rich-text annotation.
///
/// Deserialization never fails: a missing or unrecognised `$type`, or a known
/// tag missing its required field, yields [`FacetFeature::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum FacetFeature {
    Link { uri: SmolStr },
    Mention { did: SmolStr },
    Tag { tag: SmolStr },
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Highlight,
    Code,
    AnchorId { id: Option<SmolStr> },
    Unknown { feature_type: SmolStr },
}

impl FacetFeature {
    fn parse(value: &Value) -> Option<Self> {
        let feature_type = value.get("$type")?.as_str()?;
        let (namespace, name) = feature_type.split_once('#')?;
        if !FEATURE_NAMESPACES.contains(&namespace) {
            return None;
        }
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(SmolStr::new);

        let feature = match name {
            "link" => Self::Link { uri: field("uri")? },
            "mention" | "didMention" => Self::Mention { did: field("did")? },
            "tag" => Self::Tag { tag: field("tag")? },
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "strikethrough" => Self::Strikethrough,
            "highlight" => Self::Highlight,
            "code" => Self::Code,
            "id" => Self::AnchorId { id: field("id") },
            _ => return None,
        };
        Some(feature)
    }
}

impl From<Value> for FacetFeature {
    fn from(value: Value) -> Self {
        Self::parse(&value).unwrap_or_else(|| {
            let feature_type = value
                .get("$type")
                .and_then(Value::as_str)
                .unwrap_or_default();
            tracing::debug!(feature_type, "unrecognised facet feature, rendering inert");
            Self::Unknown {
                feature_type: feature_type.into(),
            }
        })
    }
}

/// A byte range and the features applied to it.
///
/// Like [`FacetFeature`], decoding never fails. An `index` whose offsets are
/// not both integers becomes `None` and the facet is skipped at render time;
/// a `features` value that is not an array reads as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct Facet {
    pub index: Option<ByteRange>,
    pub features: Vec<FacetFeature>,
}

impl From<Value> for Facet {
    fn from(value: Value) -> Self {
        let index = value.get("index").and_then(ByteRange::from_value);
        if index.is_none() {
            tracing::debug!(index = ?value.get("index"), "facet without a usable byte range");
        }
        let features = match value.get("features") {
            Some(Value::Array(features)) => features.iter().cloned().map(FacetFeature::from).collect(),
            _ => Vec::new(),
        };
        Self { index, features }
    }
}

impl Facet {
    pub fn new(start: i64, end: i64, features: Vec<FacetFeature>) -> Self {
        Self {
            index: Some(ByteRange::new(start, end)),
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_offsets_clamp_to_zero() {
        let range = ByteRange::new(-5, 3);
        assert_eq!(range.to_range(), Some(0..3));
        assert_eq!(ByteRange::new(-4, -1).to_range(), None);
        assert_eq!(ByteRange::new(6, 2).to_range(), None);
    }

    #[test]
    fn parses_leaflet_and_bsky_features() {
        let json = r#"[
            {"$type": "pub.leaflet.richtext.facet#bold"},
            {"$type": "app.bsky.richtext.facet#link", "uri": "https://example.com"},
            {"$type": "pub.leaflet.richtext.facet#didMention", "did": "did:plc:abc"},
            {"$type": "app.bsky.richtext.facet#mention", "did": "did:plc:def"},
            {"$type": "blog.pckt.richtext.facet#highlight"},
            {"$type": "pub.leaflet.richtext.facet#id"}
        ]"#;
        let features: Vec<FacetFeature> = serde_json::from_str(json).unwrap();
        assert_eq!(
            features,
            vec![
                FacetFeature::Bold,
                FacetFeature::Link {
                    uri: "https://example.com".into()
                },
                FacetFeature::Mention {
                    did: "did:plc:abc".into()
                },
                FacetFeature::Mention {
                    did: "did:plc:def".into()
                },
                FacetFeature::Highlight,
                FacetFeature::AnchorId { id: None },
            ]
        );
    }

    #[test]
    fn unrecognised_features_degrade() {
        let json = r#"[
            {"$type": "pub.leaflet.richtext.facet#sparkle"},
            {"$type": "app.bsky.richtext.facet#link"},
            {"$type": "com.example.facet#bold"},
            {"uri": "https://example.com"}
        ]"#;
        let features: Vec<FacetFeature> = serde_json::from_str(json).unwrap();
        assert_eq!(
            features,
            vec![
                FacetFeature::Unknown {
                    feature_type: "pub.leaflet.richtext.facet#sparkle".into()
                },
                FacetFeature::Unknown {
                    feature_type: "app.bsky.richtext.facet#link".into()
                },
                FacetFeature::Unknown {
                    feature_type: "com.example.facet#bold".into()
                },
                FacetFeature::Unknown {
                    feature_type: "".into()
                },
            ]
        );
    }

    #[test]
    fn huge_offsets_saturate() {
        let range = ByteRange::new(0, i64::MAX);
        assert_eq!(range.start(), 0);
        assert!(range.end() >= u32::MAX as usize);
    }

    #[test]
    fn malformed_facets_decode_without_range() {
        let json = r#"[
            {"index": {"byteStart": "0", "byteEnd": 3}, "features": [{"$type": "app.bsky.richtext.facet#bold"}]},
            {"index": {"byteStart": 0, "byteEnd": 1.5}, "features": []},
            {"index": {"byteStart": 1, "byteEnd": 2}, "features": null},
            {"index": {"byteStart": 1, "byteEnd": 2}, "features": {"$type": "app.bsky.richtext.facet#bold"}},
            "not a facet"
        ]"#;
        let facets: Vec<Facet> = serde_json::from_str(json).unwrap();
        assert_eq!(facets[0].index, None);
        assert_eq!(facets[0].features, vec![FacetFeature::Bold]);
        assert_eq!(facets[1].index, None);
        assert_eq!(facets[2].index, Some(ByteRange::new(1, 2)));
        assert!(facets[2].features.is_empty());
        assert!(facets[3].features.is_empty());
        assert_eq!(facets[4], Facet::default());
    }

    #[test]
    fn facet_without_index_deserializes() {
        let facet: Facet =
            serde_json::from_str(r#"{"features": [{"$type": "app.bsky.richtext.facet#tag", "tag": "wip"}]}"#)
                .unwrap();
        assert_eq!(facet.index, None);
        assert_eq!(
            facet.features,
            vec![FacetFeature::Tag { tag: "wip".into() }]
        );
    }
}
