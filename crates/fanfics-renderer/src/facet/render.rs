use super::resolver::{Segment, resolve_segments};
use super::types::{Facet, FacetFeature};
use crate::config::RenderConfig;
use crate::view::{Inline, Wrapper};

/// Turn one segment into inline nodes.
///
/// Each `\n` becomes a hard [`Inline::Break`] that is never wrapped; the
/// parts between breaks are wrapped by the segment's features, first feature
/// innermost. Empty parts become [`Inline::Blank`] so blank lines keep their
/// height.
pub fn render_segment(segment: &Segment<'_>, config: &RenderConfig) -> Vec<Inline> {
    let mut nodes = Vec::new();
    for (idx, part) in segment.text.split('\n').enumerate() {
        if idx > 0 {
            nodes.push(Inline::Break);
        }
        let leaf = if part.is_empty() {
            Inline::Blank
        } else {
            Inline::Text(part.to_owned())
        };
        let node = segment.features.iter().fold(leaf, |child, feature| Inline::Span {
            wrapper: wrapper_for(feature, config),
            children: vec![child],
        });
        nodes.push(node);
    }
    nodes
}

/// Resolve and render a whole faceted text.
pub fn render_faceted(text: &str, facets: &[Facet], config: &RenderConfig) -> Vec<Inline> {
    resolve_segments(text, facets)
        .iter()
        .flat_map(|segment| render_segment(segment, config))
        .collect()
}

fn wrapper_for(feature: &FacetFeature, config: &RenderConfig) -> Wrapper {
    match feature {
        FacetFeature::Link { uri } => Wrapper::Link {
            href: uri.to_string(),
        },
        FacetFeature::Mention { did } => Wrapper::Mention {
            href: config.profile_url(did),
        },
        FacetFeature::Tag { tag } => Wrapper::Tag {
            href: config.hashtag_url(tag),
        },
        FacetFeature::Bold => Wrapper::Strong,
        FacetFeature::Italic => Wrapper::Emphasis,
        FacetFeature::Underline => Wrapper::Underline,
        FacetFeature::Strikethrough => Wrapper::Strikethrough,
        FacetFeature::Highlight => Wrapper::Mark,
        FacetFeature::Code => Wrapper::Code,
        FacetFeature::AnchorId { id } => Wrapper::Anchor { id: id.clone() },
        FacetFeature::Unknown { .. } => Wrapper::Inert,
    }
}
