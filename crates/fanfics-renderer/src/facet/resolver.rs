use super::offsets::BytePrefix;
use super::types::{Facet, FacetFeature};
use std::cmp::Ordering;
use std::ops::Range;

/// A maximal run of text covered by the same set of features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    /// Code point range of `text` within the source
    pub chars: Range<usize>,
    /// Active features in activation order
    pub features: Vec<&'a FacetFeature>,
}

#[derive(Debug, Clone, Copy)]
struct FacetEvent {
    pos: usize,
    is_start: bool,
    facet_idx: usize,
}

impl PartialEq for FacetEvent {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos && self.is_start == other.is_start
    }
}

impl Eq for FacetEvent {}

impl PartialOrd for FacetEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FacetEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.pos.cmp(&other.pos) {
            // At the same boundary, ends are applied before starts
            Ordering::Equal => match (self.is_start, other.is_start) {
                (false, true) => Ordering::Less,
                (true, false) => Ordering::Greater,
                _ => Ordering::Equal,
            },
            ord => ord,
        }
    }
}

/// Split `text` into non-overlapping segments at every facet boundary.
///
/// Facet ranges are UTF-8 byte offsets; they are mapped to code point
/// indices first, and ranges that end up empty are dropped. Never fails.
pub fn resolve_segments<'a>(text: &'a str, facets: &'a [Facet]) -> Vec<Segment<'a>> {
    if facets.is_empty() {
        return vec![Segment {
            text,
            chars: 0..text.chars().count(),
            features: Vec::new(),
        }];
    }

    let prefix = BytePrefix::build(text);
    let mut events = Vec::with_capacity(facets.len() * 2);
    for (facet_idx, facet) in facets.iter().enumerate() {
        let Some(bytes) = facet.index.and_then(|index| index.to_range()) else {
            tracing::debug!(facet_idx, index = ?facet.index, "dropping facet without a usable range");
            continue;
        };
        let start = prefix.char_index(bytes.start);
        let end = prefix.char_index(bytes.end);
        if start >= end {
            tracing::debug!(facet_idx, ?bytes, "dropping facet outside the text");
            continue;
        }
        events.push(FacetEvent {
            pos: start,
            is_start: true,
            facet_idx,
        });
        events.push(FacetEvent {
            pos: end,
            is_start: false,
            facet_idx,
        });
    }
    // Stable, so starts at the same boundary keep facet order
    events.sort();

    let mut active: Vec<(usize, &'a FacetFeature)> = Vec::new();
    let mut segments = Vec::with_capacity(events.len() + 1);
    let mut last = 0;
    let mut emit = |from: usize, to: usize, active: &[(usize, &'a FacetFeature)]| {
        segments.push(Segment {
            text: &text[prefix.byte_offset(from)..prefix.byte_offset(to)],
            chars: from..to,
            features: active.iter().map(|(_, feature)| *feature).collect(),
        });
    };

    for event in events {
        if event.pos > last {
            emit(last, event.pos, &active);
            last = event.pos;
        }
        if event.is_start {
            active.extend(
                facets[event.facet_idx]
                    .features
                    .iter()
                    .map(|feature| (event.facet_idx, feature)),
            );
        } else {
            active.retain(|(idx, _)| *idx != event.facet_idx);
        }
    }
    if prefix.char_len() > last {
        emit(last, prefix.char_len(), &active);
    }

    segments
}
