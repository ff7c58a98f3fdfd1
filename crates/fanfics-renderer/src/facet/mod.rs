//! Rich-text facets: byte-range annotations over plain text.

mod offsets;
mod render;
mod resolver;
mod types;

pub use offsets::BytePrefix;
pub use render::{render_faceted, render_segment};
pub use resolver::{Segment, resolve_segments};
pub use types::{ByteRange, Facet, FacetFeature};
