//! Leaflet (`pub.leaflet.*`) documents and their block tree.

mod document;
mod types;
mod walker;


pub use document::render_document_record;
pub use types::{
    Block, BlockWrapper, BskyPostBlock, CodeBlock, DOCUMENT_COLLECTION, DocumentRecord,
    HeaderBlock, IframeBlock, ImageBlock, LinearDocument, ListItem, MathBlock, Page, TextBlock,
    UnorderedListBlock, WebsiteBlock,
};
pub use walker::render_document;
