//! Bluesky posts (`app.bsky.feed.post`) and their embeds.

mod embed;
mod post;
mod types;


pub use embed::resolve_embed;
pub use post::{render_post, render_post_reference};
pub use types::{
    Embed, EmbeddedImage, ExternalEmbed, ExternalLink, ImagesEmbed, POST_COLLECTION, PostRecord,
    RecordEmbed, RecordWithMediaEmbed, ReplyRef,
};
