//! Fanfics renderer
//!
//! Renders AT Protocol rich text for the fanfics reader: leaflet documents
//! and bluesky posts, with their byte-range facets, block trees and embeds.
//! Rendering is synchronous and works from a snapshot of resolution state;
//! [`RenderSession`] drives the async lookups (blobs, embedded posts,
//! handles) between render passes.
//!
//! ```no_run
//! # async fn demo() -> Result<(), fanfics_renderer::RenderError> {
//! use fanfics_renderer::{RenderConfig, RenderSession, ServiceConfig, ToHtml, XrpcResolver};
//!
//! let mut session = RenderSession::new(RenderConfig::default());
//! session.open("at://did:plc:abc/pub.leaflet.document/3kdoc")?;
//! let rendered = session
//!     .resolve_all(&XrpcResolver::new(ServiceConfig::default()))
//!     .await;
//! println!("{}", rendered.view.to_html());
//! # Ok(())
//! # }
//! ```

pub mod bsky;
pub mod client;
pub mod config;
pub mod error;
pub mod facet;
pub mod html;
pub mod leaflet;
#[cfg(feature = "mathml")]
pub mod math;
pub mod resolve;
pub mod types;
pub mod view;

#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
pub use client::XrpcResolver;
pub use client::{BlobResolver, BlobUrlTemplate, HandleResolver, RecordFetcher, StaticResolver};
pub use config::{MathMode, RenderConfig, ServiceConfig};
pub use error::{RenderError, ResolveError};
pub use html::ToHtml;
pub use resolve::{
    Record, RenderContext, RenderSession, Rendered, Resolution, ResolutionSlot, SubjectView, Ticket,
};
pub use types::RecordUri;
