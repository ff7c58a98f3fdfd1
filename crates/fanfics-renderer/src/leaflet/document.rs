use super::types::{DocumentRecord, Page};
use super::walker::render_document;
use crate::resolve::RenderContext;
use crate::types::RecordUri;
use crate::view::{DocumentView, Timestamp};

/// Render a `pub.leaflet.document` record.
///
/// Blobs are owned by the repository in `uri`; without a URI images render
/// as unavailable and no canonical link is produced.
pub fn render_document_record(
    record: &DocumentRecord,
    uri: Option<&RecordUri>,
    ctx: &RenderContext<'_>,
) -> DocumentView {
    let owner = uri.map(|u| u.authority.as_str()).unwrap_or_default();
    let pages = record
        .pages
        .iter()
        .filter_map(|page| match page {
            Page::Linear(document) => Some(render_document(&document.blocks, owner, ctx)),
            Page::Unknown { page_type } => {
                tracing::debug!(%page_type, "skipping unsupported page type");
                None
            }
        })
        .collect();
    let canonical_url = uri.and_then(|uri| {
        uri.record()
            .map(|(_, rkey)| ctx.config().document_url(&uri.authority, rkey))
    });

    DocumentView {
        title: record.title.clone(),
        published_at: record.published_at.as_deref().map(Timestamp::parse),
        pages,
        canonical_url,
    }
}
