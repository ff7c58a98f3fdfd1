use super::embed::resolve_embed;
use super::types::{POST_COLLECTION, PostRecord};
use crate::facet::render_faceted;
use crate::resolve::{RenderContext, Resolution};
use crate::types::RecordUri;
use crate::view::{EmbedView, PostView, QuotedPost, ReplyLabel, Timestamp};

/// Render a bluesky post.
///
/// `depth` is 0 for the post being displayed and grows by one for every
/// quote level; posts with `depth > 0` render compact, without a footer.
pub fn render_post(
    post: &PostRecord,
    uri: Option<&RecordUri>,
    ctx: &RenderContext<'_>,
    depth: usize,
    embed_override: Option<EmbedView>,
) -> PostView {
    let config = ctx.config();
    let owner = uri.map(|u| u.authority.as_str()).unwrap_or_default();
    let quoted = depth > 0;

    let author = (quoted && !owner.is_empty()).then(|| identity_label(owner, ctx));
    let reply = if quoted {
        None
    } else {
        post.reply.as_ref().and_then(|reply| {
            let parent = RecordUri::parse(&reply.parent.uri).ok()?;
            let (_, rkey) = parent.record()?;
            Some(ReplyLabel {
                href: config.post_url(&parent.authority, rkey),
                label: identity_label(&parent.authority, ctx),
            })
        })
    };
    let web_url = if quoted {
        None
    } else {
        uri.and_then(|uri| {
            uri.record()
                .map(|(_, rkey)| config.post_url(&uri.authority, rkey))
        })
    };

    PostView {
        created_at: post.created_at.as_deref().map(Timestamp::parse),
        author,
        body: render_faceted(&post.text, post.facets(), config),
        embed: resolve_embed(post, owner, embed_override, ctx, depth),
        reply,
        web_url,
        quoted,
    }
}

/// Follow a post reference from a leaflet block or quote embed.
///
/// Unparsable references, non-post records and references nested deeper
/// than `max_embed_depth` are unavailable.
pub fn render_post_reference(uri: &str, ctx: &RenderContext<'_>, depth: usize) -> QuotedPost {
    let max_depth = ctx.config().max_embed_depth;
    if depth > max_depth {
        tracing::warn!(uri, depth, max_depth, "embedded post nested too deep");
        return QuotedPost::Unavailable;
    }
    let parsed = match RecordUri::parse(uri) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::debug!(error = %err, "unparsable post reference");
            return QuotedPost::Unavailable;
        }
    };
    let Some((POST_COLLECTION, rkey)) = parsed.record() else {
        tracing::debug!(uri, "reference does not name a post");
        return QuotedPost::Unavailable;
    };
    match ctx.post(&parsed.authority, rkey) {
        Resolution::Pending => QuotedPost::Loading,
        Resolution::Failed(_) => QuotedPost::Failed,
        Resolution::Resolved(post) => QuotedPost::Post(Box::new(render_post(
            &post,
            Some(&parsed),
            ctx,
            depth,
            None,
        ))),
    }
}

/// `@handle` when the authority is (or resolves to) a handle, otherwise the
/// DID itself.
fn identity_label(authority: &str, ctx: &RenderContext<'_>) -> String {
    if !authority.starts_with("did:") {
        return format!("@{authority}");
    }
    match ctx.handle(authority) {
        Resolution::Resolved(handle) => format!("@{handle}"),
        Resolution::Pending | Resolution::Failed(_) => format!("@{authority}"),
    }
}
