use super::post::render_post_reference;
use super::types::{EmbeddedImage, Embed, ExternalLink, PostRecord};
use crate::resolve::RenderContext;
use crate::view::{EmbedView, GridLayout, ImageView, ImagesView, LinkCardView};

/// Pick the embed view for a post.
///
/// An explicit `embed_override` always wins. Otherwise the post's own embed
/// is resolved: blobs against `owner`, quoted posts one level deeper than
/// `depth`.
pub fn resolve_embed(
    post: &PostRecord,
    owner: &str,
    embed_override: Option<EmbedView>,
    ctx: &RenderContext<'_>,
    depth: usize,
) -> Option<EmbedView> {
    if embed_override.is_some() {
        return embed_override;
    }
    match post.embed.as_ref()? {
        Embed::Images(images) => images_view(&images.images, owner, ctx).map(EmbedView::Images),
        Embed::External(external) => Some(EmbedView::External(link_card(
            &external.external,
            owner,
            ctx,
        ))),
        Embed::Record(record) => Some(EmbedView::Quote(render_post_reference(
            &record.record.uri,
            ctx,
            depth + 1,
        ))),
        Embed::RecordWithMedia(composite) => match composite.media.as_ref() {
            // Only image media unwraps; the quoted record half is not shown
            Embed::Images(images) => {
                images_view(&images.images, owner, ctx).map(EmbedView::Images)
            }
            Embed::External(_)
            | Embed::Record(_)
            | Embed::RecordWithMedia(_)
            | Embed::Unknown { .. } => {
                tracing::debug!("recordWithMedia without image media, no embed");
                None
            }
        },
        Embed::Unknown { embed_type } => {
            tracing::debug!(%embed_type, "no view for embed type");
            None
        }
    }
}

fn images_view(
    images: &[EmbeddedImage],
    owner: &str,
    ctx: &RenderContext<'_>,
) -> Option<ImagesView> {
    if images.is_empty() {
        return None;
    }
    let layout = if images.len() == 1 {
        GridLayout::Single
    } else {
        GridLayout::AutoFit
    };
    Some(ImagesView {
        layout,
        images: images
            .iter()
            .map(|image| ImageView {
                src: ctx.blob(owner, image.image.as_ref()),
                alt: image.alt.clone(),
                aspect_ratio: image.aspect_ratio.and_then(|ratio| ratio.css()),
            })
            .collect(),
    })
}

fn link_card(external: &ExternalLink, owner: &str, ctx: &RenderContext<'_>) -> LinkCardView {
    LinkCardView {
        uri: external.uri.clone(),
        title: external.title.clone().filter(|t| !t.trim().is_empty()),
        description: external.description.clone().filter(|d| !d.trim().is_empty()),
        domain: url::Url::parse(&external.uri)
            .ok()
            .and_then(|url| url.host_str().map(|host| host.trim_start_matches("www.").to_owned())),
        thumb: external
            .thumb
            .as_ref()
            .map(|blob| ctx.blob(owner, Some(blob))),
    }
}
