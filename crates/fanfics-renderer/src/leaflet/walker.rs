use super::types::{
    Block, BlockWrapper, CodeBlock, HeaderBlock, IframeBlock, ImageBlock, ListItem, MathBlock,
    TextBlock, WebsiteBlock,
};
use crate::bsky::render_post_reference;
use crate::config::MathMode;
use crate::facet::{render_segment, resolve_segments};
use crate::resolve::RenderContext;
use crate::view::{
    Alignment, BlockKind, BlockView, ImageView, Inline, ListItemView, ListView, MathView,
    WebsiteView,
};

const MIN_IFRAME_HEIGHT: u32 = 120;
const MAX_IFRAME_HEIGHT: u32 = 800;

/// Render a linear document's blocks in order.
///
/// `owner` is the DID of the repository the document lives in; image blobs
/// are resolved against it.
pub fn render_document(
    blocks: &[BlockWrapper],
    owner: &str,
    ctx: &RenderContext<'_>,
) -> Vec<BlockView> {
    let walker = BlockWalker { owner, ctx };
    blocks
        .iter()
        .enumerate()
        .filter_map(|(idx, wrapper)| walker.block(wrapper, idx == 0))
        .collect()
}

struct BlockWalker<'a> {
    owner: &'a str,
    ctx: &'a RenderContext<'a>,
}

impl BlockWalker<'_> {
    fn block(&self, wrapper: &BlockWrapper, first: bool) -> Option<BlockView> {
        let alignment = Alignment::parse(wrapper.alignment.as_deref());
        let kind = match &wrapper.block {
            Block::Text(text) => BlockKind::Paragraph(self.text(text, first)?),
            Block::Header(header) => self.header(header, first)?,
            Block::Blockquote(quote) => BlockKind::Blockquote(self.text(quote, first)?),
            Block::Image(image) => BlockKind::Image(self.image(image)),
            Block::UnorderedList(list) => BlockKind::List(self.list(&list.children, alignment, 0)),
            Block::Website(website) => BlockKind::Website(self.website(website)),
            Block::Iframe(iframe) => self.iframe(iframe),
            Block::Math(math) => BlockKind::Math(self.math(math)),
            Block::Code(code) => code_block(code),
            Block::HorizontalRule => BlockKind::Rule,
            Block::BskyPost(post) => {
                BlockKind::Post(render_post_reference(&post.post_ref.uri, self.ctx, 1))
            }
            Block::Unknown { block_type } => {
                tracing::warn!(%block_type, "unsupported leaflet block");
                BlockKind::Unsupported {
                    block_type: block_type.clone(),
                }
            }
        };
        Some(BlockView {
            alignment,
            first,
            kind,
        })
    }

    /// Faceted text, or `None` when the block is blank and unstyled and may
    /// collapse.
    fn text(&self, text: &TextBlock, keep_blank: bool) -> Option<Vec<Inline>> {
        let segments = resolve_segments(&text.plaintext, text.facets());
        let styled = segments.iter().any(|s| !s.features.is_empty());
        if !keep_blank && !styled && text.plaintext.trim().is_empty() {
            return None;
        }
        let config = self.ctx.config();
        Some(
            segments
                .iter()
                .flat_map(|segment| render_segment(segment, config))
                .collect(),
        )
    }

    fn header(&self, header: &HeaderBlock, keep_blank: bool) -> Option<BlockKind> {
        let level = header.level.unwrap_or(1).clamp(1, 6) as u8;
        let content = self.text(&header.text, keep_blank)?;
        Some(BlockKind::Heading { level, content })
    }

    fn image(&self, image: &ImageBlock) -> ImageView {
        ImageView {
            src: self.ctx.blob(self.owner, image.image.as_ref()),
            alt: image.alt.clone(),
            aspect_ratio: image.aspect_ratio.and_then(|ratio| ratio.css()),
        }
    }

    fn list(&self, items: &[ListItem], alignment: Alignment, depth: usize) -> ListView {
        ListView {
            alignment,
            items: items
                .iter()
                .map(|item| self.list_item(item, alignment, depth))
                .collect(),
        }
    }

    fn list_item(&self, item: &ListItem, alignment: Alignment, depth: usize) -> ListItemView {
        let children = match item.children.as_deref() {
            Some(children) if !children.is_empty() => {
                if depth + 1 > self.ctx.config().max_list_depth {
                    tracing::warn!(depth, dropped = children.len(), "list nested too deep");
                    None
                } else {
                    Some(self.list(children, alignment, depth + 1))
                }
            }
            _ => None,
        };
        ListItemView {
            content: self.list_content(&item.content),
            children,
        }
    }

    /// List items only carry inline blocks; anything else is shown as
    /// unsupported.
    fn list_content(&self, block: &Block) -> Option<BlockKind> {
        match block {
            Block::Text(text) => self.text(text, false).map(BlockKind::Paragraph),
            Block::Header(header) => self.header(header, false),
            Block::Blockquote(quote) => self.text(quote, false).map(BlockKind::Blockquote),
            Block::Image(image) => Some(BlockKind::Image(self.image(image))),
            Block::UnorderedList(_)
            | Block::Website(_)
            | Block::Iframe(_)
            | Block::Math(_)
            | Block::Code(_)
            | Block::HorizontalRule
            | Block::BskyPost(_)
            | Block::Unknown { .. } => {
                tracing::debug!(block_type = block.name(), "block not allowed in a list item");
                Some(BlockKind::Unsupported {
                    block_type: block.name().into(),
                })
            }
        }
    }

    fn website(&self, website: &WebsiteBlock) -> WebsiteView {
        WebsiteView {
            src: website.src.clone(),
            title: website.title.clone(),
            description: website.description.clone(),
            preview: website
                .preview_image
                .as_ref()
                .map(|blob| self.ctx.blob(self.owner, Some(blob))),
        }
    }

    fn iframe(&self, iframe: &IframeBlock) -> BlockKind {
        let height = iframe
            .height
            .map(|h| h.clamp(MIN_IFRAME_HEIGHT as i64, MAX_IFRAME_HEIGHT as i64) as u32)
            .unwrap_or(self.ctx.config().iframe_default_height)
            .clamp(MIN_IFRAME_HEIGHT, MAX_IFRAME_HEIGHT);
        BlockKind::Iframe {
            url: iframe.url.clone(),
            height,
        }
    }

    fn math(&self, math: &MathBlock) -> MathView {
        match self.ctx.config().math {
            MathMode::Preformatted => MathView::Tex(math.tex.clone()),
            MathMode::MathMl => mathml(&math.tex),
        }
    }
}

#[cfg(feature = "mathml")]
fn mathml(tex: &str) -> MathView {
    match crate::math::render_mathml(tex) {
        Ok(markup) => MathView::MathMl {
            tex: tex.to_owned(),
            markup,
        },
        Err(message) => {
            tracing::debug!(%message, "math block failed to parse");
            MathView::Invalid {
                tex: tex.to_owned(),
                message,
            }
        }
    }
}

#[cfg(not(feature = "mathml"))]
fn mathml(tex: &str) -> MathView {
    tracing::debug!("built without mathml support, keeping TeX source");
    MathView::Tex(tex.to_owned())
}

fn code_block(code: &CodeBlock) -> BlockKind {
    BlockKind::Code {
        text: code.plaintext.clone(),
        language: code
            .language
            .as_deref()
            .map(|lang| lang.trim().to_lowercase())
            .filter(|lang| !lang.is_empty()),
    }
}
