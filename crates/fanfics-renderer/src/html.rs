//! HTML serialization of view trees.

use crate::resolve::{Resolution, SubjectView};
use crate::view::{
    BlockKind, BlockView, DocumentView, EmbedView, ImageView, ImagesView, Inline, LinkCardView,
    ListView, MathView, PostView, QuotedPost, Timestamp, WebsiteView, Wrapper,
};
use markdown_weaver_escape::{escape_href, escape_html};
use std::fmt::Write;

const NEW_TAB: &str = r#" target="_blank" rel="noopener noreferrer""#;

pub trait ToHtml {
    fn write_html(&self, html: &mut String);

    fn to_html(&self) -> String {
        let mut html = String::new();
        self.write_html(&mut html);
        html
    }
}

fn text(html: &mut String, s: &str) {
    let _ = escape_html(&mut *html, s);
}

fn href(html: &mut String, url: &str) {
    html.push_str(" href=\"");
    let _ = escape_href(&mut *html, url);
    html.push('"');
}

fn attr(html: &mut String, name: &str, value: &str) {
    let _ = write!(html, " {name}=\"");
    let _ = escape_html(&mut *html, value);
    html.push('"');
}

impl ToHtml for Inline {
    fn write_html(&self, html: &mut String) {
        match self {
            Inline::Text(s) => text(html, s),
            Inline::Blank => html.push_str("&nbsp;"),
            Inline::Break => html.push_str("<br />"),
            Inline::Span { wrapper, children } => {
                let close = open_wrapper(html, wrapper);
                children.write_html(html);
                html.push_str(close);
            }
        }
    }
}

/// Write the opening tag and return the matching closing tag.
fn open_wrapper(html: &mut String, wrapper: &Wrapper) -> &'static str {
    match wrapper {
        Wrapper::Link { href: url } => {
            html.push_str("<a");
            href(html, url);
            html.push_str(NEW_TAB);
            html.push('>');
            "</a>"
        }
        Wrapper::Mention { href: url } => {
            html.push_str("<a class=\"mention\"");
            href(html, url);
            html.push_str(NEW_TAB);
            html.push('>');
            "</a>"
        }
        Wrapper::Tag { href: url } => {
            html.push_str("<a class=\"hashtag\"");
            href(html, url);
            html.push_str(NEW_TAB);
            html.push('>');
            "</a>"
        }
        Wrapper::Strong => {
            html.push_str("<strong>");
            "</strong>"
        }
        Wrapper::Emphasis => {
            html.push_str("<em>");
            "</em>"
        }
        Wrapper::Underline => {
            html.push_str("<span style=\"text-decoration: underline\">");
            "</span>"
        }
        Wrapper::Strikethrough => {
            html.push_str("<span style=\"text-decoration: line-through\">");
            "</span>"
        }
        Wrapper::Code => {
            html.push_str("<code>");
            "</code>"
        }
        Wrapper::Mark => {
            html.push_str("<mark>");
            "</mark>"
        }
        Wrapper::Anchor { id: Some(id) } => {
            html.push_str("<span");
            attr(html, "id", id);
            html.push('>');
            "</span>"
        }
        Wrapper::Anchor { id: None } | Wrapper::Inert => {
            html.push_str("<span>");
            "</span>"
        }
    }
}

impl ToHtml for [Inline] {
    fn write_html(&self, html: &mut String) {
        self.iter().for_each(|node| node.write_html(html));
    }
}

impl ToHtml for Vec<Inline> {
    fn write_html(&self, html: &mut String) {
        self.as_slice().write_html(html);
    }
}

/// ` class="base align-x"` plus the first-block margin override.
fn block_attrs(html: &mut String, base: &str, block: &BlockView) {
    html.push_str(" class=\"");
    html.push_str(base);
    if let Some(class) = block.alignment.class() {
        html.push(' ');
        html.push_str(class);
    }
    html.push('"');
    if block.first {
        html.push_str(" style=\"margin-top: 0\"");
    }
}

impl ToHtml for BlockView {
    fn write_html(&self, html: &mut String) {
        match &self.kind {
            BlockKind::Paragraph(content) => {
                html.push_str("<p");
                block_attrs(html, "leaflet-text", self);
                html.push('>');
                content.write_html(html);
                html.push_str("</p>\n");
            }
            BlockKind::Heading { level, content } => {
                let _ = write!(html, "<h{level}");
                block_attrs(html, "leaflet-header", self);
                html.push('>');
                content.write_html(html);
                let _ = writeln!(html, "</h{level}>");
            }
            BlockKind::Blockquote(content) => {
                html.push_str("<blockquote");
                block_attrs(html, "leaflet-blockquote", self);
                html.push('>');
                content.write_html(html);
                html.push_str("</blockquote>\n");
            }
            BlockKind::Image(image) => {
                html.push_str("<figure");
                block_attrs(html, "leaflet-image", self);
                html.push('>');
                write_image(html, image, "Image unavailable", "");
                write_caption(html, image);
                html.push_str("</figure>\n");
            }
            BlockKind::List(list) => write_list(html, list, self.first),
            BlockKind::Website(website) => {
                html.push_str("<a");
                block_attrs(html, "embed-external", self);
                href(html, &website.src);
                html.push_str(NEW_TAB);
                html.push('>');
                write_website(html, website);
                html.push_str("</a>\n");
            }
            BlockKind::Iframe { url, height } => {
                html.push_str("<div");
                block_attrs(html, "leaflet-iframe", self);
                html.push_str("><iframe");
                attr(html, "src", url);
                attr(html, "title", url);
                let _ = write!(
                    html,
                    " height=\"{height}\" loading=\"lazy\" allowfullscreen></iframe></div>"
                );
                html.push('\n');
            }
            BlockKind::Math(math) => match math {
                MathView::Tex(tex) => {
                    html.push_str("<pre");
                    block_attrs(html, "leaflet-math", self);
                    html.push('>');
                    text(html, tex);
                    html.push_str("</pre>\n");
                }
                MathView::MathMl { markup, .. } => {
                    html.push_str("<div");
                    block_attrs(html, "math-display", self);
                    html.push('>');
                    html.push_str(markup);
                    html.push_str("</div>\n");
                }
                MathView::Invalid { tex, message } => {
                    html.push_str("<pre");
                    block_attrs(html, "leaflet-math math-error", self);
                    attr(html, "title", message);
                    html.push('>');
                    text(html, tex);
                    html.push_str("</pre>\n");
                }
            },
            BlockKind::Code { text: code, language } => {
                html.push_str("<pre");
                block_attrs(html, "leaflet-code", self);
                html.push_str("><code");
                if let Some(language) = language {
                    attr(html, "class", &format!("language-{language}"));
                }
                html.push('>');
                text(html, code);
                html.push_str("</code></pre>\n");
            }
            BlockKind::Rule => {
                html.push_str("<hr");
                if self.alignment.class().is_some() {
                    html.push_str(" style=\"margin-left: auto; margin-right: auto\"");
                }
                html.push_str(" />\n");
            }
            BlockKind::Post(quoted) => {
                html.push_str("<div");
                block_attrs(html, "leaflet-post", self);
                html.push('>');
                quoted.write_html(html);
                html.push_str("</div>\n");
            }
            BlockKind::Unsupported { block_type } => {
                html.push_str("<div");
                block_attrs(html, "leaflet-unsupported", self);
                attr(html, "data-block-type", block_type);
                html.push_str("></div>\n");
            }
        }
    }
}

impl ToHtml for [BlockView] {
    fn write_html(&self, html: &mut String) {
        self.iter().for_each(|block| block.write_html(html));
    }
}

impl ToHtml for Vec<BlockView> {
    fn write_html(&self, html: &mut String) {
        self.as_slice().write_html(html);
    }
}

/// List item content uses the same markup as the standalone block, minus
/// alignment and margin handling.
fn write_list_content(html: &mut String, kind: &BlockKind) {
    match kind {
        BlockKind::Paragraph(content) => {
            html.push_str("<p>");
            content.write_html(html);
            html.push_str("</p>");
        }
        BlockKind::Heading { level, content } => {
            let _ = write!(html, "<h{level}>");
            content.write_html(html);
            let _ = write!(html, "</h{level}>");
        }
        BlockKind::Blockquote(content) => {
            html.push_str("<blockquote>");
            content.write_html(html);
            html.push_str("</blockquote>");
        }
        BlockKind::Image(image) => {
            html.push_str("<figure class=\"leaflet-image\">");
            write_image(html, image, "Image unavailable", "");
            write_caption(html, image);
            html.push_str("</figure>");
        }
        BlockKind::Unsupported { block_type } => {
            html.push_str("<span class=\"leaflet-unsupported\"");
            attr(html, "data-block-type", block_type);
            html.push_str("></span>");
        }
        BlockKind::List(_)
        | BlockKind::Website(_)
        | BlockKind::Iframe { .. }
        | BlockKind::Math(_)
        | BlockKind::Code { .. }
        | BlockKind::Rule
        | BlockKind::Post(_) => {}
    }
}

fn write_list(html: &mut String, list: &ListView, first: bool) {
    html.push_str("<ul class=\"leaflet-list");
    if let Some(class) = list.alignment.class() {
        html.push(' ');
        html.push_str(class);
    }
    html.push('"');
    if first {
        html.push_str(" style=\"margin-top: 0\"");
    }
    html.push_str(">\n");
    for item in &list.items {
        html.push_str("<li><div>");
        if let Some(content) = &item.content {
            write_list_content(html, content);
        }
        html.push_str("</div>");
        if let Some(children) = &item.children {
            html.push('\n');
            write_list(html, children, false);
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n");
}

fn write_caption(html: &mut String, image: &ImageView) {
    if let Some(caption) = image.caption() {
        html.push_str("<figcaption>");
        text(html, caption);
        html.push_str("</figcaption>");
    }
}

/// `fallback_alt` stands in for missing or blank alt text.
fn write_image(html: &mut String, image: &ImageView, failed_label: &str, fallback_alt: &str) {
    html.push_str("<div class=\"image-frame\"");
    if let Some(ratio) = &image.aspect_ratio {
        attr(html, "style", &format!("aspect-ratio: {ratio}"));
    }
    html.push('>');
    match &image.src {
        Resolution::Resolved(src) => {
            html.push_str("<img");
            attr(html, "src", src);
            attr(html, "alt", image.caption().unwrap_or(fallback_alt));
            html.push_str(" loading=\"lazy\" />");
        }
        Resolution::Pending => {
            html.push_str("<div class=\"placeholder loading\" aria-busy=\"true\">Loading image…</div>");
        }
        Resolution::Failed(_) => {
            html.push_str("<div class=\"placeholder unavailable\">");
            text(html, failed_label);
            html.push_str("</div>");
        }
    }
    html.push_str("</div>");
}

fn write_website(html: &mut String, website: &WebsiteView) {
    match &website.preview {
        Some(Resolution::Resolved(src)) => {
            html.push_str("<img class=\"embed-external-thumb\"");
            attr(html, "src", src);
            attr(
                html,
                "alt",
                website.title.as_deref().unwrap_or("Website preview"),
            );
            html.push_str(" />");
        }
        Some(Resolution::Pending) => {
            html.push_str("<span class=\"placeholder loading\">Loading preview…</span>");
        }
        Some(Resolution::Failed(_)) | None => {}
    }
    html.push_str("<span class=\"embed-external-info\">");
    if let Some(title) = &website.title {
        html.push_str("<strong class=\"embed-external-title\">");
        text(html, title);
        html.push_str("</strong>");
    }
    if let Some(description) = &website.description {
        html.push_str("<span class=\"embed-external-description\">");
        text(html, description);
        html.push_str("</span>");
    }
    html.push_str("<span class=\"embed-external-url\">");
    text(html, &website.src);
    html.push_str("</span></span>");
}

impl ToHtml for QuotedPost {
    fn write_html(&self, html: &mut String) {
        match self {
            QuotedPost::Unavailable => {
                html.push_str("<div class=\"embed-unavailable\">Referenced post unavailable</div>")
            }
            QuotedPost::Loading => html.push_str(
                "<div class=\"placeholder loading\" aria-busy=\"true\">Loading post…</div>",
            ),
            QuotedPost::Failed => {
                html.push_str("<div class=\"embed-error\">Could not load post</div>")
            }
            QuotedPost::Post(post) => {
                html.push_str("<figure class=\"embed embed-quote\">");
                post.write_html(html);
                html.push_str("</figure>");
            }
        }
    }
}

impl ToHtml for EmbedView {
    fn write_html(&self, html: &mut String) {
        match self {
            EmbedView::Images(images) => write_images(html, images),
            EmbedView::External(card) => write_link_card(html, card),
            EmbedView::Quote(quoted) => quoted.write_html(html),
        }
    }
}

fn write_images(html: &mut String, images: &ImagesView) {
    html.push_str("<div class=\"embed-images\"");
    attr(
        html,
        "style",
        &format!("grid-template-columns: {}", images.layout.columns()),
    );
    html.push('>');
    for image in &images.images {
        html.push_str("<figure class=\"embed\">");
        write_image(html, image, "Image failed to load", "Bluesky attachment");
        if let Some(description) = image.caption() {
            html.push_str("<details class=\"embed-description\"><summary>Image description</summary>");
            text(html, description);
            html.push_str("</details>");
        }
        html.push_str("</figure>");
    }
    html.push_str("</div>");
}

fn write_link_card(html: &mut String, card: &LinkCardView) {
    html.push_str("<figure class=\"embed embed-link\"><a class=\"embed-external\"");
    href(html, &card.uri);
    html.push_str(NEW_TAB);
    html.push('>');
    match &card.thumb {
        Some(Resolution::Resolved(src)) => {
            html.push_str("<img class=\"embed-external-thumb\"");
            attr(html, "src", src);
            attr(
                html,
                "alt",
                card.title.as_deref().unwrap_or("Bluesky attachment"),
            );
            html.push_str(" />");
        }
        Some(Resolution::Pending) => {
            html.push_str("<span class=\"placeholder loading\">Loading preview…</span>");
        }
        Some(Resolution::Failed(_)) | None => {}
    }
    html.push_str("<span class=\"embed-external-info\">");
    if let Some(title) = &card.title {
        html.push_str("<strong class=\"embed-external-title\">");
        text(html, title);
        html.push_str("</strong>");
    }
    if let Some(description) = &card.description {
        html.push_str("<span class=\"embed-external-description\">");
        text(html, description);
        html.push_str("</span>");
    }
    html.push_str("<span class=\"embed-external-url\">");
    text(html, card.domain.as_deref().unwrap_or(&card.uri));
    html.push_str("</span></span></a></figure>");
}

fn write_time(html: &mut String, stamp: &Timestamp) {
    html.push_str("<time");
    attr(html, "datetime", &stamp.raw);
    html.push_str(">Originally posted on ");
    text(html, &stamp.display);
    html.push_str("</time>");
}

impl ToHtml for PostView {
    fn write_html(&self, html: &mut String) {
        html.push_str(if self.quoted {
            "<article class=\"bsky bsky-quoted\">"
        } else {
            "<article class=\"bsky\">"
        });
        if self.created_at.is_some() || self.author.is_some() {
            html.push_str("<header>");
            if let Some(author) = &self.author {
                html.push_str("<span class=\"embed-author-handle\">");
                text(html, author);
                html.push_str("</span>");
            }
            if let Some(stamp) = &self.created_at {
                write_time(html, stamp);
            }
            html.push_str("</header>");
        }
        html.push_str("<p>");
        self.body.write_html(html);
        html.push_str("</p>");
        if let Some(embed) = &self.embed {
            embed.write_html(html);
        }
        if !self.quoted && (self.reply.is_some() || self.web_url.is_some()) {
            html.push_str("<footer>");
            if let Some(reply) = &self.reply {
                html.push_str("<span>Replying to <a");
                href(html, &reply.href);
                html.push_str(NEW_TAB);
                html.push('>');
                text(html, &reply.label);
                html.push_str("</a></span>");
            }
            if let Some(url) = &self.web_url {
                html.push_str("<a");
                href(html, url);
                html.push_str(NEW_TAB);
                html.push_str(">View on Bluesky</a>");
            }
            html.push_str("</footer>");
        }
        html.push_str("</article>");
    }
}

impl ToHtml for DocumentView {
    fn write_html(&self, html: &mut String) {
        html.push_str("<article class=\"leaflet\">\n<header><h1>");
        text(html, &self.title);
        html.push_str("</h1>");
        if let Some(stamp) = &self.published_at {
            write_time(html, stamp);
        }
        html.push_str("</header>\n");
        for page in &self.pages {
            html.push_str("<div class=\"leaflet-page\">\n");
            page.write_html(html);
            html.push_str("</div>\n");
        }
        if let Some(url) = &self.canonical_url {
            html.push_str("<footer><a");
            href(html, url);
            html.push_str(NEW_TAB);
            html.push_str(">View on Leaflet.pub</a></footer>\n");
        }
        html.push_str("</article>\n");
    }
}

impl ToHtml for SubjectView {
    fn write_html(&self, html: &mut String) {
        match self {
            SubjectView::Loading => {
                html.push_str("<div class=\"placeholder loading\" aria-busy=\"true\"></div>")
            }
            SubjectView::Failed(_) => html.push_str("<div class=\"error\">Could not load post!</div>"),
            SubjectView::Document(document) => document.write_html(html),
            SubjectView::Post(post) => post.write_html(html),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Alignment, GridLayout};

    fn block(kind: BlockKind) -> BlockView {
        BlockView {
            alignment: Alignment::Unset,
            first: false,
            kind,
        }
    }

    #[test]
    fn first_block_has_no_top_margin() {
        let view = BlockView {
            alignment: Alignment::Center,
            first: true,
            kind: BlockKind::Paragraph(vec![Inline::Text("hi".into())]),
        };
        insta::assert_snapshot!(
            view.to_html().trim_end(),
            @r#"<p class="leaflet-text align-center" style="margin-top: 0">hi</p>"#
        );
    }

    #[test]
    fn code_block_language_hint() {
        let view = block(BlockKind::Code {
            text: "fn main() {}".into(),
            language: Some("rust".into()),
        });
        insta::assert_snapshot!(
            view.to_html().trim_end(),
            @r#"<pre class="leaflet-code"><code class="language-rust">fn main() {}</code></pre>"#
        );
    }

    #[test]
    fn rule_alignment_only_sets_margins() {
        let view = BlockView {
            alignment: Alignment::Right,
            first: false,
            kind: BlockKind::Rule,
        };
        assert_eq!(
            view.to_html(),
            "<hr style=\"margin-left: auto; margin-right: auto\" />\n"
        );
        assert_eq!(block(BlockKind::Rule).to_html(), "<hr />\n");
    }

    #[test]
    fn image_placeholders() {
        let pending = block(BlockKind::Image(ImageView {
            src: Resolution::Pending,
            alt: None,
            aspect_ratio: None,
        }));
        assert!(pending.to_html().contains("Loading image…"));

        let failed = block(BlockKind::Image(ImageView {
            src: Resolution::Failed("not found".into()),
            alt: Some("  a cat  ".into()),
            aspect_ratio: Some("4 / 3".into()),
        }));
        let html = failed.to_html();
        assert!(html.contains("Image unavailable"));
        assert!(html.contains("<figcaption>a cat</figcaption>"));
        assert!(html.contains(r#"style="aspect-ratio: 4 / 3""#));
    }

    #[test]
    fn images_grid_columns() {
        let images = EmbedView::Images(ImagesView {
            layout: GridLayout::AutoFit,
            images: vec![],
        });
        assert!(
            images
                .to_html()
                .contains("grid-template-columns: repeat(auto-fit, minmax(220px, 1fr))")
        );
    }

    #[test]
    fn quoted_post_states() {
        assert_eq!(
            QuotedPost::Unavailable.to_html(),
            "<div class=\"embed-unavailable\">Referenced post unavailable</div>"
        );
        assert_eq!(
            QuotedPost::Failed.to_html(),
            "<div class=\"embed-error\">Could not load post</div>"
        );
    }

    #[test]
    fn attributes_are_escaped() {
        let view = block(BlockKind::Iframe {
            url: "https://x.example/?a=1&b=\"2\"".into(),
            height: 400,
        });
        let html = view.to_html();
        assert!(html.contains("&amp;b=&quot;2&quot;"));
        assert!(html.contains("height=\"400\""));
    }
}
