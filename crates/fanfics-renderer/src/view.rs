//! Render-ready view trees.
//!
//! Views are plain data built fresh on every render pass. They carry the
//! resolution state of anything loaded asynchronously so the output layer can
//! show placeholders; see [`crate::html`] for serialization.

use crate::resolve::Resolution;
use smol_str::SmolStr;

/// Inline content produced from faceted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    /// Placeholder for an empty line, so it keeps its height
    Blank,
    /// Hard line break
    Break,
    Span {
        wrapper: Wrapper,
        children: Vec<Inline>,
    },
}

impl Inline {
    /// Text content with breaks as `\n` and blanks as a non-breaking space.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) => out.push_str(text),
            Inline::Blank => out.push('\u{a0}'),
            Inline::Break => out.push('\n'),
            Inline::Span { children, .. } => children.iter().for_each(|c| c.push_text(out)),
        }
    }
}

/// Markup wrapping one inline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wrapper {
    Link { href: String },
    Mention { href: String },
    Tag { href: String },
    Strong,
    Emphasis,
    Underline,
    Strikethrough,
    Code,
    Mark,
    Anchor { id: Option<SmolStr> },
    /// Unrecognised feature: a plain span
    Inert,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    #[default]
    Unset,
}

impl Alignment {
    /// Normalise a leaflet alignment token.
    ///
    /// Accepts bare values as well as lexicon refs such as
    /// `lex:pub.leaflet.pages.linearDocument#textAlignCenter`.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Unset;
        };
        let token = raw.rsplit(['#', ':']).next().unwrap_or(raw);
        match token {
            "textAlignLeft" | "left" => Self::Left,
            "textAlignCenter" | "center" => Self::Center,
            "textAlignRight" | "right" => Self::Right,
            "textAlignJustify" | "justify" => Self::Justify,
            _ => Self::Unset,
        }
    }

    pub fn class(&self) -> Option<&'static str> {
        match self {
            Self::Left => Some("align-left"),
            Self::Center => Some("align-center"),
            Self::Right => Some("align-right"),
            Self::Justify => Some("align-justify"),
            Self::Unset => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockView {
    pub alignment: Alignment,
    /// First block of its document; rendered without top margin
    pub first: bool,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph(Vec<Inline>),
    Heading { level: u8, content: Vec<Inline> },
    Blockquote(Vec<Inline>),
    Image(ImageView),
    List(ListView),
    Website(WebsiteView),
    Iframe { url: String, height: u32 },
    Math(MathView),
    Code { text: String, language: Option<String> },
    Rule,
    Post(QuotedPost),
    Unsupported { block_type: SmolStr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    pub src: Resolution<String>,
    pub alt: Option<String>,
    pub aspect_ratio: Option<String>,
}

impl ImageView {
    /// Alt text worth showing as a caption.
    pub fn caption(&self) -> Option<&str> {
        self.alt.as_deref().map(str::trim).filter(|alt| !alt.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub alignment: Alignment,
    pub items: Vec<ListItemView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemView {
    /// `None` when the item's text collapsed to nothing
    pub content: Option<BlockKind>,
    pub children: Option<ListView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsiteView {
    pub src: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub preview: Option<Resolution<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathView {
    Tex(String),
    MathMl { tex: String, markup: String },
    Invalid { tex: String, message: String },
}

/// A post shown inside another view: a leaflet `bskyPost` block or a quote
/// embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotedPost {
    /// Unparsable reference, or nesting too deep to follow
    Unavailable,
    Loading,
    Failed,
    Post(Box<PostView>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedView {
    Images(ImagesView),
    External(LinkCardView),
    Quote(QuotedPost),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridLayout {
    Single,
    AutoFit,
}

impl GridLayout {
    pub fn columns(&self) -> &'static str {
        match self {
            GridLayout::Single => "1fr",
            GridLayout::AutoFit => "repeat(auto-fit, minmax(220px, 1fr))",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagesView {
    pub layout: GridLayout,
    pub images: Vec<ImageView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCardView {
    pub uri: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub thumb: Option<Resolution<String>>,
}

/// A human readable timestamp with the raw value kept for `datetime`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    pub raw: String,
    pub display: String,
}

impl Timestamp {
    /// Format an RFC 3339 timestamp; unparsable input is displayed verbatim.
    pub fn parse(raw: &str) -> Self {
        let display = chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.format("%B %-d, %Y at %-I:%M %p").to_string())
            .unwrap_or_else(|_| raw.to_owned());
        Self {
            raw: raw.to_owned(),
            display,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyLabel {
    pub href: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub created_at: Option<Timestamp>,
    /// Author label shown on quoted posts
    pub author: Option<String>,
    pub body: Vec<Inline>,
    pub embed: Option<EmbedView>,
    pub reply: Option<ReplyLabel>,
    pub web_url: Option<String>,
    pub quoted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    pub title: String,
    pub published_at: Option<Timestamp>,
    pub pages: Vec<Vec<BlockView>>,
    pub canonical_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_tokens() {
        assert_eq!(Alignment::parse(None), Alignment::Unset);
        assert_eq!(Alignment::parse(Some("center")), Alignment::Center);
        assert_eq!(
            Alignment::parse(Some("lex:pub.leaflet.pages.linearDocument#textAlignRight")),
            Alignment::Right
        );
        assert_eq!(
            Alignment::parse(Some("#textAlignJustify")),
            Alignment::Justify
        );
        assert_eq!(Alignment::parse(Some("lex:textAlignLeft")), Alignment::Left);
        assert_eq!(Alignment::parse(Some("diagonal")), Alignment::Unset);
    }

    #[test]
    fn timestamps() {
        let stamp = Timestamp::parse("2024-05-01T12:00:00.000Z");
        assert_eq!(stamp.display, "May 1, 2024 at 12:00 PM");
        assert_eq!(stamp.raw, "2024-05-01T12:00:00.000Z");
        assert_eq!(Timestamp::parse("last tuesday").display, "last tuesday");
    }

    #[test]
    fn plain_text_flattens_spans() {
        let node = Inline::Span {
            wrapper: Wrapper::Strong,
            children: vec![
                Inline::Text("a".into()),
                Inline::Break,
                Inline::Blank,
            ],
        };
        assert_eq!(node.plain_text(), "a\n\u{a0}");
    }
}
