use miette::Diagnostic;
use thiserror::Error;

/// Errors raised at the rendering entry points, before any view is built.
#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    #[error("record is not a valid {collection}")]
    #[diagnostic(
        code(fanfics::render::invalid_record),
        help("the record producer violated the lexicon, e.g. a text block without plaintext")
    )]
    InvalidRecord {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid AT URI: {0}")]
    #[diagnostic(code(fanfics::render::invalid_uri))]
    InvalidUri(String),

    #[error("cannot render records from collection {0}")]
    #[diagnostic(
        code(fanfics::render::unsupported_collection),
        help("only pub.leaflet.document and app.bsky.feed.post records can be rendered")
    )]
    UnsupportedCollection(String),
}

/// Failures reported by the async collaborators (blob, record and handle lookups).
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("not found: {0}")]
    #[diagnostic(code(fanfics::resolve::not_found))]
    NotFound(String),

    #[error("invalid reference: {0}")]
    #[diagnostic(code(fanfics::resolve::invalid_reference))]
    InvalidReference(String),

    #[error("failed to fetch {what}")]
    #[diagnostic(code(fanfics::resolve::fetch))]
    Fetch {
        what: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("malformed response: {0}")]
    #[diagnostic(code(fanfics::resolve::malformed))]
    Malformed(String),
}
