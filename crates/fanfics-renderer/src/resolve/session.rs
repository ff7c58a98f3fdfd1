use super::{RenderContext, Resolution, ResolutionSlot, Resource, ResourceKey, ResourceTable, Ticket};
use crate::bsky::{POST_COLLECTION, PostRecord, render_post};
use crate::client::{BlobResolver, HandleResolver, RecordFetcher, fetch_resource};
use crate::config::RenderConfig;
use crate::error::{RenderError, ResolveError};
use crate::leaflet::{DOCUMENT_COLLECTION, DocumentRecord, render_document_record};
use crate::types::RecordUri;
use crate::view::{DocumentView, PostView};
use std::sync::Arc;

/// A record the session knows how to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Document(Arc<DocumentRecord>),
    Post(Arc<PostRecord>),
}

impl Record {
    /// Decode a record `value` from `collection`.
    pub fn from_value(collection: &str, value: serde_json::Value) -> Result<Self, RenderError> {
        match collection {
            DOCUMENT_COLLECTION => {
                DocumentRecord::from_value(value).map(|doc| Record::Document(Arc::new(doc)))
            }
            POST_COLLECTION => PostRecord::from_value(value).map(|post| Record::Post(Arc::new(post))),
            other => Err(RenderError::UnsupportedCollection(other.to_string())),
        }
    }
}

/// What the subject currently looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectView {
    /// Nothing opened yet, or the subject record is still loading
    Loading,
    Failed(String),
    Document(DocumentView),
    Post(PostView),
}

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub view: SubjectView,
    /// References the view needed that have no state yet
    pub demand: Vec<ResourceKey>,
}

/// Owns the subject record and the resolution table across render passes.
///
/// Opening a new subject starts a new generation: the table is cleared and
/// tickets issued earlier stop being accepted.
#[derive(Debug, Default)]
pub struct RenderSession {
    config: RenderConfig,
    subject: ResolutionSlot<RecordUri, Record>,
    table: ResourceTable,
}

impl RenderSession {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.subject.generation()
    }

    pub fn table(&self) -> &ResourceTable {
        &self.table
    }

    fn parse_subject(uri: &str) -> Result<RecordUri, RenderError> {
        let parsed = RecordUri::parse(uri)?;
        match parsed.record() {
            Some((DOCUMENT_COLLECTION | POST_COLLECTION, _)) => Ok(parsed),
            Some((collection, _)) => Err(RenderError::UnsupportedCollection(collection.to_string())),
            None => Err(RenderError::InvalidUri(format!("{uri} does not name a record"))),
        }
    }

    /// Display a record the caller already has.
    pub fn show(&mut self, uri: &str, record: Record) -> Result<(), RenderError> {
        let parsed = Self::parse_subject(uri)?;
        self.subject.show(parsed, record);
        self.table.reset(self.subject.generation());
        Ok(())
    }

    /// Start displaying the record at `uri`. Returns a ticket for fetching
    /// it, or `None` when `uri` is already the subject.
    pub fn open(&mut self, uri: &str) -> Result<Option<Ticket<RecordUri>>, RenderError> {
        let parsed = Self::parse_subject(uri)?;
        let ticket = self.subject.watch(parsed);
        if ticket.is_some() {
            self.table.reset(self.subject.generation());
        }
        Ok(ticket)
    }

    /// Settle the subject fetch with the raw record value.
    pub fn settle_subject(
        &mut self,
        ticket: &Ticket<RecordUri>,
        result: Result<serde_json::Value, ResolveError>,
    ) -> bool {
        let collection = ticket.key.collection.as_deref().unwrap_or_default();
        let result = result.and_then(|value| {
            Record::from_value(collection, value)
                .map_err(|err| ResolveError::Malformed(format!("{}: {err}", ticket.key)))
        });
        self.subject.settle(ticket, result)
    }

    /// Build the current view from whatever state is available.
    pub fn render(&self) -> Rendered {
        let ctx = RenderContext::new(&self.config, &self.table);
        let uri = self.subject.key();
        let view = match self.subject.state() {
            Resolution::Pending => SubjectView::Loading,
            Resolution::Failed(reason) => SubjectView::Failed(reason.clone()),
            Resolution::Resolved(Record::Document(doc)) => {
                SubjectView::Document(render_document_record(doc, uri, &ctx))
            }
            Resolution::Resolved(Record::Post(post)) => {
                SubjectView::Post(render_post(post, uri, &ctx, 0, None))
            }
        };
        Rendered {
            view,
            demand: ctx.into_demand(),
        }
    }

    /// Mark references pending and get tickets for the ones not seen before.
    pub fn request(&mut self, keys: impl IntoIterator<Item = ResourceKey>) -> Vec<Ticket<ResourceKey>> {
        self.table.request(keys)
    }

    pub fn settle(
        &mut self,
        ticket: &Ticket<ResourceKey>,
        result: Result<Resource, ResolveError>,
    ) -> bool {
        self.table.settle(ticket, result)
    }

    /// Drive render → request → fetch → settle until the view stops asking
    /// for new references, then return the final render.
    ///
    /// Lookups within a round run concurrently. The number of rounds is
    /// bounded by the embed depth cap, since only newly resolved posts can
    /// introduce new references.
    pub async fn resolve_all<R>(&mut self, resolver: &R) -> Rendered
    where
        R: BlobResolver + RecordFetcher + HandleResolver,
    {
        if let Some(ticket) = self.subject.pending_ticket() {
            let result = match ticket.key.record() {
                Some((collection, rkey)) => {
                    resolver
                        .get_record(&ticket.key.authority, collection, rkey)
                        .await
                }
                None => Err(ResolveError::InvalidReference(ticket.key.to_string())),
            };
            self.settle_subject(&ticket, result);
        }

        let max_rounds = self.config.max_embed_depth + 2;
        for round in 0..max_rounds {
            let rendered = self.render();
            let tickets = self.request(rendered.demand.clone());
            if tickets.is_empty() {
                return rendered;
            }
            tracing::debug!(round, lookups = tickets.len(), "resolving references");
            let results = n0_future::join_all(tickets.into_iter().map(|ticket| async move {
                let result = fetch_resource(resolver, &ticket.key).await;
                (ticket, result)
            }))
            .await;
            for (ticket, result) in results {
                self.settle(&ticket, result);
            }
        }
        self.render()
    }
}
