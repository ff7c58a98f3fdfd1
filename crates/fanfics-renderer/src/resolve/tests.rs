//! Tests for resolution state and the render session

use super::*;
use crate::client::StaticResolver;
use crate::config::RenderConfig;
use crate::error::{RenderError, ResolveError};
use crate::html::ToHtml;
use crate::types::RecordUri;
use crate::view::{BlockKind, QuotedPost};
use serde_json::json;

const DOC_URI: &str = "at://did:plc:author/pub.leaflet.document/3kdoc";
const POST_URI: &str = "at://did:plc:author/app.bsky.feed.post/3kpost";

fn uri(s: &str) -> RecordUri {
    RecordUri::parse(s).unwrap()
}

fn handle_key(did: &str) -> ResourceKey {
    ResourceKey::Handle { did: did.into() }
}

fn document() -> serde_json::Value {
    json!({
        "$type": "pub.leaflet.document",
        "title": "Chapter 2",
        "publishedAt": "2024-03-09T18:30:00Z",
        "pages": [{
            "$type": "pub.leaflet.pages.linearDocument",
            "blocks": [
                { "block": { "$type": "pub.leaflet.blocks.text", "plaintext": "Later that night." } },
                { "block": {
                    "$type": "pub.leaflet.blocks.image",
                    "image": { "$type": "blob", "ref": { "$link": "bafkimg" }, "mimeType": "image/png", "size": 3 },
                    "alt": "the harbour"
                } },
                { "block": {
                    "$type": "pub.leaflet.blocks.bskyPost",
                    "postRef": { "uri": "at://did:plc:bob/app.bsky.feed.post/3kbob", "cid": "bafyb" }
                } }
            ]
        }]
    })
}

fn bob_post() -> serde_json::Value {
    json!({
        "text": "fan art incoming",
        "createdAt": "2024-03-08T10:00:00Z",
        "embed": {
            "$type": "app.bsky.embed.record",
            "record": { "uri": "at://did:plc:carol/app.bsky.feed.post/3kgone", "cid": "bafyc" }
        }
    })
}

// =============================================================================
// ResolutionSlot
// =============================================================================

#[test]
fn test_slot_watch_same_key_is_noop() {
    let mut slot: ResolutionSlot<&str, u32> = ResolutionSlot::new();
    let ticket = slot.watch("a").unwrap();
    assert_eq!(ticket.generation, 1);
    assert!(slot.watch("a").is_none());
    assert_eq!(slot.generation(), 1);
    assert!(slot.state().is_pending());
}

#[test]
fn test_slot_discards_stale_ticket() {
    let mut slot: ResolutionSlot<&str, u32> = ResolutionSlot::new();
    let first = slot.watch("a").unwrap();
    let second = slot.watch("b").unwrap();

    assert!(!slot.settle(&first, Ok(1)));
    assert!(slot.state().is_pending());

    assert!(slot.settle(&second, Ok(2)));
    assert_eq!(slot.state(), &Resolution::Resolved(2));

    // Settled state is terminal for the generation
    assert!(!slot.settle(&second, Ok(3)));
    assert_eq!(slot.state(), &Resolution::Resolved(2));
}

#[test]
fn test_slot_failure_and_rewatch() {
    let mut slot: ResolutionSlot<&str, u32> = ResolutionSlot::new();
    let ticket = slot.watch("a").unwrap();
    assert!(slot.settle(&ticket, Err(ResolveError::NotFound("a".into()))));
    assert_eq!(slot.state(), &Resolution::Failed("not found: a".into()));
    assert!(slot.pending_ticket().is_none());

    // Coming back to a key starts over
    slot.watch("b");
    let again = slot.watch("a").unwrap();
    assert_eq!(again.generation, 3);
    assert_eq!(slot.pending_ticket(), Some(again));
}

#[test]
fn test_slot_show_resolves_immediately() {
    let mut slot: ResolutionSlot<&str, u32> = ResolutionSlot::new();
    let ticket = slot.watch("a").unwrap();
    slot.show("a", 7);
    assert_eq!(slot.state(), &Resolution::Resolved(7));
    assert!(!slot.settle(&ticket, Ok(8)));
}

// =============================================================================
// ResourceTable
// =============================================================================

#[test]
fn test_table_requests_each_key_once() {
    let mut table = ResourceTable::default();
    let tickets = table.request([handle_key("did:plc:a"), handle_key("did:plc:b")]);
    assert_eq!(tickets.len(), 2);

    let again = table.request([handle_key("did:plc:a"), handle_key("did:plc:c")]);
    assert_eq!(again.len(), 1);
    assert_eq!(again[0].key, handle_key("did:plc:c"));
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(&handle_key("did:plc:a")), Some(&Resolution::Pending));
}

#[test]
fn test_table_rejects_old_generation() {
    let mut table = ResourceTable::default();
    let tickets = table.request([handle_key("did:plc:a")]);
    table.reset(1);
    assert!(table.is_empty());
    assert!(!table.settle(&tickets[0], Ok(Resource::Handle("a.example".into()))));
    assert!(table.is_empty());

    let fresh = table.request([handle_key("did:plc:a")]);
    assert_eq!(fresh[0].generation, 1);
    assert!(table.settle(&fresh[0], Ok(Resource::Handle("a.example".into()))));
    assert!(!table.settle(&fresh[0], Ok(Resource::Handle("b.example".into()))));
    assert_eq!(
        table.get(&handle_key("did:plc:a")),
        Some(&Resolution::Resolved(Resource::Handle("a.example".into())))
    );
}

#[test]
fn test_context_records_demand_once() {
    let config = RenderConfig::default();
    let table = ResourceTable::default();
    let ctx = RenderContext::new(&config, &table);
    assert!(ctx.handle("did:plc:a").is_pending());
    assert!(ctx.handle("did:plc:a").is_pending());
    assert!(ctx.post("did:plc:a", "3k").is_pending());
    assert_eq!(
        ctx.blob("did:plc:a", None),
        Resolution::Failed("missing blob reference".into())
    );
    assert_eq!(
        ctx.into_demand(),
        vec![
            handle_key("did:plc:a"),
            ResourceKey::Post {
                repo: "did:plc:a".into(),
                rkey: "3k".into()
            },
        ]
    );
}

// =============================================================================
// RenderSession
// =============================================================================

#[test]
fn test_session_starts_loading() {
    let session = RenderSession::default();
    let rendered = session.render();
    assert_eq!(rendered.view, SubjectView::Loading);
    assert!(rendered.demand.is_empty());
}

#[test]
fn test_open_rejects_other_collections() {
    let mut session = RenderSession::default();
    let err = session
        .open("at://did:plc:author/app.bsky.graph.follow/3k")
        .unwrap_err();
    assert!(matches!(err, RenderError::UnsupportedCollection(c) if c == "app.bsky.graph.follow"));

    let err = session.open("at://did:plc:author").unwrap_err();
    assert!(matches!(err, RenderError::InvalidUri(_)));

    let record = Record::Post(std::sync::Arc::new(
        crate::bsky::PostRecord::from_value(json!({ "text": "hi" })).unwrap(),
    ));
    assert!(session.show("at://did:plc:author/pub.leaflet.publication/3k", record).is_err());
    assert_eq!(session.generation(), 0);
}

#[test]
fn test_open_same_uri_keeps_ticket() {
    let mut session = RenderSession::default();
    let ticket = session.open(DOC_URI).unwrap().unwrap();
    assert_eq!(ticket.key, uri(DOC_URI));
    assert!(session.open(DOC_URI).unwrap().is_none());
    assert_eq!(session.generation(), 1);
}

#[test]
fn test_reopen_discards_late_results() {
    let mut session = RenderSession::default();
    let first = session.open(DOC_URI).unwrap().unwrap();
    let second = session.open(POST_URI).unwrap().unwrap();

    assert!(!session.settle_subject(&first, Ok(document())));
    assert_eq!(session.render().view, SubjectView::Loading);

    assert!(session.settle_subject(&second, Ok(json!({ "text": "the post" }))));
    let SubjectView::Post(view) = session.render().view else {
        panic!("expected post view");
    };
    assert_eq!(view.body[0].plain_text(), "the post");
}

#[test]
fn test_reopen_discards_resource_tickets() {
    let mut session = RenderSession::default();
    session.open(DOC_URI).unwrap();
    let tickets = session.request([handle_key("did:plc:a")]);
    session.open(POST_URI).unwrap();
    assert!(session.table().is_empty());
    assert!(!session.settle(&tickets[0], Ok(Resource::Handle("a.example".into()))));
}

#[test]
fn test_malformed_subject_fails() {
    let mut session = RenderSession::default();
    let ticket = session.open(POST_URI).unwrap().unwrap();
    assert!(session.settle_subject(&ticket, Ok(json!({ "createdAt": "2024-01-01T00:00:00Z" }))));
    let SubjectView::Failed(reason) = session.render().view else {
        panic!("expected failure");
    };
    assert!(reason.starts_with("malformed response: at://did:plc:author/app.bsky.feed.post/3kpost"));
}

#[test]
fn test_show_renders_without_fetching() {
    let mut session = RenderSession::default();
    let record = Record::from_value("pub.leaflet.document", document()).unwrap();
    session.show(DOC_URI, record).unwrap();
    let rendered = session.render();
    let SubjectView::Document(view) = &rendered.view else {
        panic!("expected document");
    };
    assert_eq!(view.title, "Chapter 2");
    assert_eq!(
        rendered.demand,
        vec![
            ResourceKey::Blob {
                owner: "did:plc:author".into(),
                cid: "bafkimg".into()
            },
            ResourceKey::Post {
                repo: "did:plc:bob".into(),
                rkey: "3kbob".into()
            },
        ]
    );
}

#[tokio::test]
async fn test_resolve_all_document() {
    let resolver = StaticResolver::new()
        .with_record(DOC_URI, document())
        .with_record("at://did:plc:bob/app.bsky.feed.post/3kbob", bob_post())
        .with_handle("did:plc:bob", "bob.example")
        .with_blob("did:plc:author", "bafkimg", "https://cdn.example/bafkimg.png");

    let mut session = RenderSession::default();
    session.open(DOC_URI).unwrap();
    let rendered = session.resolve_all(&resolver).await;

    assert!(rendered.demand.is_empty());
    let SubjectView::Document(view) = &rendered.view else {
        panic!("expected document, got {:?}", rendered.view);
    };
    let BlockKind::Post(QuotedPost::Post(bob)) = &view.pages[0][2].kind else {
        panic!("expected resolved post block");
    };
    assert_eq!(bob.author.as_deref(), Some("@bob.example"));
    // Carol's post does not exist, so bob's quote settles as failed
    assert_eq!(
        bob.embed,
        Some(crate::view::EmbedView::Quote(QuotedPost::Failed))
    );

    let html = rendered.view.to_html();
    assert!(html.contains(r#"src="https://cdn.example/bafkimg.png""#));
    assert!(html.contains("fan art incoming"));
    assert!(html.contains("Could not load post"));
    assert_eq!(session.table().len(), 4);
}

#[tokio::test]
async fn test_resolve_all_post_with_reply() {
    let resolver = StaticResolver::new()
        .with_record(
            POST_URI,
            json!({
                "text": "thank you!!",
                "reply": {
                    "parent": { "uri": "at://did:plc:reader/app.bsky.feed.post/3kq", "cid": "bafyq" }
                }
            }),
        )
        .with_handle("did:plc:reader", "reader.example");

    let mut session = RenderSession::default();
    session.open(POST_URI).unwrap();
    let rendered = session.resolve_all(&resolver).await;
    let SubjectView::Post(view) = rendered.view else {
        panic!("expected post");
    };
    assert_eq!(view.reply.map(|r| r.label).as_deref(), Some("@reader.example"));
}

#[tokio::test]
async fn test_resolve_all_missing_subject() {
    let mut session = RenderSession::default();
    session.open(POST_URI).unwrap();
    let rendered = session.resolve_all(&StaticResolver::new()).await;
    assert_eq!(
        rendered.view,
        SubjectView::Failed(format!("not found: {POST_URI}"))
    );
    assert!(rendered.view.to_html().contains("Could not load post!"));
}

#[tokio::test]
async fn test_resolve_all_without_collaborators() {
    let mut session = RenderSession::default();
    let record = Record::from_value("pub.leaflet.document", document()).unwrap();
    session.show(DOC_URI, record).unwrap();
    let rendered = session.resolve_all(&()).await;
    let SubjectView::Document(view) = &rendered.view else {
        panic!("expected document");
    };
    let BlockKind::Image(image) = &view.pages[0][1].kind else {
        panic!("expected image");
    };
    assert!(matches!(image.src, Resolution::Failed(_)));
    assert_eq!(view.pages[0][2].kind, BlockKind::Post(QuotedPost::Failed));
}
