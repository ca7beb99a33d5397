//! Tests for sequences of reviews, direct edits and history
//!
//! This tests:
//! - Consecutive review sessions
//! - Interleaved direct edits and undo/redo
//! - Out-of-order resolution within one batch
//! - Persisting the committed document after each commit

use formdraft_editor::{
    Block, BlockKind, BodyContent, Document, DocumentStore, EditSession, FileStore, PatchOperation, Proposal,
    SessionError,
};
use serde_json::json;

fn info(id: &str, body: &str) -> Block {
    Block::new(
        id,
        BlockKind::Info(BodyContent {
            label: None,
            body: body.to_string(),
        }),
    )
}

fn form() -> Document {
    let mut doc = Document::new("onboarding", "Onboarding");
    doc.pages[0].blocks.push(info("intro", "Hello"));
    doc
}

fn title(session: &EditSession) -> &str {
    &session.document().metadata.title
}

#[test]
fn test_consecutive_reviews() {
    let mut session = EditSession::new(form());

    session
        .open_review(Proposal::new(vec![PatchOperation::replace("/metadata/title", json!("First"))], "one"))
        .unwrap();
    session.accept_all_patches().unwrap();

    session
        .open_review(Proposal::new(vec![PatchOperation::replace("/metadata/title", json!("Second"))], "two"))
        .unwrap();
    session.accept_all_patches().unwrap();

    assert_eq!(title(&session), "Second");
    assert_eq!(session.history().undo_levels(), 2);
    assert_eq!(session.history().undo_description(), Some("two"));

    session.undo().unwrap();
    assert_eq!(title(&session), "First");
    session.undo().unwrap();
    assert_eq!(title(&session), "Onboarding");
    assert!(!session.undo().unwrap());
}

#[test]
fn test_patch_ids_are_never_reused() {
    let mut session = EditSession::new(form());

    session
        .open_review(Proposal::new(vec![PatchOperation::replace("/metadata/title", json!("A"))], ""))
        .unwrap();
    let first = session.patches()[0].id.clone();
    session.reject_all_patches().unwrap();

    session
        .open_review(Proposal::new(vec![PatchOperation::replace("/metadata/title", json!("B"))], ""))
        .unwrap();
    let second = session.patches()[0].id.clone();

    assert_ne!(first, second);
    assert!(matches!(session.accept_patch(&first), Err(SessionError::UnknownPatch(_))));
}

#[test]
fn test_direct_edit_after_review_clears_redo() {
    let mut session = EditSession::new(form());

    session
        .apply_direct(vec![PatchOperation::replace("/metadata/title", json!("Direct"))], Some("rename".to_string()))
        .unwrap();
    session.undo().unwrap();
    assert!(session.history().can_redo());

    session
        .open_review(Proposal::new(vec![PatchOperation::replace("/metadata/description", json!("Desc"))], ""))
        .unwrap();
    session.accept_all_patches().unwrap();

    assert!(!session.history().can_redo());
    assert_eq!(session.document().metadata.description, "Desc");
    assert_eq!(title(&session), "Onboarding");
}

#[test]
fn test_out_of_order_resolution_keeps_batch_order() {
    let mut session = EditSession::new(form());
    session
        .open_review(Proposal::new(
            vec![
                PatchOperation::add("/pages/0/blocks/-", json!({ "id": "b1", "type": "info", "content": { "body": "1" } })),
                PatchOperation::add("/pages/0/blocks/-", json!({ "id": "b2", "type": "info", "content": { "body": "2" } })),
                PatchOperation::add("/pages/0/blocks/-", json!({ "id": "b3", "type": "info", "content": { "body": "3" } })),
            ],
            "",
        ))
        .unwrap();

    let ids: Vec<_> = session.patches().iter().map(|p| p.id.clone()).collect();
    session.accept_patch(&ids[2]).unwrap();
    session.reject_patch(&ids[1]).unwrap();
    session.accept_patch(&ids[0]).unwrap();

    let blocks: Vec<&str> = session.document().pages[0].blocks.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(blocks, vec!["intro", "b3", "b1"]);
    assert_eq!(session.history().undo_levels(), 1);
}

#[test]
fn test_commit_then_persist() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let mut session = EditSession::new(form());

    session
        .open_review(Proposal::new(vec![PatchOperation::replace("/metadata/title", json!("Saved"))], ""))
        .unwrap();
    session.accept_all_patches().unwrap();
    assert!(session.is_dirty());

    store.save(&session.document().id, session.document()).unwrap();
    session.mark_saved();
    assert!(!session.is_dirty());

    let loaded = store.load("onboarding").unwrap();
    assert_eq!(&loaded, session.document());
    assert_eq!(store.list().unwrap()[0].title, "Saved");
}

#[test]
fn test_grouped_accept_refuses_shifted_path() {
    let mut doc = form();
    doc.pages[0].blocks = vec![info("A", "a"), info("B", "b")];
    let mut session = EditSession::new(doc);
    session
        .open_review(Proposal::new(
            vec![
                PatchOperation::remove("/pages/0/blocks/0"),
                PatchOperation::replace("/pages/0/blocks/0/content/label", json!("X")),
            ],
            "",
        ))
        .unwrap();
    assert_eq!(session.patches()[1].entity(), Some("B"));

    // with A still in place the label edit would land on A
    let before = session.document().clone();
    let err = session.accept_patches_by_block_id("B").unwrap_err();
    assert!(matches!(err, SessionError::TargetMoved { .. }));
    assert_eq!(session.document(), &before);
    assert_eq!(session.pending().len(), 2);

    // once the removal is in, the edit reaches B
    let ids: Vec<_> = session.patches().iter().map(|p| p.id.clone()).collect();
    session.accept_patch(&ids[0]).unwrap();
    assert_eq!(session.accept_patches_by_block_id("B").unwrap(), 1);

    assert!(session.document().find_block("A").is_none());
    let (_, b) = session.document().find_block("B").unwrap();
    assert_eq!(b.kind.label(), Some("X"));
}

#[test]
fn test_reject_then_accept_shifted_edit_leaves_other_block() {
    let mut doc = form();
    doc.pages[0].blocks = vec![info("A", "a"), info("B", "b")];
    let mut session = EditSession::new(doc);
    session
        .open_review(Proposal::new(
            vec![
                PatchOperation::remove("/pages/0/blocks/0"),
                PatchOperation::replace("/pages/0/blocks/0/content/label", json!("X")),
            ],
            "",
        ))
        .unwrap();
    let ids: Vec<_> = session.patches().iter().map(|p| p.id.clone()).collect();

    session.reject_patch(&ids[0]).unwrap();
    assert!(session.accept_patch(&ids[1]).is_err());
    session.reject_all_patches().unwrap();

    let (_, a) = session.document().find_block("A").unwrap();
    assert_eq!(a.kind.label(), None);
    assert!(!session.is_reviewing());
}
