//! End-to-end review scenarios

use formdraft_editor::{
    build_review_model, compute_effective, validate, Block, BlockKind, ChoiceContent, Document, EditSession, EditorConfig,
    InputContent, Page, PageKind, PatchOperation, PatchStatus, Proposal, Resolution, ReviewStatus,
    StaticProposalSource,
};
use serde_json::json;

fn text(id: &str, label: &str) -> Block {
    Block::new(
        id,
        BlockKind::Text(InputContent {
            label: label.to_string(),
            ..Default::default()
        }),
    )
}

fn form() -> Document {
    let mut doc = Document::new("survey", "Customer survey");
    doc.pages[0] = Page::new("start", PageKind::Start)
        .with_title("Welcome")
        .with_block(text("A", "Name"))
        .with_block(text("B", "Email"));
    doc.pages.insert(
        1,
        Page::new("details", PageKind::Default)
            .with_title("Details")
            .with_block(Block::new(
                "q1",
                BlockKind::Choice(ChoiceContent {
                    label: "Plan".to_string(),
                    options: vec!["Free".to_string(), "Pro".to_string()],
                    ..Default::default()
                }),
            ))
            .with_block(text("q2", "Company")),
    );
    doc
}

#[test]
fn test_non_removable_block_scenario() {
    let mut doc = form();
    doc.pages[0].blocks[0] = text("block-1", "Name").with_removable(false);

    let report = validate(vec![PatchOperation::remove("/pages/start/blocks/0")], &doc);
    assert_eq!(report.accepted.len(), 0);
    assert_eq!(report.rejected.len(), 1);
}

#[test]
fn test_shuffle_scenario() {
    let mut session = EditSession::new(form());
    session
        .open_review(Proposal::new(
            vec![
                PatchOperation::add("/pages/0/blocks/0", json!({ "id": "C", "type": "text", "content": { "label": "Phone" } })),
                PatchOperation::remove("/pages/0/blocks/2"),
            ],
            "Swap email for phone",
        ))
        .unwrap();

    let effective = session.effective();
    let ids: Vec<&str> = effective.pages[0].blocks.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["C", "A"]);

    let model = session.review_model();
    let start = &model[0];
    assert_eq!(start.block("A").unwrap().review.status, ReviewStatus::Kept);
    assert_eq!(start.block("B").unwrap().review.status, ReviewStatus::Removed);
    assert_eq!(start.block("C").unwrap().review.status, ReviewStatus::Added);

    // each is separately resolvable by id
    assert_eq!(session.reject_patches_by_block_id("B").unwrap(), 1);
    assert_eq!(session.accept_patches_by_block_id("C").unwrap(), 1);
    assert!(!session.is_reviewing());

    let ids: Vec<&str> = session.document().pages[0].blocks.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["C", "A", "B"]);
}

#[test]
fn test_grouped_block_resolution() {
    let mut session = EditSession::new(form());
    session
        .open_review(Proposal::new(
            vec![
                PatchOperation::add("/pages/1/blocks/0/content/options/-", json!("Enterprise")),
                PatchOperation::replace("/pages/1/blocks/0/content/label", json!("Which plan?")),
                PatchOperation::replace("/metadata/title", json!("Plan survey")),
            ],
            "",
        ))
        .unwrap();

    assert_eq!(session.accept_patches_by_block_id("q1").unwrap(), 2);

    let (_, block) = session.document().find_block("q1").unwrap();
    match &block.kind {
        BlockKind::Choice(content) => {
            assert_eq!(content.label, "Which plan?");
            assert_eq!(content.options, vec!["Free", "Pro", "Enterprise"]);
        }
        other => panic!("expected choice block, got {:?}", other.block_type()),
    }

    let statuses: Vec<PatchStatus> = session.patches().iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![PatchStatus::Accepted, PatchStatus::Accepted, PatchStatus::Pending]
    );
    assert_eq!(session.document().metadata.title, "Customer survey");
}

#[test]
fn test_page_cascade_reject() {
    let mut session = EditSession::new(form());
    session
        .open_review(Proposal::new(
            vec![
                PatchOperation::replace("/pages/1/blocks/1/content/label", json!("Organisation")),
                PatchOperation::add("/pages/1/blocks/-", json!({ "id": "q3", "type": "rating", "content": { "label": "Score" } })),
                PatchOperation::remove("/pages/1"),
                PatchOperation::replace("/pages/0/blocks/0/content/label", json!("Full name")),
            ],
            "",
        ))
        .unwrap();

    let page_patch = session.patches()[2].id.clone();
    session.resolve_page_patch(&page_patch, Resolution::Reject).unwrap();

    let pending: Vec<&str> = session.pending().iter().map(|p| p.operation.path()).collect();
    assert_eq!(pending, vec!["/pages/0/blocks/0/content/label"]);

    let model = session.review_model();
    let details = model.iter().find(|p| p.id == "details").unwrap();
    assert_eq!(details.review.status, ReviewStatus::Kept);
    assert!(details.blocks.iter().all(|b| b.review.status == ReviewStatus::Kept));
}

#[test]
fn test_page_cascade_accept_remove() {
    let mut session = EditSession::new(form());
    session
        .open_review(Proposal::new(
            vec![
                PatchOperation::replace("/pages/1/blocks/1/content/label", json!("Organisation")),
                PatchOperation::remove("/pages/1"),
            ],
            "",
        ))
        .unwrap();

    let page_patch = session.patches()[1].id.clone();
    session.resolve_page_patch(&page_patch, Resolution::Accept).unwrap();

    assert!(!session.is_reviewing());
    assert!(session.document().page("details").is_none());
    assert_eq!(session.history().undo_levels(), 1);
}

#[test]
fn test_reject_all_is_noop() {
    let original = form();
    let mut session = EditSession::new(original.clone());
    session
        .open_review(Proposal::new(
            vec![
                PatchOperation::remove("/pages/1"),
                PatchOperation::replace("/metadata/title", json!("Gone")),
            ],
            "",
        ))
        .unwrap();

    assert_eq!(session.reject_all_patches().unwrap(), 2);
    assert!(!session.is_reviewing());
    assert_eq!(session.document(), &original);
    assert_eq!(compute_effective(session.document(), session.patches()), original);
    assert!(!session.history().can_undo());
}

#[test]
fn test_accept_all_then_undo() {
    let original = form();
    let mut session = EditSession::new(original.clone());
    session
        .open_review(Proposal::new(
            vec![
                PatchOperation::remove("/pages/1/blocks/1"),
                PatchOperation::add("/pages/1/blocks/-", json!({ "id": "q4", "type": "textarea", "content": {} })),
            ],
            "Replace company field",
        ))
        .unwrap();

    assert_eq!(session.accept_all_patches().unwrap(), 2);
    assert!(session.snapshot().is_none());
    assert!(session.document().find_block("q4").is_some());
    assert!(session.document().find_block("q2").is_none());

    session.undo().unwrap();
    assert_eq!(session.document(), &original);
    session.redo().unwrap();
    assert!(session.document().find_block("q4").is_some());
}

#[test]
fn test_identical_documents_are_all_kept() {
    let doc = form();
    let model = build_review_model(&doc, &doc, &[]);
    assert!(model.iter().all(|p| p.review.status == ReviewStatus::Kept));
    assert!(model
        .iter()
        .flat_map(|p| p.blocks.iter())
        .all(|b| b.review.status == ReviewStatus::Kept));
}

#[test]
fn test_invalid_types_filtered_from_proposal() {
    let mut session = EditSession::new(form());
    let source = StaticProposalSource::new(Proposal::new(
        vec![
            PatchOperation::add("/pages/0/blocks/-", json!({ "id": "x", "type": "video", "content": {} })),
            PatchOperation::add("/pages/0/blocks/-", json!({ "id": "y", "type": "statement", "content": { "body": "Thanks" } })),
        ],
        "",
    ));

    let report = session.request_proposal(&source, "add a thank-you note").unwrap();
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(session.patches().len(), 1);
    assert_eq!(session.patches()[0].entity(), Some("y"));
}

#[test]
fn test_history_is_bounded() {
    let mut session = EditSession::new(form());
    for i in 0..60 {
        session
            .apply_direct(vec![PatchOperation::replace("/metadata/title", json!(format!("v{}", i)))], None)
            .unwrap();
    }
    assert_eq!(session.history().undo_levels(), 50);
}

#[test]
fn test_configured_history_limit_stays_bounded() {
    for limit in [0, 500] {
        let config: EditorConfig = serde_json::from_value(json!({ "historyLimit": limit })).unwrap();
        let mut session = EditSession::with_config(form(), &config);
        for i in 0..60 {
            session
                .apply_direct(vec![PatchOperation::replace("/metadata/title", json!(format!("v{}", i)))], None)
                .unwrap();
        }
        assert!(session.history().undo_levels() >= 1);
        assert!(session.history().undo_levels() <= 50);
    }
}
