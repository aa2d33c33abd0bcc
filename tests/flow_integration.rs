//! Workshop Flow Integration Tests
//!
//! Drives complete workshop sessions against fake generation and real
//! storage backends.

mod common;

use std::sync::Arc;

use common::{fast_pipeline, BrokenDocumentStore, CountingDocumentStore, FakeClient};
use ideaflow::core::{
    FeedbackInput, IdeaBrief, ImageSlot, Language, Message, PipelineConfig, PreconditionError,
    ProjectPatch, SketchStyle,
};
use ideaflow::flow::{Day1Stage, Day1Step, FlowError, WorkshopFlow};
use ideaflow::pipeline::Artifact;
use ideaflow::store::{
    FileBlobStore, FileDocumentStore, Identity, MemoryBlobStore, MemoryDocumentStore, NoticeKind,
    ProjectStore, SaveOutcome,
};

fn brief() -> IdeaBrief {
    IdeaBrief {
        skills: "leather crafts".into(),
        target: "tourists".into(),
        needs: "local souvenirs".into(),
    }
}

async fn memory_flow(client: Arc<FakeClient>) -> WorkshopFlow {
    let store = Arc::new(ProjectStore::new(Arc::new(MemoryDocumentStore::new()), Language::En));
    store.set_identity(Some(Identity::new("participant"))).await.unwrap();
    WorkshopFlow::new(store, client, Arc::new(MemoryBlobStore::new()), fast_pipeline())
}

// ============================================================================
// Day 1
// ============================================================================

mod day_one {
    use super::*;

    #[tokio::test]
    async fn test_full_day_one_session() {
        let client = Arc::new(FakeClient::default());
        let flow = memory_flow(client.clone()).await;

        let report = flow.generate_ideas(&brief(), SketchStyle::Simple).await.unwrap();
        assert_eq!((report.total, report.succeeded, report.batches), (5, 5, 2));

        flow.select_idea(1).await.unwrap();
        let report = flow.generate_sketches(SketchStyle::Simple).await.unwrap();
        assert_eq!(report.total, 9);
        assert_eq!(report.batches, 5);

        flow.select_sketch("v2").await.unwrap();
        let report = flow.generate_storyboards(None).await.unwrap();
        assert_eq!(report.total, 16);
        assert_eq!(report.batches, 4);

        flow.select_storyboard("v0").await.unwrap();
        assert_eq!(flow.stage(), Day1Stage { step: Day1Step::Storyboard, selected: true });

        let state = flow.store().state();
        let storyboard = state.selected_storyboard().unwrap();
        assert_eq!(storyboard.len(), 8);
        assert!(storyboard.iter().all(|p| p.image.url().is_some()));
        assert_eq!(client.image_calls(), 5 + 9 + 16);
    }

    #[tokio::test]
    async fn test_storyboard_prompt_uses_selected_sketch_summary() {
        let client = Arc::new(FakeClient::default());
        let flow = memory_flow(client.clone()).await;
        flow.generate_ideas(&brief(), SketchStyle::Professional).await.unwrap();
        flow.select_idea(0).await.unwrap();
        flow.generate_sketches(SketchStyle::Simple).await.unwrap();
        flow.select_sketch("v1").await.unwrap();

        flow.generate_storyboards(None).await.unwrap();
        let prompt = client.prompts.lock().last().cloned().unwrap();
        assert!(prompt.contains("Step 1: alt step 1 - stacked. Key components: header, cta"));

        flow.regenerate_storyboards(Some("Browse, pick, pay")).await.unwrap();
        let prompt = client.prompts.lock().last().cloned().unwrap();
        assert!(prompt.contains("the user flow: \"Browse, pick, pay\""));
    }

    #[tokio::test]
    async fn test_changing_sketch_clears_storyboards_only() {
        let flow = memory_flow(Arc::new(FakeClient::default())).await;
        flow.generate_ideas(&brief(), SketchStyle::Simple).await.unwrap();
        flow.select_idea(0).await.unwrap();
        flow.generate_sketches(SketchStyle::Simple).await.unwrap();
        flow.select_sketch("v0").await.unwrap();
        flow.generate_storyboards(None).await.unwrap();

        flow.select_sketch("v1").await.unwrap();
        let state = flow.store().state();
        assert!(state.storyboards.is_none());
        assert!(state.selected_storyboard.is_none());
        assert!(state.three_step_sketches.is_some());
        assert_eq!(state.selected_idea, Some(0));
    }

    #[tokio::test]
    async fn test_unknown_variant_is_refused() {
        let flow = memory_flow(Arc::new(FakeClient::default())).await;
        flow.generate_ideas(&brief(), SketchStyle::Simple).await.unwrap();
        flow.select_idea(0).await.unwrap();
        flow.generate_sketches(SketchStyle::Simple).await.unwrap();

        let err = flow.select_sketch("v9").await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::Precondition(PreconditionError::UnknownVariant { .. })
        ));
        assert!(flow.store().state().selected_sketch.is_none());
    }

    #[tokio::test]
    async fn test_blocked_images_fail_without_aborting() {
        let client = Arc::new(FakeClient::failing(vec!["idea sketch 2", "idea sketch 4"]));
        let flow = memory_flow(client.clone()).await;

        let report = flow.generate_ideas(&brief(), SketchStyle::Simple).await.unwrap();
        assert_eq!((report.succeeded, report.failed), (3, 2));
        // Two attempts per failing image.
        assert_eq!(client.image_calls(), 3 + 2 * 2);

        let ideas = flow.store().state().business_ideas;
        assert_eq!(ideas[1].sketch, ImageSlot::Failed);
        assert_eq!(ideas[3].sketch, ImageSlot::Failed);
        assert!(ideas[4].sketch.url().is_some());
    }

    #[tokio::test]
    async fn test_resume_fills_only_pending_slots() {
        let client = Arc::new(FakeClient::default());
        let flow = memory_flow(client.clone()).await;
        flow.generate_ideas(&brief(), SketchStyle::Simple).await.unwrap();

        let mut ideas = flow.store().state().business_ideas;
        ideas[0].sketch = ImageSlot::Pending;
        ideas[2].sketch = ImageSlot::Pending;
        flow.store().update(ProjectPatch::new().business_ideas(ideas)).await.unwrap();
        let before = client.image_calls();

        let report = flow.resume_images(Artifact::Ideas).await.unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(client.image_calls(), before + 2);
        assert!(flow.store().state().business_ideas.iter().all(|i| i.sketch.is_settled()));
    }
}

// ============================================================================
// Days 2 and 3
// ============================================================================

mod days_two_and_three {
    use super::*;

    #[tokio::test]
    async fn test_questions_and_analysis_are_persisted() {
        let flow = memory_flow(Arc::new(FakeClient::default())).await;
        flow.generate_ideas(&brief(), SketchStyle::Simple).await.unwrap();
        flow.select_idea(4).await.unwrap();

        let questions = flow.generate_interview_questions().await.unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].follow_up, vec!["Why?".to_string()]);

        let input = FeedbackInput::Transcripts(vec![
            "Loved it but the price worries me".into(),
            "   ".into(),
            "Would buy as a gift".into(),
        ]);
        let analysis = flow.analyze_feedback(&input).await.unwrap();
        assert_eq!(analysis.key_patterns[0].count, 2.0);

        let state = flow.store().state();
        assert_eq!(state.interview_questions, questions);
        assert_eq!(state.feedback_analysis.as_ref(), Some(&analysis));
    }

    #[tokio::test]
    async fn test_stitch_prompt_lists_enabled_pages() {
        let client = Arc::new(FakeClient::default());
        let flow = memory_flow(client.clone()).await;

        let mut options = flow.stitch_options();
        options.problem = "Hard to find products".into();
        options.set_page_count(3);
        options.pages[1].enabled = false;
        options.pages[2].purpose = "Checkout".into();

        let prompt = flow.generate_stitch_prompt(&options).await.unwrap();
        assert_eq!(prompt.title, "Shop");

        let sent = client.prompts.lock().last().cloned().unwrap();
        assert!(sent.contains("consist of 2 pages"));
        assert!(sent.contains("Checkout"));
        assert!(sent.contains("**Additional Requirements**: None"));
        assert_eq!(flow.store().state().stitch_prompt, Some(prompt));
    }
}

// ============================================================================
// Persistence
// ============================================================================

mod persistence {
    use super::*;

    #[tokio::test]
    async fn test_session_survives_restart_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let open = || {
            Arc::new(ProjectStore::new(
                Arc::new(FileDocumentStore::new(dir.path())),
                Language::En,
            ))
        };

        let store = open();
        store.set_identity(Some(Identity::new("p1"))).await.unwrap();
        store.create_profile("Ada", "Makers", Default::default()).await.unwrap();
        let flow = WorkshopFlow::new(
            store,
            Arc::new(FakeClient::default()),
            Arc::new(FileBlobStore::new(dir.path())),
            fast_pipeline(),
        );
        flow.generate_ideas(&brief(), SketchStyle::Simple).await.unwrap();
        flow.select_idea(3).await.unwrap();
        drop(flow);

        let reopened = open();
        reopened.set_identity(Some(Identity::new("p1"))).await.unwrap();
        let state = reopened.state();
        assert_eq!(state.selected_idea().map(|i| i.title.as_str()), Some("Idea 4"));

        let url = state.business_ideas[0].sketch.url().unwrap().to_string();
        let path = url.strip_prefix("file://").unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"idea sketch 1");
    }

    #[tokio::test]
    async fn test_each_image_batch_is_one_project_write() {
        let documents = Arc::new(CountingDocumentStore::default());
        let store = Arc::new(ProjectStore::new(documents.clone(), Language::En));
        store.set_identity(Some(Identity::new("p1"))).await.unwrap();
        let pipeline = PipelineConfig { idea_batch_size: 2, ..fast_pipeline() };
        let flow = WorkshopFlow::new(
            Arc::clone(&store),
            Arc::new(FakeClient::default()),
            Arc::new(MemoryBlobStore::new()),
            pipeline,
        );

        let report = flow.generate_ideas(&brief(), SketchStyle::Simple).await.unwrap();

        assert_eq!(report.total, 5);
        assert_eq!(report.batches, 3);
        // One write for the idea text, then one per batch of 2, 2 and 1.
        assert_eq!(documents.upserts("projects"), 1 + 3);
        assert_eq!(documents.upserts("users"), 0);
    }

    #[tokio::test]
    async fn test_failed_saves_keep_local_state() {
        let store = Arc::new(ProjectStore::new(Arc::new(BrokenDocumentStore), Language::En));
        store.set_identity(Some(Identity::new("p1"))).await.unwrap();
        let flow = WorkshopFlow::new(
            Arc::clone(&store),
            Arc::new(FakeClient::default()),
            Arc::new(MemoryBlobStore::new()),
            fast_pipeline(),
        );

        flow.generate_ideas(&brief(), SketchStyle::Simple).await.unwrap();
        let outcome = flow.select_idea(0).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Failed);

        assert_eq!(store.state().selected_idea, Some(0));
        assert!(store.state().business_ideas.iter().all(|i| i.sketch.url().is_some()));
        assert!(store.last_saved().is_none());
        assert!(store.last_error().unwrap().contains("backend offline"));

        let notices = store.drain_notices();
        assert!(notices.iter().all(|n| n.kind == NoticeKind::Error));
        assert_eq!(notices[0].message, Message::SaveFailed);
    }
}
