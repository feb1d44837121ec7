//! End-to-end review session tests.
//!
//! The quiz generator here hands every request to the test through a channel
//! and waits for the test to answer it, so each test decides exactly when
//! (and in which order) replies arrive.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use ingrain_core::session::{Phase, ReviewSession, SessionEvent};
use ingrain_core::{
    Generation, IngrainError, IngrainResult, LlmQuizClient, ManualClock, MemoryBackend,
    MemoryDocumentSource, Message, QuizGenerator, ReviewRecordStore, ReviewStoreState,
};

const NOW: i64 = 1_700_000_000_000;

#[derive(Debug, Clone, PartialEq)]
enum CallKind {
    Quiz { content: String },
    FollowUp { input: String, transcript_len: usize },
}

struct Call {
    kind: CallKind,
    respond: oneshot::Sender<IngrainResult<String>>,
}

impl Call {
    fn reply(self, text: &str) {
        let _ = self.respond.send(Ok(text.to_string()));
    }

    fn fail(self, error: IngrainError) {
        let _ = self.respond.send(Err(error));
    }
}

// Ignores its cancellation token, so a reply released after an abort still
// reaches the session and has to be discarded there.
struct ScriptedGenerator {
    calls: mpsc::UnboundedSender<Call>,
}

impl ScriptedGenerator {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Call>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { calls }), rx)
    }

    async fn call(&self, kind: CallKind) -> IngrainResult<Generation> {
        let (respond, reply) = oneshot::channel();
        if self.calls.send(Call { kind, respond }).is_err() {
            return Ok(Generation::Cancelled);
        }
        match reply.await {
            Ok(result) => result.map(Generation::Reply),
            Err(_) => Ok(Generation::Cancelled),
        }
    }
}

#[async_trait]
impl QuizGenerator for ScriptedGenerator {
    async fn generate_quiz(
        &self,
        document_content: &str,
        _cancel: &CancellationToken,
    ) -> IngrainResult<Generation> {
        self.call(CallKind::Quiz {
            content: document_content.to_string(),
        })
        .await
    }

    async fn send_follow_up(
        &self,
        transcript: &[Message],
        input: &str,
        _cancel: &CancellationToken,
    ) -> IngrainResult<Generation> {
        self.call(CallKind::FollowUp {
            input: input.to_string(),
            transcript_len: transcript.len(),
        })
        .await
    }
}

struct Harness {
    session: ReviewSession,
    source: Arc<MemoryDocumentSource>,
    store: Arc<ReviewRecordStore>,
    backend: Arc<MemoryBackend>,
    calls: mpsc::UnboundedReceiver<Call>,
}

impl Harness {
    async fn new(documents: &[(&str, &str)], persisted: serde_json::Value) -> Self {
        let source = Arc::new(MemoryDocumentSource::with_documents(
            documents.iter().map(|(p, c)| (p.to_string(), c.to_string())),
        ));
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(ReviewRecordStore::from_state(
            ReviewStoreState::hydrate(persisted),
            backend.clone(),
            Arc::new(ManualClock::new(NOW)),
        ));
        let (generator, calls) = ScriptedGenerator::new();
        let session = ReviewSession::open(source.clone(), store.clone(), generator)
            .await
            .unwrap();
        Self {
            session,
            source,
            store,
            backend,
            calls,
        }
    }

    async fn next_call(&mut self) -> Call {
        self.calls.recv().await.unwrap()
    }

    // Answer the pending quiz request and apply it.
    async fn load_quiz(&mut self, quiz: &str) {
        let call = self.next_call().await;
        assert!(matches!(call.kind, CallKind::Quiz { .. }));
        call.reply(quiz);
        assert_eq!(self.session.wait_event().await, SessionEvent::Applied);
        assert_eq!(self.session.phase(), Phase::AwaitingAnswer);
    }

    fn current(&self) -> Option<&str> {
        self.session.current_document().map(|d| d.path.as_str())
    }
}

fn staggered() -> serde_json::Value {
    json!({
        "notes": {
            "b.md": { "lastSeen": 500 },
            "c.md": { "lastSeen": 1500 }
        }
    })
}

const DOCS: &[(&str, &str)] = &[("a.md", "alpha"), ("b.md", "beta"), ("c.md", "gamma")];

#[tokio::test]
async fn test_skip_walks_oldest_first_then_wraps() {
    let mut h = Harness::new(DOCS, staggered()).await;

    assert!(h.session.initialize());
    assert_eq!(h.current(), Some("a.md"));
    h.load_quiz("quiz a").await;

    assert!(h.session.skip());
    assert_eq!(h.current(), Some("b.md"));
    assert_eq!(h.session.phase(), Phase::Loading);
    h.load_quiz("quiz b").await;

    assert!(h.session.skip());
    assert_eq!(h.current(), Some("c.md"));
    h.load_quiz("quiz c").await;
    assert_eq!(h.session.skipped().len(), 2);

    assert!(h.session.skip());
    assert_eq!(h.current(), Some("a.md"));
    assert!(h.session.skipped().is_empty());
}

#[tokio::test]
async fn test_quiz_seeds_transcript_with_prompt() {
    let mut h = Harness::new(DOCS, staggered()).await;
    h.session.initialize();

    let call = h.next_call().await;
    assert_eq!(
        call.kind,
        CallKind::Quiz {
            content: "alpha".to_string()
        }
    );
    call.reply("1. What is alpha?");
    h.session.wait_event().await;

    let transcript = h.session.transcript();
    assert_eq!(transcript.len(), 2);
    assert!(transcript[0].content.ends_with("alpha"));
    assert!(transcript[0].content.starts_with("Quiz me on this note."));
    assert_eq!(transcript[1], Message::assistant("1. What is alpha?"));
    assert_eq!(h.session.display().response_text, "1. What is alpha?");
}

#[tokio::test]
async fn test_submit_marks_reviewed_and_next_moves_on() {
    let mut h = Harness::new(DOCS, staggered()).await;
    h.session.initialize();
    h.load_quiz("quiz a").await;

    assert!(h.session.submit("my answer"));
    assert_eq!(h.session.phase(), Phase::Submitting);

    let call = h.next_call().await;
    assert_eq!(
        call.kind,
        CallKind::FollowUp {
            input: "my answer".to_string(),
            transcript_len: 2
        }
    );
    call.reply("Well done.");
    assert_eq!(h.session.wait_event().await, SessionEvent::Applied);

    assert_eq!(h.session.phase(), Phase::AnswerSubmitted);
    assert_eq!(h.session.transcript().len(), 4);
    let record = h.store.get("a.md").unwrap();
    assert_eq!(record.last_reviewed, NOW);
    assert_eq!(record.last_reviewed, record.last_seen);
    assert_eq!(h.backend.save_count(), 1);

    assert!(h.session.next());
    assert_eq!(h.current(), Some("b.md"));
    assert!(h.session.transcript().is_empty());
    h.load_quiz("quiz b").await;
    assert_eq!(h.session.transcript()[1].content, "quiz b");
}

impl Harness {
    // Submit an answer on the loaded quiz and accept the follow-up.
    async fn answer(&mut self, text: &str) {
        assert!(self.session.submit(text));
        self.next_call().await.reply("Good.");
        assert_eq!(self.session.wait_event().await, SessionEvent::Applied);
        assert_eq!(self.session.phase(), Phase::AnswerSubmitted);
    }
}

#[tokio::test]
async fn test_next_keeps_skip_set_and_avoids_it() {
    let mut h = Harness::new(DOCS, staggered()).await;
    h.session.initialize();
    h.load_quiz("quiz a").await;

    h.session.skip();
    assert_eq!(h.current(), Some("b.md"));
    h.load_quiz("quiz b").await;
    h.answer("about b").await;

    // a is skipped and b was just answered.
    assert!(h.session.next());
    assert_eq!(h.current(), Some("c.md"));
    assert_eq!(h.session.skipped().len(), 1);
    assert!(h.session.skipped().contains("a.md"));
    h.load_quiz("quiz c").await;
    h.answer("about c").await;

    assert!(h.session.next());
    assert_eq!(h.current(), Some("b.md"));
    assert!(h.session.skipped().contains("a.md"));
}

#[tokio::test]
async fn test_next_falls_back_without_clearing_skip_set() {
    let mut h = Harness::new(&[("a.md", "alpha"), ("b.md", "beta")], staggered()).await;
    h.session.initialize();
    h.load_quiz("quiz a").await;
    h.session.skip();
    h.load_quiz("quiz b").await;
    h.answer("about b").await;

    // Everything is excluded, so selection runs unfiltered.
    assert!(h.session.next());
    assert_eq!(h.current(), Some("a.md"));
    assert_eq!(h.session.phase(), Phase::Loading);
    assert!(h.session.skipped().contains("a.md"));
}

#[tokio::test]
async fn test_next_with_single_document_reloads_it() {
    let mut h = Harness::new(&[("only.md", "solo")], json!({})).await;
    h.session.initialize();
    h.load_quiz("quiz").await;
    h.answer("answer").await;

    assert!(h.session.next());
    assert_eq!(h.current(), Some("only.md"));
    assert_eq!(h.session.phase(), Phase::Loading);
    assert!(h.session.transcript().is_empty());

    let call = h.next_call().await;
    assert_eq!(
        call.kind,
        CallKind::Quiz {
            content: "solo".to_string()
        }
    );
}

#[tokio::test]
async fn test_actions_rejected_in_wrong_phase() {
    let mut h = Harness::new(DOCS, staggered()).await;

    assert!(!h.session.submit("too early"));
    assert!(!h.session.next());
    assert!(!h.session.skip());

    h.session.initialize();
    assert!(!h.session.initialize());
    assert!(!h.session.skip());
    assert!(!h.session.submit("still loading"));

    h.load_quiz("quiz a").await;
    assert!(!h.session.submit("   "));
    assert!(!h.session.next());
    assert_eq!(h.session.phase(), Phase::AwaitingAnswer);
    assert!(!h.session.has_pending_request());
}

#[tokio::test]
async fn test_late_follow_up_is_discarded() {
    let mut h = Harness::new(DOCS, staggered()).await;
    h.session.initialize();
    h.load_quiz("quiz a").await;

    h.session.submit("A");
    let first = h.next_call().await;
    assert!(h.session.abort());
    assert_eq!(h.session.phase(), Phase::AwaitingAnswer);
    assert_eq!(h.session.transcript().len(), 2);

    h.session.submit("B");
    let second = h.next_call().await;

    first.reply("reply to A");
    assert_eq!(h.session.wait_event().await, SessionEvent::Discarded);
    assert_eq!(h.session.phase(), Phase::Submitting);
    assert_eq!(h.session.transcript().len(), 2);
    assert!(h.store.get("a.md").is_none());

    second.reply("reply to B");
    assert_eq!(h.session.wait_event().await, SessionEvent::Applied);
    let transcript = h.session.transcript();
    assert_eq!(transcript[2], Message::user("B"));
    assert_eq!(transcript[3], Message::assistant("reply to B"));
    assert_eq!(h.backend.save_count(), 1);
}

#[tokio::test]
async fn test_stale_quiz_after_retry_is_discarded() {
    let mut h = Harness::new(DOCS, staggered()).await;
    h.session.initialize();
    let first = h.next_call().await;

    assert!(h.session.abort());
    assert_eq!(h.session.phase(), Phase::AwaitingAnswer);
    assert!(h.session.transcript().is_empty());

    assert!(h.session.retry());
    let second = h.next_call().await;

    first.reply("old quiz");
    assert_eq!(h.session.wait_event().await, SessionEvent::Discarded);
    assert_eq!(h.session.phase(), Phase::Loading);

    second.reply("new quiz");
    assert_eq!(h.session.wait_event().await, SessionEvent::Applied);
    assert_eq!(h.session.display().response_text, "new quiz");
}

#[tokio::test]
async fn test_failed_submit_leaves_store_untouched() {
    let mut h = Harness::new(DOCS, staggered()).await;
    h.session.initialize();
    h.load_quiz("quiz a").await;

    h.session.submit("answer");
    h.next_call().await.fail(IngrainError::provider("HTTP 500"));
    assert_eq!(h.session.wait_event().await, SessionEvent::Applied);

    assert_eq!(h.session.phase(), Phase::AwaitingAnswer);
    assert!(h.session.display().response_text.starts_with("Error:"));
    assert!(h.session.display().response_text.contains("HTTP 500"));
    assert_eq!(h.session.transcript().len(), 2);
    assert!(h.store.get("a.md").is_none());
    assert_eq!(h.backend.save_count(), 0);

    // The user can resubmit.
    assert!(h.session.submit("answer again"));
}

#[tokio::test]
async fn test_failed_quiz_allows_skip() {
    let mut h = Harness::new(DOCS, staggered()).await;
    h.session.initialize();
    h.next_call().await.fail(IngrainError::provider("rate limited"));
    h.session.wait_event().await;

    let display = h.session.display();
    assert_eq!(display.phase, Phase::AwaitingAnswer);
    assert!(display.response_text.contains("rate limited"));
    assert!(display.can_skip);
    assert!(h.session.transcript().is_empty());

    assert!(h.session.skip());
    assert_eq!(h.current(), Some("b.md"));
}

#[tokio::test]
async fn test_submit_needs_a_loaded_quiz() {
    let mut h = Harness::new(DOCS, staggered()).await;
    h.session.initialize();
    h.next_call().await.fail(IngrainError::provider("timeout"));
    h.session.wait_event().await;

    assert!(!h.session.display().can_submit);
    assert!(!h.session.submit("answer anyway"));
    assert_eq!(h.session.phase(), Phase::AwaitingAnswer);
    assert!(h.store.get("a.md").is_none());

    assert!(h.session.retry());
    h.load_quiz("quiz a").await;
    assert!(h.session.submit("real answer"));
}

#[tokio::test]
async fn test_unconfigured_client_shows_inline_error() {
    let source = Arc::new(MemoryDocumentSource::with_documents([("a.md", "alpha")]));
    let store = Arc::new(ReviewRecordStore::in_memory());
    let client = Arc::new(LlmQuizClient::unconfigured("Set OPENAI_API_KEY to enable quizzes"));
    let mut session = ReviewSession::open(source, store, client).await.unwrap();

    session.initialize();
    assert_eq!(session.wait_event().await, SessionEvent::Applied);

    let display = session.display();
    assert_eq!(display.phase, Phase::AwaitingAnswer);
    assert!(display.response_text.starts_with("Error: Configuration error"));
    assert!(display.response_text.contains("OPENAI_API_KEY"));
    assert!(display.can_skip);
}

#[tokio::test]
async fn test_rename_redirects_review() {
    let mut h = Harness::new(DOCS, staggered()).await;
    h.session.initialize();
    h.load_quiz("quiz a").await;

    h.session.submit("answer");
    let call = h.next_call().await;

    h.source.rename("a.md", "archive/a2.md").unwrap();
    assert_eq!(h.session.wait_event().await, SessionEvent::DocumentsChanged);
    assert_eq!(h.current(), Some("archive/a2.md"));
    assert_eq!(
        h.session.display().current_document_title.as_deref(),
        Some("a2")
    );

    call.reply("Nice.");
    assert_eq!(h.session.wait_event().await, SessionEvent::Applied);

    assert!(h.store.get("a.md").is_none());
    let record = h.store.get("archive/a2.md").unwrap();
    assert_eq!(record.last_reviewed, record.last_seen);
    assert!(h.session.catalog().find("archive/a2.md").is_some());
}

#[tokio::test]
async fn test_rename_migrates_skip_entry() {
    let mut h = Harness::new(DOCS, staggered()).await;
    h.session.initialize();
    h.load_quiz("quiz a").await;
    h.session.skip();

    h.source.rename("a.md", "a-renamed.md").unwrap();
    // The quiz request for b is still pending, so the rename arrives first.
    assert_eq!(h.session.wait_event().await, SessionEvent::DocumentsChanged);

    assert!(h.session.skipped().contains("a-renamed.md"));
    assert!(!h.session.skipped().contains("a.md"));
}

#[tokio::test]
async fn test_no_documents_then_created() {
    let mut h = Harness::new(&[], json!({})).await;

    assert!(h.session.initialize());
    assert_eq!(h.session.phase(), Phase::NoDocuments);
    assert!(h.session.current_document().is_none());

    h.source.create("fresh.md", "new note");
    assert_eq!(h.session.wait_event().await, SessionEvent::DocumentsChanged);

    assert!(h.session.initialize());
    assert_eq!(h.current(), Some("fresh.md"));
    h.load_quiz("quiz fresh").await;
}

#[tokio::test]
async fn test_display_is_published() {
    let mut h = Harness::new(DOCS, staggered()).await;
    let mut display = h.session.subscribe_display();

    h.session.initialize();
    assert!(display.has_changed().unwrap());
    {
        let state = display.borrow_and_update();
        assert_eq!(state.phase, Phase::Loading);
        assert!(state.is_loading);
        assert_eq!(state.current_document_path.as_deref(), Some("a.md"));
    }

    h.load_quiz("quiz a").await;
    let state = display.borrow_and_update();
    assert_eq!(state.phase, Phase::AwaitingAnswer);
    assert!(state.can_submit);
}
