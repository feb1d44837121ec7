//! The review session controller.
//!
//! A [`ReviewSession`] is driven from one task. User actions (`initialize`,
//! `skip`, `submit`, `next`, `retry`, `abort`) return immediately; slow work
//! runs in spawned tasks that report back through a channel. Results are
//! applied by [`ReviewSession::apply`] only if they belong to the active
//! request, so a late reply can never touch a newer document.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::documents::DocumentCatalog;
use crate::error::{IngrainError, IngrainResult};
use crate::events::{DocumentEvent, DocumentSubscriber};
use crate::session::state::{DisplayState, Phase, SessionState};
use crate::store::ReviewRecordStore;
use crate::traits::{DocumentSource, Generation, QuizGenerator};
use crate::types::{DocumentHandle, Message};

/// One outstanding request.
struct Ticket {
    id: u64,
    token: CancellationToken,
}

/// Result of a background request, tagged with the request that produced it.
#[derive(Debug)]
pub struct Completion {
    pub request_id: u64,
    pub document_path: String,
    pub outcome: Outcome,
}

#[derive(Debug)]
pub enum Outcome {
    Quiz {
        prompt: String,
        result: IngrainResult<Generation>,
    },
    FollowUp {
        answer: String,
        result: IngrainResult<Generation>,
    },
}

/// Something for the session to apply.
#[derive(Debug)]
pub enum Inbound {
    Completion(Completion),
    Document(DocumentEvent),
}

/// What [`ReviewSession::apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A request result changed the session.
    Applied,
    /// A result for a cancelled or superseded request was dropped.
    Discarded,
    /// The document set changed.
    DocumentsChanged,
}

/// Interactive review over a document set.
pub struct ReviewSession {
    source: Arc<dyn DocumentSource>,
    generator: Arc<dyn QuizGenerator>,
    catalog: DocumentCatalog,
    state: SessionState,
    active: Option<Ticket>,
    next_request_id: u64,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    document_events: Option<DocumentSubscriber>,
    display_tx: watch::Sender<DisplayState>,
}

impl ReviewSession {
    /// Build a session over `source`, listing its documents and subscribing
    /// to its change notifications.
    pub async fn open(
        source: Arc<dyn DocumentSource>,
        store: Arc<ReviewRecordStore>,
        generator: Arc<dyn QuizGenerator>,
    ) -> IngrainResult<Self> {
        // Subscribe before listing so no change slips between the two.
        let document_events = source.subscribe();
        let catalog = DocumentCatalog::load(source.as_ref(), store).await?;
        let mut session = Self::with_catalog(source, catalog, generator);
        session.document_events = document_events;
        tracing::info!(documents = session.catalog.len(), "Review session opened");
        Ok(session)
    }

    /// Build a session over an existing catalog, without event subscription.
    pub fn with_catalog(
        source: Arc<dyn DocumentSource>,
        catalog: DocumentCatalog,
        generator: Arc<dyn QuizGenerator>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (display_tx, _) = watch::channel(DisplayState::default());
        Self {
            source,
            generator,
            catalog,
            state: SessionState::new(),
            active: None,
            next_request_id: 0,
            completions_tx,
            completions_rx,
            document_events: None,
            display_tx,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn current_document(&self) -> Option<&DocumentHandle> {
        self.state.current.as_ref()
    }

    pub fn transcript(&self) -> &[Message] {
        &self.state.transcript
    }

    pub fn skipped(&self) -> &HashSet<String> {
        &self.state.skipped
    }

    pub fn catalog(&self) -> &DocumentCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &Arc<ReviewRecordStore> {
        self.catalog.store()
    }

    /// Whether a quiz or follow-up request is outstanding.
    pub fn has_pending_request(&self) -> bool {
        self.active.is_some()
    }

    /// Current display state.
    pub fn display(&self) -> DisplayState {
        self.state.display()
    }

    /// Watch display state changes.
    pub fn subscribe_display(&self) -> watch::Receiver<DisplayState> {
        self.display_tx.subscribe()
    }

    /// Pick the oldest document and start its quiz.
    ///
    /// Allowed from `Idle`, and from `NoDocuments` so a host can try again
    /// once documents exist. Must run inside a tokio runtime.
    pub fn initialize(&mut self) -> bool {
        if !matches!(self.state.phase, Phase::Idle | Phase::NoDocuments) {
            return false;
        }
        match self.catalog.select(&HashSet::new()) {
            Some(selection) => self.start_quiz(selection.document),
            None => self.enter_no_documents(),
        }
        true
    }

    /// Skip the current document for the rest of the session.
    ///
    /// Only allowed while waiting for an answer. When every document has been
    /// skipped the skip-set is cleared and selection starts over.
    pub fn skip(&mut self) -> bool {
        if !self.state.can_skip() {
            return false;
        }
        if let Some(path) = self.state.current_path() {
            self.state.skipped.insert(path.to_string());
        }
        self.cancel_active();

        match self.catalog.select(&self.state.skipped) {
            Some(selection) => {
                if selection.fell_back {
                    tracing::debug!("Every document skipped, clearing skip-set");
                    self.state.skipped.clear();
                }
                self.start_quiz(selection.document);
            }
            None => self.enter_no_documents(),
        }
        true
    }

    /// Send the user's answer. Ignored unless a quiz is waiting for an
    /// answer and the trimmed answer is non-empty.
    pub fn submit(&mut self, answer: &str) -> bool {
        if !self.state.begin_submit(answer) {
            return false;
        }
        let Some(document) = self.state.current.clone() else {
            return false;
        };

        let ticket = self.issue_ticket();
        let request_id = ticket.id;
        let token = ticket.token.clone();
        self.active = Some(ticket);

        let generator = self.generator.clone();
        let tx = self.completions_tx.clone();
        let transcript = self.state.transcript.clone();
        let answer = answer.to_string();

        tracing::debug!(path = %document.path, request_id, "Submitting answer");
        tokio::spawn(async move {
            let result = generator.send_follow_up(&transcript, &answer, &token).await;
            let _ = tx.send(Completion {
                request_id,
                document_path: document.path,
                outcome: Outcome::FollowUp { answer, result },
            });
        });

        self.publish();
        true
    }

    /// Move on after an answered quiz, avoiding this document and anything
    /// skipped. The skip-set is kept.
    pub fn next(&mut self) -> bool {
        if !self.state.can_advance() {
            return false;
        }
        self.cancel_active();

        let mut exclude = self.state.skipped.clone();
        if let Some(path) = self.state.current_path() {
            exclude.insert(path.to_string());
        }

        match self.catalog.select(&exclude) {
            Some(selection) => self.start_quiz(selection.document),
            None => self.enter_no_documents(),
        }
        true
    }

    /// Regenerate the quiz for the current document, for example after a
    /// configuration error has been fixed.
    pub fn retry(&mut self) -> bool {
        if self.state.phase != Phase::AwaitingAnswer {
            return false;
        }
        let Some(document) = self.state.current.clone() else {
            return false;
        };
        self.start_quiz(document);
        true
    }

    /// Cancel the outstanding request, if any. A session that was loading or
    /// submitting goes back to waiting for an answer.
    pub fn abort(&mut self) -> bool {
        if !self.cancel_active() {
            return false;
        }
        if self.state.interrupt() {
            tracing::debug!(phase = %self.state.phase, "Request aborted");
            self.publish();
        }
        true
    }

    /// Wait for the next completion or document event. Cancel-safe: nothing
    /// is applied until [`apply`](Self::apply) is called.
    pub async fn recv_inbound(&mut self) -> Inbound {
        loop {
            // The session keeps a sender, so the completion channel never closes.
            let received = tokio::select! {
                Some(completion) = self.completions_rx.recv() => Received::Completion(completion),
                event = next_document_event(&mut self.document_events) => Received::Document(event),
            };

            match received {
                Received::Completion(completion) => return Inbound::Completion(completion),
                Received::Document(Some(event)) => return Inbound::Document(event),
                Received::Document(None) => {
                    tracing::debug!("Document event source closed");
                    self.document_events = None;
                }
            }
        }
    }

    /// Apply something received by [`recv_inbound`](Self::recv_inbound).
    pub async fn apply(&mut self, inbound: Inbound) -> SessionEvent {
        match inbound {
            Inbound::Completion(completion) => self.apply_completion(completion).await,
            Inbound::Document(event) => {
                self.on_document_event(event).await;
                SessionEvent::DocumentsChanged
            }
        }
    }

    /// Receive and apply one inbound item.
    pub async fn wait_event(&mut self) -> SessionEvent {
        let inbound = self.recv_inbound().await;
        self.apply(inbound).await
    }

    /// Apply a host document notification.
    ///
    /// Renaming the current document re-points the session at the new path,
    /// so the eventual review is recorded there.
    pub async fn on_document_event(&mut self, event: DocumentEvent) {
        self.catalog.apply(&event).await;

        if let DocumentEvent::Renamed { old_path, handle } = &event {
            if self.state.skipped.remove(old_path) {
                self.state.skipped.insert(handle.path.clone());
            }
            if self.state.current_path() == Some(old_path.as_str()) {
                tracing::debug!(old_path = %old_path, new_path = %handle.path, "Current document renamed");
                self.state.current = Some(handle.clone());
                self.publish();
            }
        }
    }

    async fn apply_completion(&mut self, completion: Completion) -> SessionEvent {
        let is_active = self.active.as_ref().is_some_and(|ticket| {
            ticket.id == completion.request_id && !ticket.token.is_cancelled()
        });
        if !is_active {
            tracing::debug!(
                request_id = completion.request_id,
                path = %completion.document_path,
                "Discarding stale response"
            );
            return SessionEvent::Discarded;
        }
        self.active = None;

        match completion.outcome {
            Outcome::Quiz { prompt, result } => match result {
                Ok(Generation::Reply(quiz)) => {
                    self.state.accept_quiz(prompt, quiz);
                }
                Ok(Generation::Cancelled) => {
                    self.state.interrupt();
                }
                Err(e) => {
                    tracing::warn!(path = %completion.document_path, "Quiz generation failed: {}", e);
                    self.state.fail_loading(error_text(&e));
                }
            },
            Outcome::FollowUp { answer, result } => match result {
                Ok(Generation::Reply(reply)) => {
                    // Record against the current handle; it may have been renamed.
                    if let Some(path) = self.state.current_path().map(str::to_string) {
                        self.catalog.store().mark_reviewed(&path).await;
                    }
                    self.state.accept_answer(answer, reply);
                }
                Ok(Generation::Cancelled) => {
                    self.state.interrupt();
                }
                Err(e) => {
                    tracing::warn!(path = %completion.document_path, "Follow-up failed: {}", e);
                    self.state.fail_submit(error_text(&e));
                }
            },
        }

        tracing::debug!(
            path = ?self.state.current_path(),
            phase = %self.state.phase,
            "Session transition"
        );
        self.publish();
        SessionEvent::Applied
    }

    fn start_quiz(&mut self, document: DocumentHandle) {
        self.cancel_active();
        self.state.begin_loading(document.clone());

        let ticket = self.issue_ticket();
        let request_id = ticket.id;
        let token = ticket.token.clone();
        self.active = Some(ticket);

        let source = self.source.clone();
        let generator = self.generator.clone();
        let tx = self.completions_tx.clone();

        tracing::debug!(path = %document.path, request_id, "Generating quiz");
        tokio::spawn(async move {
            let content = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                content = source.read_content(&document) => content,
            };

            let outcome = match content {
                Ok(content) => {
                    let prompt = generator.quiz_prompt(&content);
                    let result = generator.generate_quiz(&content, &token).await;
                    Outcome::Quiz { prompt, result }
                }
                Err(e) => Outcome::Quiz {
                    prompt: String::new(),
                    result: Err(e),
                },
            };

            let _ = tx.send(Completion {
                request_id,
                document_path: document.path,
                outcome,
            });
        });

        self.publish();
    }

    fn enter_no_documents(&mut self) {
        tracing::info!("No documents to review");
        self.state.no_documents();
        self.publish();
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_request_id += 1;
        Ticket {
            id: self.next_request_id,
            token: CancellationToken::new(),
        }
    }

    // Cancels and forgets the active ticket. Returns whether there was one.
    fn cancel_active(&mut self) -> bool {
        match self.active.take() {
            Some(ticket) => {
                ticket.token.cancel();
                true
            }
            None => false,
        }
    }

    fn publish(&self) {
        self.display_tx.send_replace(self.state.display());
    }
}

enum Received {
    Completion(Completion),
    Document(Option<DocumentEvent>),
}

async fn next_document_event(events: &mut Option<DocumentSubscriber>) -> Option<DocumentEvent> {
    match events {
        Some(subscriber) => subscriber.recv().await,
        None => std::future::pending().await,
    }
}

fn error_text(error: &IngrainError) -> String {
    format!("Error: {}", error)
}
