//! Application state: live quiz sessions, the shared mastery ledger, the
//! storage collaborator and the random source.
//!
//! This module owns:
//!   - sessions by id (one per HTTP client session or WebSocket connection),
//!     pruned after `session_idle_secs` without activity
//!   - the ledger, read from storage once at startup
//!   - the store, written with the full ledger after every mutation
//!   - the random source (seeded from config when `rng_seed` is set)
//!
//! Lock order is always sessions, then ledger. The ledger write guard is held
//! until the save returns, so saves reach the store in mutation order.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use rand::{rngs::StdRng, SeedableRng};
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::QuizConfig;
use crate::domain::SessionState;
use crate::generator::generate_prompt;
use crate::ledger::{MasteryLedger, ReviewEntry};
use crate::logic::{self, Outcome};
use crate::storage::{FileStore, LedgerStore};

/// Result of an advance request on a known session.
#[derive(Clone, Debug)]
pub enum Advance {
    Moved(SessionState),
    /// Round not resolved yet; state unchanged.
    Pending(SessionState),
}

/// A live session and when it was last started, answered or advanced.
#[derive(Clone, Debug)]
pub struct SessionEntry {
    pub state: SessionState,
    pub touched: Instant,
}

impl SessionEntry {
    pub fn new(state: SessionState) -> Self {
        Self { state, touched: Instant::now() }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    pub ledger: Arc<RwLock<MasteryLedger>>,
    pub store: Arc<dyn LedgerStore>,
    pub config: QuizConfig,
    rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    /// Build state with the file-backed ledger slot named in config.
    #[instrument(level = "info", skip_all)]
    pub async fn new(config: QuizConfig) -> Self {
        let store = FileStore::new(&config.ledger_dir, &config.ledger_slot);
        info!(target: "conjuga_backend", path = %store.path().display(), "Using file ledger slot");
        Self::with_store(config, Arc::new(store)).await
    }

    /// Build state on any store. Reads the ledger once; failures start empty.
    #[instrument(level = "info", skip_all)]
    pub async fn with_store(config: QuizConfig, store: Arc<dyn LedgerStore>) -> Self {
        let raw = match store.load().await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(target: "quiz", error = %e, "Ledger load failed; starting empty");
                None
            }
        };
        let ledger = MasteryLedger::decode(raw.as_deref());
        info!(target: "quiz", entries = ledger.len(), mastered = ledger.mastered_count(), "Startup ledger inventory");

        let rng = match config.rng_seed {
            Some(seed) => {
                info!(target: "conjuga_backend", seed, "Seeded prompt generation");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ledger: Arc::new(RwLock::new(ledger)),
            store,
            config,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut guard = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Open a session on a fresh prompt, dropping sessions idle past the limit.
    #[instrument(level = "info", skip(self))]
    pub async fn start_session(&self) -> (String, SessionState) {
        let id = Uuid::new_v4().to_string();
        let state = SessionState::new(self.with_rng(|rng| generate_prompt(rng)));
        let idle = Duration::from_secs(self.config.session_idle_secs);
        {
            let mut sessions = self.sessions.write().await;
            let before = sessions.len();
            sessions.retain(|_, entry| entry.touched.elapsed() < idle);
            let pruned = before - sessions.len();
            if pruned > 0 {
                info!(target: "quiz", pruned, live = sessions.len(), "Idle sessions dropped");
            }
            sessions.insert(id.clone(), SessionEntry::new(state.clone()));
        }
        info!(target: "quiz", session = %id, verb = state.prompt.verb.infinitive, tense = state.prompt.tense.name(), "Session started");
        (id, state)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn session(&self, id: &str) -> Option<SessionState> {
        self.sessions.read().await.get(id).map(|entry| entry.state.clone())
    }

    /// Forget a session. Returns false if it was unknown.
    #[instrument(level = "debug", skip(self))]
    pub async fn end_session(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Evaluate a submission, apply the ledger write and persist it.
    /// `None` for an unknown session.
    #[instrument(level = "info", skip(self, answer), fields(answer_len = answer.len()))]
    pub async fn submit_answer(&self, id: &str, answer: &str) -> Option<Outcome> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        let mut ledger = self.ledger.write().await;

        let prior = ledger.get(&crate::ledger::ledger_key(&entry.state.prompt));
        let outcome = self.with_rng(|rng| logic::submit_answer(&entry.state, prior, answer, &self.config, rng));
        entry.state = outcome.state.clone();
        entry.touched = Instant::now();
        drop(sessions);

        info!(target: "quiz", session = %id, verdict = ?outcome.verdict, score = outcome.state.score, streak = outcome.state.streak, "Answer evaluated");
        if let Some(m) = &outcome.milestone {
            info!(target: "quiz", session = %id, streak = m.streak, "Streak milestone");
        }

        if let Some(write) = &outcome.ledger_write {
            ledger.put(write.key.clone(), write.record);
            match ledger.encode() {
                Ok(raw) => self.persist(&raw).await,
                Err(e) => error!(target: "quiz", error = %e, "Ledger encode failed; write skipped"),
            }
        }
        Some(outcome)
    }

    /// Move a resolved session to a fresh prompt. `None` for an unknown session.
    #[instrument(level = "info", skip(self))]
    pub async fn advance(&self, id: &str) -> Option<Advance> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.touched = Instant::now();
        let current = entry.state.clone();
        match self.with_rng(|rng| logic::advance(&current, rng)) {
            Some(next) => {
                entry.state = next.clone();
                info!(target: "quiz", session = %id, verb = next.prompt.verb.infinitive, tense = next.prompt.tense.name(), "Advanced to next prompt");
                Some(Advance::Moved(next))
            }
            None => {
                warn!(target: "quiz", session = %id, "Advance refused; round not resolved");
                Some(Advance::Pending(current))
            }
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn review(&self) -> Vec<ReviewEntry> {
        self.ledger
            .read()
            .await
            .review(self.config.mastery_threshold, self.config.learning_threshold)
    }

    /// Full overwrite of the slot. Failures are logged, not retried.
    async fn persist(&self, raw: &str) {
        if let Err(e) = self.store.save(raw).await {
            error!(target: "quiz", error = %e, "Ledger save failed; progress not persisted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MasteryRecord, Mode, Prompt, Pronoun, Tense};
    use crate::logic::Verdict;
    use crate::seeds::verb_by_infinitive;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn seeded() -> QuizConfig {
        QuizConfig { rng_seed: Some(1), ..QuizConfig::default() }
    }

    async fn pin_prompt(app: &AppState, id: &str, verb: &str, tense: Tense, pronoun: Pronoun) {
        let prompt = Prompt { verb: verb_by_infinitive(verb).expect("verb"), tense, pronoun };
        app.sessions.write().await.insert(id.to_string(), SessionEntry::new(SessionState::new(prompt)));
    }

    /// Memory slot whose first save yields repeatedly before writing.
    #[derive(Default)]
    struct SlowFirstSave {
        inner: MemoryStore,
        started: AtomicBool,
    }

    #[async_trait]
    impl LedgerStore for SlowFirstSave {
        async fn load(&self) -> crate::storage::Result<Option<String>> {
            self.inner.load().await
        }

        async fn save(&self, raw: &str) -> crate::storage::Result<()> {
            if !self.started.swap(true, Ordering::SeqCst) {
                for _ in 0..50 {
                    tokio::task::yield_now().await;
                }
            }
            self.inner.save(raw).await
        }
    }

    #[tokio::test]
    async fn fresh_key_correct_answer_is_persisted() {
        let store = Arc::new(MemoryStore::default());
        let app = AppState::with_store(seeded(), store.clone()).await;
        pin_prompt(&app, "s1", "hablar", Tense::Presente, Pronoun::Yo).await;

        let out = app.submit_answer("s1", "hablo").await.expect("session");
        assert!(out.correct);
        assert!(out.state.resolved);
        assert_eq!(out.state.mode, Mode::Conjugation);

        let ledger = app.ledger.read().await.clone();
        assert_eq!(
            ledger.get("hablar-Presente-yo"),
            MasteryRecord { correct_count: 1, total_attempts: 1, mastered: false }
        );
        assert_eq!(store.save_count(), 1);
        let saved = store.snapshot().await.expect("slot");
        assert_eq!(MasteryLedger::decode(Some(&saved)), ledger);
    }

    #[tokio::test]
    async fn stored_progress_unlocks_sentence_mode() {
        let raw = r#"{"comer-Pretérito-tú":{"correctCount":6,"totalAttempts":6,"mastered":false}}"#;
        let store = Arc::new(MemoryStore::with_slot(raw));
        let app = AppState::with_store(seeded(), store.clone()).await;
        pin_prompt(&app, "s1", "comer", Tense::Preterito, Pronoun::Tu).await;

        let out = app.submit_answer("s1", "comiste").await.expect("session");
        assert_eq!(out.verdict, Verdict::MasteryUnlocked);
        assert!(out.revealed.is_none());
        assert_eq!(out.state.mode, Mode::Sentence);

        let rec = app.ledger.read().await.get("comer-Pretérito-tú");
        assert_eq!(rec, MasteryRecord { correct_count: 7, total_attempts: 7, mastered: true });

        let sentence = app.submit_answer("s1", "Tú comiste en la casa.").await.expect("session");
        assert_eq!(sentence.verdict, Verdict::SentencePassed);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn strike_does_not_write_the_ledger() {
        let store = Arc::new(MemoryStore::default());
        let app = AppState::with_store(seeded(), store.clone()).await;
        pin_prompt(&app, "s1", "vivir", Tense::Futuro, Pronoun::Yo).await;

        let out = app.submit_answer("s1", "vivo").await.expect("session");
        assert_eq!(out.verdict, Verdict::Strike);
        assert_eq!(store.save_count(), 0);
        assert_eq!(app.ledger.read().await.len(), 0);

        let out = app.submit_answer("s1", "vivo").await.expect("session");
        assert_eq!(out.verdict, Verdict::Revealed);
        assert_eq!(store.save_count(), 1);
        assert_eq!(
            app.ledger.read().await.get("vivir-Futuro-yo"),
            MasteryRecord { correct_count: 0, total_attempts: 1, mastered: false }
        );
    }

    #[tokio::test]
    async fn corrupt_slot_starts_empty() {
        let store = Arc::new(MemoryStore::with_slot("not json"));
        let app = AppState::with_store(seeded(), store).await;
        assert!(app.review().await.is_empty());
    }

    #[tokio::test]
    async fn advance_waits_for_resolution() {
        let app = AppState::with_store(seeded(), Arc::new(MemoryStore::default())).await;
        pin_prompt(&app, "s1", "hablar", Tense::Presente, Pronoun::Yo).await;

        assert!(matches!(app.advance("s1").await, Some(Advance::Pending(_))));
        app.submit_answer("s1", "hablo").await.expect("session");
        match app.advance("s1").await {
            Some(Advance::Moved(next)) => {
                assert!(!next.resolved);
                assert_eq!(next.score, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(app.advance("missing").await.is_none());
        assert!(app.submit_answer("missing", "x").await.is_none());
    }

    #[tokio::test]
    async fn seeded_sessions_replay_the_same_prompts() {
        let a = AppState::with_store(seeded(), Arc::new(MemoryStore::default())).await;
        let b = AppState::with_store(seeded(), Arc::new(MemoryStore::default())).await;
        for _ in 0..5 {
            assert_eq!(a.start_session().await.1.prompt, b.start_session().await.1.prompt);
        }
    }

    #[tokio::test]
    async fn concurrent_answers_reach_the_slot_in_order() {
        let store = Arc::new(SlowFirstSave::default());
        let app = AppState::with_store(seeded(), store.clone()).await;
        pin_prompt(&app, "a", "hablar", Tense::Presente, Pronoun::Yo).await;
        pin_prompt(&app, "b", "comer", Tense::Presente, Pronoun::Yo).await;

        let (a, b) = tokio::join!(app.submit_answer("a", "hablo"), app.submit_answer("b", "como"));
        assert!(a.expect("session").correct);
        assert!(b.expect("session").correct);

        let memory = app.ledger.read().await.clone();
        assert_eq!(memory.len(), 2);
        let saved = store.inner.snapshot().await.expect("slot");
        assert_eq!(MasteryLedger::decode(Some(&saved)), memory);
        assert_eq!(store.inner.save_count(), 2);
    }

    #[tokio::test]
    async fn idle_sessions_are_dropped_on_start() {
        let config = QuizConfig { session_idle_secs: 0, ..seeded() };
        let app = AppState::with_store(config, Arc::new(MemoryStore::default())).await;
        let (first, _) = app.start_session().await;
        let (second, _) = app.start_session().await;

        assert!(app.session(&first).await.is_none());
        assert!(app.session(&second).await.is_some());
        assert_eq!(app.sessions.read().await.len(), 1);
    }

    #[tokio::test]
    async fn active_sessions_survive_and_can_be_ended() {
        let app = AppState::with_store(seeded(), Arc::new(MemoryStore::default())).await;
        let (first, _) = app.start_session().await;
        let (second, _) = app.start_session().await;
        assert_eq!(app.sessions.read().await.len(), 2);

        assert!(app.end_session(&first).await);
        assert!(!app.end_session(&first).await);
        assert!(app.session(&second).await.is_some());
    }
}
