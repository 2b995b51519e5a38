//! Turn-stepping state machine
//!
//! Every operation here is one load/mutate/save cycle against the session
//! store, run under the session's registry lock. A second concurrent step
//! or finalize on the same session fails fast with `SessionBusy` (409);
//! that policy is applied uniformly so two requests can never interleave
//! on the same loaded snapshot and silently discard one update.
//!
//! Injected user input commits before the engine call: a step with input
//! persists the user message and snapshot first, then asks the engine for
//! the next turn and commits again. An engine failure between the two
//! commits loses nothing — the input is durable and the request is
//! retryable from the last good snapshot.
//!
//! Methods are blocking (storage I/O plus engine calls that run retrieval
//! for seconds to minutes); HTTP handlers run them via `spawn_blocking`.

use crate::citations;
use crate::config::SecretsConfig;
use crate::engine::{resolve_retriever, EngineHandle, ResearchEngine, RuntimeConfig};
use crate::error::ApiError;
use crate::models::{msg_type, role, MessageView, ReportView, SessionSummary, Topic};
use crate::session::registry::{SessionGuard, SessionRegistry};
use crate::storage::sessions::{self, SessionFile, StoreError};
use crate::storage::topics;
use std::path::PathBuf;
use std::sync::Arc;

/// Result of one `step` call
#[derive(Debug, Clone, serde::Serialize)]
pub struct StepOutcome {
    pub response: String,
    pub role: String,
}

/// Result of session creation
#[derive(Debug, Clone, serde::Serialize)]
pub struct CreatedSession {
    pub session_id: String,
    pub topic_id: String,
}

/// Result of `finalize`
#[derive(Debug, Clone, serde::Serialize)]
pub struct FinalizedReport {
    pub report_id: u64,
    pub content: String,
}

pub struct StepController {
    data_dir: PathBuf,
    registry: SessionRegistry,
    engine: Arc<dyn ResearchEngine>,
    secrets: SecretsConfig,
}

impl StepController {
    pub fn new(data_dir: PathBuf, engine: Arc<dyn ResearchEngine>, secrets: SecretsConfig) -> Self {
        Self {
            data_dir,
            registry: SessionRegistry::new(),
            engine,
            secrets,
        }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Build the engine configuration fresh from topic args. The snapshot
    /// never stores this, so changed retriever settings apply to existing
    /// sessions on their next load.
    fn runtime_config(&self, topic: &Topic) -> Result<RuntimeConfig, ApiError> {
        let retriever = resolve_retriever(
            &topic.args.retriever,
            topic.args.retrieve_top_k,
            &self.secrets,
        )
        .map_err(|e| ApiError::InvalidInput(e.to_string()))?;

        Ok(RuntimeConfig {
            topic: topic.name.clone(),
            args: topic.args.clone(),
            retriever,
        })
    }

    fn map_store_error(&self, session_id: &str, err: StoreError) -> ApiError {
        match err {
            StoreError::NotFound => ApiError::NotFound("session"),
            StoreError::Corrupt(detail) => {
                log::error!("session {} has a corrupt document: {}", session_id, detail);
                ApiError::StateCorrupt(detail)
            }
            StoreError::Io(detail) => ApiError::Internal(detail),
        }
    }

    /// Load a session document and its topic, enforcing ownership.
    /// A session owned by someone else is indistinguishable from a
    /// missing one.
    fn load_owned(&self, user_id: &str, session_id: &str) -> Result<(SessionFile, Topic), ApiError> {
        let file = sessions::read_session_file(&self.data_dir, session_id)
            .map_err(|e| self.map_store_error(session_id, e))?;

        let topic = topics::read_owned_topic(&self.data_dir, &file.session.topic_id, user_id)
            .map_err(ApiError::Internal)?
            .ok_or(ApiError::NotFound("session"))?;

        Ok((file, topic))
    }

    /// Acquire the session's lock, checking existence first so bogus ids
    /// never grow the lock table. A session deleted between the check and
    /// the locked load still surfaces as `NotFound` from `load_owned`.
    fn lock(&self, session_id: &str) -> Result<SessionGuard, ApiError> {
        if !sessions::session_exists(&self.data_dir, session_id) {
            return Err(ApiError::NotFound("session"));
        }
        self.registry.acquire(session_id).ok_or(ApiError::SessionBusy)
    }

    fn rehydrate(
        &self,
        session_id: &str,
        file: &SessionFile,
        config: RuntimeConfig,
    ) -> Result<EngineHandle, ApiError> {
        EngineHandle::rehydrate(&file.snapshot, config, self.engine.clone()).map_err(|e| {
            log::error!("session {} snapshot rejected: {}", session_id, e);
            ApiError::StateCorrupt(e.to_string())
        })
    }

    /// Construct a fresh engine for a topic, warm-start it, and persist
    /// the initial snapshot plus a system notification message.
    pub fn create_session(&self, user_id: &str, topic_id: &str) -> Result<CreatedSession, ApiError> {
        let topic = topics::read_owned_topic(&self.data_dir, topic_id, user_id)
            .map_err(ApiError::Internal)?
            .ok_or(ApiError::NotFound("topic"))?;

        let config = self.runtime_config(&topic)?;
        let mut handle = EngineHandle::fresh(config, self.engine.clone());
        handle
            .warm_start()
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        let internal_id =
            sessions::allocate_session_id(&self.data_dir).map_err(ApiError::Internal)?;
        let session_id = uuid::Uuid::new_v4().to_string();

        let mut file = SessionFile::new(internal_id, &session_id, &topic.id, handle.snapshot());
        file.append_message(
            role::SYSTEM,
            &format!("New session started for topic: {}", topic.name),
            msg_type::NOTIFICATION,
        );
        sessions::save_session_file(&self.data_dir, file).map_err(ApiError::Internal)?;

        log::info!("created session {} under topic {}", session_id, topic.id);
        Ok(CreatedSession {
            session_id,
            topic_id: topic.id,
        })
    }

    /// One turn of the conversation: optionally inject a user utterance,
    /// then ask the engine for exactly one generated turn.
    pub fn step(
        &self,
        user_id: &str,
        session_id: &str,
        input: Option<&str>,
    ) -> Result<StepOutcome, ApiError> {
        let _guard = self.lock(session_id)?;

        let (mut file, topic) = self.load_owned(user_id, session_id)?;
        let config = self.runtime_config(&topic)?;
        let mut handle = self.rehydrate(session_id, &file, config)?;

        if let Some(text) = input {
            if text.trim().is_empty() {
                return Err(ApiError::InvalidInput(
                    "input must not be empty".to_string(),
                ));
            }
            handle.inject_utterance(text);
            file.append_message(role::USER, text, msg_type::TEXT);
            file.snapshot = handle.snapshot();
            // Commit point one: the injected input survives an engine
            // failure below.
            file = sessions::save_session_file(&self.data_dir, file).map_err(ApiError::Internal)?;
        }

        let turn = handle
            .advance()
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        file.append_message(&turn.role, &turn.utterance, msg_type::TEXT);
        file.snapshot = handle.snapshot();
        sessions::save_session_file(&self.data_dir, file).map_err(ApiError::Internal)?;

        Ok(StepOutcome {
            response: turn.utterance,
            role: turn.role,
        })
    }

    /// One-shot report generation, serialized against `step` by the same
    /// session lock. The generated text is passed through the citation
    /// engine before storage and return.
    pub fn finalize(&self, user_id: &str, session_id: &str) -> Result<FinalizedReport, ApiError> {
        let _guard = self.lock(session_id)?;

        let (mut file, topic) = self.load_owned(user_id, session_id)?;
        let config = self.runtime_config(&topic)?;
        let mut handle = self.rehydrate(session_id, &file, config)?;

        let raw = handle
            .finalize()
            .map_err(|e| ApiError::Upstream(e.to_string()))?;
        let content = citations::render_report(&raw);

        let report_id = file.append_report(&content);
        file.snapshot = handle.snapshot();
        sessions::save_session_file(&self.data_dir, file).map_err(ApiError::Internal)?;

        log::info!("session {} produced report {}", session_id, report_id);
        Ok(FinalizedReport { report_id, content })
    }

    /// Delete a topic with full cascade. Every doomed session's lock is
    /// acquired first, so an in-flight step cannot hit its commit point
    /// after the cascade and resurrect a deleted document; any held lock
    /// fails the whole delete with `SessionBusy`, same as a busy step.
    pub fn delete_topic(&self, user_id: &str, topic_id: &str) -> Result<(), ApiError> {
        let topic = topics::read_owned_topic(&self.data_dir, topic_id, user_id)
            .map_err(ApiError::Internal)?
            .ok_or(ApiError::NotFound("topic"))?;

        let doomed = sessions::list_sessions_for_topic(&self.data_dir, &topic.id)
            .map_err(ApiError::Internal)?;
        let mut guards = Vec::with_capacity(doomed.len());
        for summary in &doomed {
            guards.push(
                self.registry
                    .acquire(&summary.session_id)
                    .ok_or(ApiError::SessionBusy)?,
            );
        }

        let deleted = sessions::delete_sessions_for_topic(&self.data_dir, &topic.id)
            .map_err(ApiError::Internal)?;
        // The files are gone; registry entries can go too. A racer that
        // re-creates an entry for one of these ids only ever sees NotFound.
        drop(guards);
        for session_id in &deleted {
            self.registry.remove(session_id);
        }

        topics::delete_topic(&self.data_dir, &topic.id).map_err(ApiError::Internal)?;
        log::info!(
            "deleted topic {} and {} session(s)",
            topic.id,
            deleted.len()
        );
        Ok(())
    }

    /// Sessions of an owned topic, oldest first
    pub fn topic_sessions(
        &self,
        user_id: &str,
        topic_id: &str,
    ) -> Result<Vec<SessionSummary>, ApiError> {
        let topic = topics::read_owned_topic(&self.data_dir, topic_id, user_id)
            .map_err(ApiError::Internal)?
            .ok_or(ApiError::NotFound("topic"))?;
        sessions::list_sessions_for_topic(&self.data_dir, &topic.id).map_err(ApiError::Internal)
    }

    /// Messages of an owned session, ascending timestamp order
    pub fn messages(&self, user_id: &str, session_id: &str) -> Result<Vec<MessageView>, ApiError> {
        let (file, _) = self.load_owned(user_id, session_id)?;
        Ok(file.message_views())
    }

    /// Reports of an owned session, descending creation order
    pub fn reports(&self, user_id: &str, session_id: &str) -> Result<Vec<ReportView>, ApiError> {
        let (file, _) = self.load_owned(user_id, session_id)?;
        Ok(file.report_views())
    }

    #[cfg(test)]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ConvTurn, EngineError, EngineState};
    use crate::models::TopicArgs;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    const REPORT_TEXT: &str = "Findings [1] are notable [2].\n\n## References\n[1] [Title A](http://a.example)\n*snippet a*\n[2] [Title B](http://b.example)\n*snippet b*\n";

    /// Deterministic engine: speaks as alternating roles, fails on demand
    struct ScriptedEngine {
        fail_next: AtomicBool,
    }

    impl ScriptedEngine {
        fn new() -> Self {
            Self {
                fail_next: AtomicBool::new(false),
            }
        }

        fn fail_next_call(&self) {
            self.fail_next.store(true, Ordering::SeqCst);
        }

        fn check_failure(&self) -> Result<(), EngineError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                Err(EngineError::Request("retrieval timeout".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl ResearchEngine for ScriptedEngine {
        fn warm_start(
            &self,
            config: &RuntimeConfig,
            state: &mut EngineState,
        ) -> Result<(), EngineError> {
            self.check_failure()?;
            state.experts = (0..config.args.warmstart_max_num_experts)
                .map(|i| format!("expert-{}", i))
                .collect();
            Ok(())
        }

        fn next_turn(
            &self,
            _config: &RuntimeConfig,
            state: &mut EngineState,
        ) -> Result<ConvTurn, EngineError> {
            self.check_failure()?;
            let turn = ConvTurn {
                role: "expert".to_string(),
                utterance: format!("generated turn {}", state.history.len() + 1),
            };
            state.history.push(turn.clone());
            Ok(turn)
        }

        fn generate_report(
            &self,
            _config: &RuntimeConfig,
            _state: &mut EngineState,
        ) -> Result<String, EngineError> {
            self.check_failure()?;
            Ok(REPORT_TEXT.to_string())
        }
    }

    struct Fixture {
        _temp_dir: TempDir,
        controller: StepController,
        engine: Arc<ScriptedEngine>,
        topic_id: String,
    }

    fn setup() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        crate::storage::init_data_dir(temp_dir.path()).unwrap();

        let topic = Topic {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: "alice".to_string(),
            name: "Ocean iron fertilization".to_string(),
            created_at: Utc::now(),
            args: TopicArgs {
                retriever: "duckduckgo".to_string(),
                ..TopicArgs::default()
            },
        };
        topics::save_topic(temp_dir.path(), &topic).unwrap();

        let engine = Arc::new(ScriptedEngine::new());
        let controller = StepController::new(
            temp_dir.path().to_path_buf(),
            engine.clone(),
            SecretsConfig::default(),
        );

        Fixture {
            _temp_dir: temp_dir,
            controller,
            engine,
            topic_id: topic.id,
        }
    }

    #[test]
    fn test_create_session_persists_snapshot_and_notification() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();
        assert_eq!(created.topic_id, fx.topic_id);

        let messages = fx
            .controller
            .messages("alice", &created.session_id)
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].msg_type, "notification");
        assert!(messages[0].content.contains("Ocean iron fertilization"));

        // Warm-start output made it into the persisted snapshot
        let file = sessions::read_session_file(fx.controller.data_dir(), &created.session_id)
            .unwrap();
        let state = crate::engine::snapshot::decode(&file.snapshot).unwrap();
        assert_eq!(state.experts.len(), 3);
    }

    #[test]
    fn test_create_session_unknown_topic() {
        let fx = setup();
        assert!(matches!(
            fx.controller.create_session("alice", "nope"),
            Err(ApiError::NotFound("topic"))
        ));
        // Someone else's topic looks identical to a missing one
        assert!(matches!(
            fx.controller.create_session("bob", &fx.topic_id),
            Err(ApiError::NotFound("topic"))
        ));
    }

    #[test]
    fn test_create_session_unknown_retriever_rejected() {
        let fx = setup();
        let topic = Topic {
            id: "topic-bad".to_string(),
            user_id: "alice".to_string(),
            name: "Bad".to_string(),
            created_at: Utc::now(),
            args: TopicArgs {
                retriever: "google".to_string(),
                ..TopicArgs::default()
            },
        };
        topics::save_topic(fx.controller.data_dir(), &topic).unwrap();

        match fx.controller.create_session("alice", "topic-bad") {
            Err(ApiError::InvalidInput(message)) => assert!(message.contains("google")),
            other => panic!("expected InvalidInput, got {:?}", other.map(|c| c.session_id)),
        }
    }

    #[test]
    fn test_step_without_input_adds_one_message() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        let outcome = fx
            .controller
            .step("alice", &created.session_id, None)
            .unwrap();
        assert_eq!(outcome.role, "expert");

        let messages = fx.controller.messages("alice", &created.session_id).unwrap();
        assert_eq!(messages.len(), 2); // notification + generated turn
        assert_eq!(messages[1].content, outcome.response);
    }

    #[test]
    fn test_step_with_input_adds_two_messages_in_order() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        fx.controller
            .step("alice", &created.session_id, Some("what about costs?"))
            .unwrap();

        let messages = fx.controller.messages("alice", &created.session_id).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "what about costs?");
        assert_eq!(messages[2].role, "expert");

        // Timestamps are non-decreasing in canonical order
        for pair in messages.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_sequential_steps_keep_ordering() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        for i in 0..4 {
            let input = if i % 2 == 0 { Some("user says") } else { None };
            fx.controller.step("alice", &created.session_id, input).unwrap();
        }

        let messages = fx.controller.messages("alice", &created.session_id).unwrap();
        // notification + 2 * (user + reply) + 2 * reply
        assert_eq!(messages.len(), 1 + 2 + 1 + 2 + 1);
        for pair in messages.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_step_empty_input_rejected() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        assert!(matches!(
            fx.controller.step("alice", &created.session_id, Some("  ")),
            Err(ApiError::InvalidInput(_))
        ));

        // Nothing was appended
        let messages = fx.controller.messages("alice", &created.session_id).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_step_unknown_session() {
        let fx = setup();
        assert!(matches!(
            fx.controller.step("alice", "missing", None),
            Err(ApiError::NotFound("session"))
        ));
    }

    #[test]
    fn test_step_busy_session_fails_fast() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        let _held = fx.controller.registry().acquire(&created.session_id).unwrap();

        assert!(matches!(
            fx.controller.step("alice", &created.session_id, Some("hello")),
            Err(ApiError::SessionBusy)
        ));
        assert!(matches!(
            fx.controller.finalize("alice", &created.session_id),
            Err(ApiError::SessionBusy)
        ));

        // No partial update happened while busy
        let messages = fx.controller.messages("alice", &created.session_id).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_engine_failure_leaves_prior_state() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();
        fx.controller.step("alice", &created.session_id, None).unwrap();

        let before = sessions::read_session_file(fx.controller.data_dir(), &created.session_id)
            .unwrap();

        fx.engine.fail_next_call();
        assert!(matches!(
            fx.controller.step("alice", &created.session_id, None),
            Err(ApiError::Upstream(_))
        ));

        let after = sessions::read_session_file(fx.controller.data_dir(), &created.session_id)
            .unwrap();
        assert_eq!(after.messages.len(), before.messages.len());
        assert_eq!(after.snapshot, before.snapshot);

        // Retry succeeds against the intact snapshot
        fx.controller.step("alice", &created.session_id, None).unwrap();
    }

    #[test]
    fn test_engine_failure_keeps_injected_input() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        fx.engine.fail_next_call();
        assert!(matches!(
            fx.controller
                .step("alice", &created.session_id, Some("keep me")),
            Err(ApiError::Upstream(_))
        ));

        // The injected utterance committed before the engine call
        let messages = fx.controller.messages("alice", &created.session_id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "keep me");

        let file = sessions::read_session_file(fx.controller.data_dir(), &created.session_id)
            .unwrap();
        let state = crate::engine::snapshot::decode(&file.snapshot).unwrap();
        assert_eq!(state.history.last().unwrap().utterance, "keep me");
    }

    #[test]
    fn test_corrupt_snapshot_is_state_corrupt() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        let mut file = sessions::read_session_file(fx.controller.data_dir(), &created.session_id)
            .unwrap();
        file.snapshot = serde_json::json!({"version": 99, "state": {}});
        sessions::save_session_file(fx.controller.data_dir(), file).unwrap();

        assert!(matches!(
            fx.controller.step("alice", &created.session_id, None),
            Err(ApiError::StateCorrupt(_))
        ));
    }

    #[test]
    fn test_finalize_links_citations_and_persists_report() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        let finalized = fx.controller.finalize("alice", &created.session_id).unwrap();
        assert_eq!(finalized.report_id, 1);
        assert!(finalized
            .content
            .contains(r#"<sup><a href="http://a.example" target="_blank">[1]</a></sup>"#));
        assert!(finalized.content.contains("## References"));

        let reports = fx.controller.reports("alice", &created.session_id).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].content, finalized.content);
    }

    #[test]
    fn test_reports_listed_latest_first() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        let first = fx.controller.finalize("alice", &created.session_id).unwrap();
        let second = fx.controller.finalize("alice", &created.session_id).unwrap();
        assert!(second.report_id > first.report_id);

        let reports = fx.controller.reports("alice", &created.session_id).unwrap();
        assert_eq!(reports[0].id, second.report_id);
    }

    #[test]
    fn test_delete_topic_cascades() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        fx.controller.delete_topic("alice", &fx.topic_id).unwrap();

        assert!(matches!(
            fx.controller.step("alice", &created.session_id, None),
            Err(ApiError::NotFound("session"))
        ));
        assert!(topics::read_topic(fx.controller.data_dir(), &fx.topic_id)
            .unwrap()
            .is_none());
        assert!(!sessions::session_exists(
            fx.controller.data_dir(),
            &created.session_id
        ));
        assert_eq!(fx.controller.registry().len(), 0);
    }

    #[test]
    fn test_delete_topic_with_busy_session_fails_fast() {
        let fx = setup();
        let created = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        // A step in flight holds the session lock; the cascade must not
        // pull the file out from under it.
        let held = fx.controller.registry().acquire(&created.session_id).unwrap();

        assert!(matches!(
            fx.controller.delete_topic("alice", &fx.topic_id),
            Err(ApiError::SessionBusy)
        ));
        assert!(topics::read_topic(fx.controller.data_dir(), &fx.topic_id)
            .unwrap()
            .is_some());
        assert!(sessions::session_exists(
            fx.controller.data_dir(),
            &created.session_id
        ));

        // Once the in-flight operation finishes, the cascade goes through
        drop(held);
        fx.controller.delete_topic("alice", &fx.topic_id).unwrap();
        assert!(!sessions::session_exists(
            fx.controller.data_dir(),
            &created.session_id
        ));
        assert_eq!(fx.controller.registry().len(), 0);
    }

    #[test]
    fn test_bogus_session_id_does_not_grow_lock_table() {
        let fx = setup();

        for i in 0..5 {
            assert!(matches!(
                fx.controller.step("alice", &format!("ghost-{}", i), None),
                Err(ApiError::NotFound("session"))
            ));
        }
        assert!(matches!(
            fx.controller.finalize("alice", "ghost-x"),
            Err(ApiError::NotFound("session"))
        ));

        assert_eq!(fx.controller.registry().len(), 0);
    }

    #[test]
    fn test_topic_sessions_listing() {
        let fx = setup();
        let first = fx.controller.create_session("alice", &fx.topic_id).unwrap();
        let second = fx.controller.create_session("alice", &fx.topic_id).unwrap();

        let summaries = fx.controller.topic_sessions("alice", &fx.topic_id).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].session_id, first.session_id);
        assert_eq!(summaries[1].session_id, second.session_id);
        assert_eq!(summaries[0].message_count, 1);
        assert!(summaries[0]
            .last_message
            .as_deref()
            .unwrap()
            .contains("New session started"));
    }
}
