use crate::ai::GameAI;
use crate::app_state::{Phase, SessionState};
use crate::error::{AppError, Result};
use crate::game_state::SessionConfig;
use crate::message::{ChatMessage, Message, QuestionOption, Transcript};
use crate::progression::{Completion, ProgressionTracker};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

// Everything that belongs to one play session. Replaced wholesale on reset, so results
// of requests started for an older session can be recognised by their id and dropped.
#[derive(Debug)]
struct Session {
    id: Uuid,
    token: CancellationToken,
    config: Option<Arc<SessionConfig>>,
    level_id: Option<String>,
    transcript: Transcript,
    options: Vec<QuestionOption>,
    state: SessionState,
    has_won: bool,
    options_in_flight: usize,
    options_seq: u64, // Latest options request; only it may replace `options`.
    error: Option<String>,
}

impl Session {
    fn new(config: Option<Arc<SessionConfig>>, level_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            token: CancellationToken::new(),
            config,
            level_id,
            transcript: Transcript::new(),
            options: Vec::new(),
            state: SessionState::Uninitialized,
            has_won: false,
            options_in_flight: 0,
            options_seq: 0,
            error: None,
        }
    }

    // Abandons every request still running for this session.
    fn rotate(&mut self) {
        self.token.cancel();
        self.id = Uuid::new_v4();
        self.token = CancellationToken::new();
        self.options_in_flight = 0;
    }

    fn begin_options(&mut self) -> u64 {
        self.options_in_flight += 1;
        self.options_seq += 1;
        self.options_seq
    }

    // Returns false when a newer request superseded `seq` and its result was dropped.
    fn settle_options(&mut self, seq: u64, result: &Result<Vec<QuestionOption>>) -> bool {
        self.options_in_flight = self.options_in_flight.saturating_sub(1);
        if seq != self.options_seq {
            log::debug!("Dropping options of superseded request {}", seq);
            return false;
        }
        match result {
            Ok(options) => self.options = options.clone(),
            Err(e) => {
                log::warn!("Option generation failed: {}", e);
                self.error = Some(e.to_string());
            }
        }
        true
    }

    fn config(&self) -> Result<Arc<SessionConfig>> {
        self.config
            .clone()
            .ok_or_else(|| AppError::validation("no session loaded"))
    }
}

/// Read-only copy of a session for display.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub config: Option<Arc<SessionConfig>>,
    pub level_id: Option<String>,
    pub messages: Vec<Message>,
    pub options: Vec<QuestionOption>,
    pub state: SessionState,
    pub phase: Phase,
    pub has_won: bool,
    pub is_generating_options: bool,
    pub error: Option<String>,
}

/// What one submitted turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub answer: String,
    pub adequate: bool,
    pub newly_won: bool,                // First adequate answer of this session.
    pub completion: Option<Completion>, // Set when the win completed the bound level.
    pub elaboration: Option<String>,
}

/// Drives one conversation: greeting, turns, options, undo and win detection.
///
/// The session lock is only held between awaits, never across a network call.
pub struct ConversationEngine {
    ai: Arc<GameAI>,
    tracker: Arc<Mutex<ProgressionTracker>>,
    elaborate_on_miss: bool,
    session: Mutex<Session>,
}

impl ConversationEngine {
    pub fn new(ai: Arc<GameAI>, tracker: Arc<Mutex<ProgressionTracker>>) -> Self {
        Self {
            ai,
            tracker,
            elaborate_on_miss: false,
            session: Mutex::new(Session::new(None, None)),
        }
    }

    /// Let the character elaborate once when an answer falls short.
    pub fn with_elaboration(mut self, enabled: bool) -> Self {
        self.elaborate_on_miss = enabled;
        self
    }

    pub fn ai(&self) -> &Arc<GameAI> {
        &self.ai
    }

    pub fn tracker(&self) -> &Arc<Mutex<ProgressionTracker>> {
        &self.tracker
    }

    async fn guarded<T>(
        token: &CancellationToken,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            _ = token.cancelled() => Err(AppError::Cancelled),
            result = work => result,
        }
    }

    async fn fetch_options(
        &self,
        token: &CancellationToken,
        config: &SessionConfig,
        history: &[ChatMessage],
    ) -> Result<Vec<QuestionOption>> {
        Self::guarded(token, async {
            Ok(self
                .ai
                .generate_options(
                    &config.persona,
                    &config.context,
                    history,
                    &config.target_topic,
                    Some(&config.question),
                )
                .await)
        })
        .await
    }

    /// Installs a new session, abandoning the current one. A bound level must be unlocked.
    pub async fn load_session(&self, config: SessionConfig, level_id: Option<String>) -> Result<()> {
        if config.character_name.trim().is_empty() {
            return Err(AppError::validation("the persona has no name"));
        }
        if config.question.trim().is_empty() {
            return Err(AppError::validation("no research question chosen"));
        }
        if config.validation_criteria.is_empty() {
            return Err(AppError::validation("no validation criteria"));
        }
        if let Some(level) = level_id.as_deref() {
            self.tracker.lock().await.set_current_level(Some(level))?;
        }

        let mut session = self.session.lock().await;
        session.token.cancel();
        log::info!(
            "Loading session with {} (level {:?})",
            config.character_name,
            level_id
        );
        *session = Session::new(Some(Arc::new(config)), level_id);
        Ok(())
    }

    /// Greets the player and fetches the first options. Does nothing once started.
    pub async fn initialize(&self) -> Result<()> {
        let (id, token, config) = {
            let mut session = self.session.lock().await;
            let fresh = session.state == SessionState::Uninitialized
                || (session.state == SessionState::Ready && session.transcript.is_empty());
            if !fresh {
                log::debug!("Initialize ignored in state {}", session.state);
                return Ok(());
            }
            let config = session.config()?;
            session.state = SessionState::Initializing;
            session.error = None;
            (session.id, session.token.clone(), config)
        };

        let greeting = Self::guarded(
            &token,
            self.ai
                .generate_greeting(&config.persona, &config.character_name, &config.context),
        )
        .await;

        let seq = {
            let mut session = self.session.lock().await;
            if session.id != id {
                return Err(AppError::Cancelled);
            }
            match greeting {
                Ok(greeting) => {
                    session
                        .transcript
                        .push_character(&config.character_name, greeting);
                    session.begin_options()
                }
                Err(e) => {
                    log::error!("Greeting failed: {}", e);
                    session.state = SessionState::Uninitialized;
                    session.error = Some(e.to_string());
                    return Err(e);
                }
            }
        };

        let options = self.fetch_options(&token, &config, &[]).await;

        let mut session = self.session.lock().await;
        if session.id != id {
            return Err(AppError::Cancelled);
        }
        session.settle_options(seq, &options);
        session.state = SessionState::Ready;
        log::debug!("Session {} ready", id);
        Ok(())
    }

    /// Player message, character answer, then evaluation and new options side by side.
    pub async fn submit_turn(&self, text: &str) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("cannot send an empty message"));
        }

        let (id, token, config) = {
            let mut session = self.session.lock().await;
            match session.state {
                SessionState::Ready => {}
                SessionState::Evaluating => {
                    return Err(AppError::Busy("a turn is already being answered"));
                }
                SessionState::Initializing => {
                    return Err(AppError::Busy("the session is still initializing"));
                }
                SessionState::Uninitialized => {
                    return Err(AppError::validation("the session is not initialized"));
                }
            }
            let config = session.config()?;
            session.transcript.push_user(text);
            session.state = SessionState::Evaluating;
            session.error = None;
            (session.id, session.token.clone(), config)
        };

        let answer = Self::guarded(
            &token,
            self.ai.answer_as_character(
                &config.persona,
                &config.character_name,
                text,
                &config.context,
            ),
        )
        .await;

        let (answer, history, seq) = {
            let mut session = self.session.lock().await;
            if session.id != id {
                return Err(AppError::Cancelled);
            }
            let answer = match answer {
                Ok(answer) => answer,
                Err(e) => {
                    session.state = SessionState::Ready;
                    session.error = Some(e.to_string());
                    return Err(e);
                }
            };
            session
                .transcript
                .push_character(&config.character_name, answer.clone());
            let seq = session.begin_options();
            (answer, session.transcript.to_chat_history(), seq)
        };

        let evaluation = Self::guarded(&token, async {
            Ok(self
                .ai
                .evaluate_adequacy(
                    &config.question,
                    &answer,
                    &config.target_topic,
                    &config.validation_criteria,
                    Some(&history),
                )
                .await)
        });
        let (adequate, options) =
            tokio::join!(evaluation, self.fetch_options(&token, &config, &history));

        let adequate = matches!(adequate, Ok(true));
        let (newly_won, level_id) = {
            let mut session = self.session.lock().await;
            if session.id != id {
                return Err(AppError::Cancelled);
            }
            session.settle_options(seq, &options);
            let newly_won = adequate && !session.has_won;
            if newly_won {
                session.has_won = true;
                log::info!("Session {} won", id);
            }
            if adequate || !self.elaborate_on_miss {
                session.state = SessionState::Ready;
            }
            (newly_won, session.level_id.clone())
        };

        let mut outcome = TurnOutcome {
            answer,
            adequate,
            newly_won,
            completion: None,
            elaboration: None,
        };

        if newly_won {
            if let Some(level_id) = level_id {
                match self.tracker.lock().await.complete(&level_id) {
                    Ok(completion) => outcome.completion = Some(completion),
                    Err(e) => {
                        log::error!("Could not record completion of '{}': {}", level_id, e);
                        self.session.lock().await.error = Some(e.to_string());
                    }
                }
            }
        }

        if !adequate && self.elaborate_on_miss {
            outcome.elaboration = self.elaborate(id, &token, &config, &outcome.answer).await?;
        }

        Ok(outcome)
    }

    // One extra in-character attempt after an inadequate answer, followed by fresh options.
    async fn elaborate(
        &self,
        id: Uuid,
        token: &CancellationToken,
        config: &SessionConfig,
        previous_answer: &str,
    ) -> Result<Option<String>> {
        let elaboration = Self::guarded(
            token,
            self.ai.elaborate(
                &config.persona,
                &config.character_name,
                &config.question,
                previous_answer,
                &config.context,
            ),
        )
        .await;

        let (history, seq) = {
            let mut session = self.session.lock().await;
            if session.id != id {
                return Err(AppError::Cancelled);
            }
            let text = match &elaboration {
                Ok(text) => text.clone(),
                Err(e) => {
                    log::warn!("Elaboration failed: {}", e);
                    session.state = SessionState::Ready;
                    session.error = Some(e.to_string());
                    return Ok(None);
                }
            };
            session
                .transcript
                .push_character(&config.character_name, text);
            let seq = session.begin_options();
            (session.transcript.to_chat_history(), seq)
        };

        let options = self.fetch_options(token, config, &history).await;
        let mut session = self.session.lock().await;
        if session.id != id {
            return Err(AppError::Cancelled);
        }
        session.settle_options(seq, &options);
        session.state = SessionState::Ready;
        Ok(elaboration.ok())
    }

    /// Asks for a new set of options. Asking after a win returns the player to the
    /// conversation. A request overtaken by a newer one yields `Cancelled`.
    pub async fn regenerate_options(&self) -> Result<Vec<QuestionOption>> {
        let (id, token, config, history, seq) = {
            let mut session = self.session.lock().await;
            match session.state {
                SessionState::Ready | SessionState::Evaluating => {}
                SessionState::Initializing => {
                    return Err(AppError::Busy("the session is still initializing"));
                }
                SessionState::Uninitialized => {
                    return Err(AppError::validation("the session is not initialized"));
                }
            }
            let config = session.config()?;
            // A turn still being evaluated keeps its own win detection.
            if session.state == SessionState::Ready {
                session.has_won = false;
            }
            session.error = None;
            let seq = session.begin_options();
            let history = session.transcript.to_chat_history();
            (session.id, session.token.clone(), config, history, seq)
        };

        let options = self.fetch_options(&token, &config, &history).await;

        let mut session = self.session.lock().await;
        if session.id != id || !session.settle_options(seq, &options) {
            return Err(AppError::Cancelled);
        }
        options
    }

    /// Removes the last player message and everything after it, then refreshes options.
    /// Returns false, without any network call, when there is nothing to undo.
    pub async fn undo(&self) -> Result<bool> {
        let (id, token, config, history, seq) = {
            let mut session = self.session.lock().await;
            match session.state {
                SessionState::Evaluating => {
                    return Err(AppError::Busy("a turn is already being answered"));
                }
                SessionState::Initializing => {
                    return Err(AppError::Busy("the session is still initializing"));
                }
                SessionState::Ready | SessionState::Uninitialized => {}
            }
            if !session.transcript.truncate_last_turn() {
                return Ok(false);
            }
            let config = session.config()?;
            session.has_won = false;
            session.error = None;
            let seq = session.begin_options();
            let history = session.transcript.to_chat_history();
            (session.id, session.token.clone(), config, history, seq)
        };
        log::debug!("Undo left {} message(s)", history.len());

        let options = self.fetch_options(&token, &config, &history).await;

        let mut session = self.session.lock().await;
        if session.id != id {
            return Err(AppError::Cancelled);
        }
        session.settle_options(seq, &options);
        options.map(|_| true)
    }

    /// Empties the conversation but keeps the persona; the next `initialize` greets again.
    pub async fn clear(&self) {
        let mut session = self.session.lock().await;
        session.rotate();
        session.transcript.clear();
        session.options.clear();
        session.has_won = false;
        session.error = None;
        session.state = SessionState::Ready;
    }

    /// Drops the session entirely, persona and level included.
    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        session.token.cancel();
        *session = Session::new(None, None);
        log::debug!("Session reset");
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock().await;
        SessionSnapshot {
            session_id: session.id,
            config: session.config.clone(),
            level_id: session.level_id.clone(),
            messages: session.transcript.messages().to_vec(),
            options: session.options.clone(),
            state: session.state,
            phase: Phase::of(session.state, session.has_won),
            has_won: session.has_won,
            is_generating_options: session.options_in_flight > 0,
            error: session.error.clone(),
        }
    }
}
