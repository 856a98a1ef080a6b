/// Assistant Client: the single point of entry for all assistant API calls.
///
/// ARCHITECTURAL RULE: No other module may talk to the provider directly.
/// Orchestration code only sees `ConversationClient`; the wire protocol lives
/// behind the `AssistantBackend` trait.
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::errors::AppError;

pub mod openai;
#[cfg(test)]
pub mod stub;

pub use openai::OpenAiAssistants;

/// Opaque handle to one remote thread. One per job posting, never shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A run in flight on a given thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub session: SessionId,
    pub run_id: String,
}

/// Lifecycle states a run reports while polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Statuses after which the run will never reach `completed`.
    /// `requires_action` counts: no tools are registered, so nothing would ever submit outputs.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Incomplete
                | RunStatus::Expired
                | RunStatus::RequiresAction
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a run returned by one status poll.
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub status: RunStatus,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single message within a thread.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    /// First text block of the message, if it had one.
    pub text: Option<String>,
}

/// Provider operations the conversation client is built on.
/// Implement this to swap providers (or to script one in tests).
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn create_thread(&self) -> Result<SessionId, AppError>;

    async fn add_user_turn(&self, session: &SessionId, content: &str) -> Result<(), AppError>;

    /// Starts the pre-registered assistant over everything in the thread so far.
    async fn start_run(&self, session: &SessionId) -> Result<RunHandle, AppError>;

    async fn run_status(&self, run: &RunHandle) -> Result<RunState, AppError>;

    /// Turns in the thread, newest first.
    async fn list_turns(&self, session: &SessionId) -> Result<Vec<Turn>, AppError>;
}

/// How `ask` waits for a run to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls forever.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: Some(600),
        }
    }
}

/// Conversation-level API: sessions, plain turns and question/answer exchanges.
#[derive(Clone)]
pub struct ConversationClient {
    backend: Arc<dyn AssistantBackend>,
    poll: PollPolicy,
}

impl ConversationClient {
    pub fn new(backend: Arc<dyn AssistantBackend>, poll: PollPolicy) -> Self {
        Self { backend, poll }
    }

    /// Opens a new isolated thread.
    pub async fn create_session(&self) -> Result<SessionId, AppError> {
        let session = self.backend.create_thread().await?;
        debug!("Created session {session}");
        Ok(session)
    }

    /// Appends a user turn without running the assistant.
    pub async fn send(&self, session: &SessionId, content: &str) -> Result<(), AppError> {
        self.backend.add_user_turn(session, content).await
    }

    /// Appends `prompt`, runs the assistant over the whole thread, waits for the run
    /// to complete and returns the newest assistant reply, trimmed.
    pub async fn ask(&self, session: &SessionId, prompt: &str) -> Result<String, AppError> {
        self.backend.add_user_turn(session, prompt).await?;
        let run = self.backend.start_run(session).await?;
        self.wait_for_completion(&run).await?;
        self.latest_reply(session).await
    }

    /// Polls the run until it completes, fails, or the attempt bound is hit.
    pub async fn wait_for_completion(&self, run: &RunHandle) -> Result<(), AppError> {
        let mut attempts: u32 = 0;
        loop {
            let state = self.backend.run_status(run).await?;
            attempts += 1;
            debug!(
                "Run {} poll {}: status={}",
                run.run_id, attempts, state.status
            );

            if state.status == RunStatus::Completed {
                return Ok(());
            }

            if state.status.is_failure() {
                return Err(AppError::RunFailed {
                    run_id: run.run_id.clone(),
                    status: state.status,
                    message: state
                        .last_error
                        .unwrap_or_else(|| "no error detail reported".to_string()),
                });
            }

            if let Some(max) = self.poll.max_attempts {
                if attempts >= max {
                    return Err(AppError::RunTimeout {
                        run_id: run.run_id.clone(),
                        attempts,
                    });
                }
            }

            tokio::time::sleep(self.poll.interval).await;
        }
    }

    /// Only assistant turns newer than the most recent user turn answer the prompt.
    async fn latest_reply(&self, session: &SessionId) -> Result<String, AppError> {
        let turns = self.backend.list_turns(session).await?;
        turns
            .into_iter()
            .take_while(|t| t.role != Role::User)
            .find(|t| t.role == Role::Assistant)
            .and_then(|t| t.text)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| AppError::EmptyReply(session.to_string()))
    }
}
