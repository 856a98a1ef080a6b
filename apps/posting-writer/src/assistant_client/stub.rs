//! In-memory scripted backend for tests. Deterministic, no network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AssistantBackend, Role, RunHandle, RunState, RunStatus, SessionId, Turn};
use crate::errors::AppError;

type Responder = Box<dyn Fn(&[String]) -> String + Send + Sync>;
type StallPredicate = Box<dyn Fn(&[String]) -> bool + Send + Sync>;

pub struct StubBackend {
    responder: Responder,
    stall_when: Option<StallPredicate>,
    polls_before_terminal: u32,
    terminal: RunStatus,
    terminal_error: Option<String>,
    never_completes: bool,
    replies: bool,
    replying_runs: Option<u32>,
    state: Mutex<StubState>,
}

#[derive(Default)]
struct StubState {
    next_id: u32,
    threads: HashMap<String, Vec<(Role, String)>>,
    runs: HashMap<String, StubRun>,
    status_polls: u32,
    runs_started: u32,
}

struct StubRun {
    session: SessionId,
    polls: u32,
    reply: String,
    silent: bool,
    stalled: bool,
    delivered: bool,
}

impl StubBackend {
    /// Replies with `respond(latest_user_prompt)`; runs complete on the first poll.
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::with_history(move |turns| respond(turns.last().map(String::as_str).unwrap_or("")))
    }

    /// Replies with `respond(all_user_turns_in_thread)`.
    pub fn with_history<F>(respond: F) -> Self
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(respond),
            stall_when: None,
            polls_before_terminal: 0,
            terminal: RunStatus::Completed,
            terminal_error: None,
            never_completes: false,
            replies: true,
            replying_runs: None,
            state: Mutex::new(StubState::default()),
        }
    }

    pub fn completing_after(mut self, in_progress_polls: u32) -> Self {
        self.polls_before_terminal = in_progress_polls;
        self
    }

    pub fn never_completing(mut self) -> Self {
        self.never_completes = true;
        self
    }

    /// Runs in threads whose user turns match `predicate` stay `in_progress` forever.
    pub fn stalling_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        self.stall_when = Some(Box::new(predicate));
        self
    }

    pub fn ending_with(mut self, status: RunStatus, last_error: Option<&str>) -> Self {
        self.terminal = status;
        self.terminal_error = last_error.map(str::to_string);
        self
    }

    pub fn without_replies(mut self) -> Self {
        self.replies = false;
        self
    }

    /// Runs after the first `runs` still complete, but add no assistant turn.
    pub fn replying_to_first_runs(mut self, runs: u32) -> Self {
        self.replying_runs = Some(runs);
        self
    }

    pub fn status_polls(&self) -> u32 {
        self.state.lock().unwrap().status_polls
    }

    pub fn runs_started(&self) -> u32 {
        self.state.lock().unwrap().runs_started
    }

    pub fn thread_count(&self) -> usize {
        self.state.lock().unwrap().threads.len()
    }

    /// User turns of a thread in the order they were sent.
    pub fn user_turns(&self, session: &SessionId) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .threads
            .get(&session.0)
            .map(|turns| {
                turns
                    .iter()
                    .filter(|(role, _)| *role == Role::User)
                    .map(|(_, text)| text.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// User turns of every thread, in thread creation order.
    pub fn all_user_turns(&self) -> Vec<Vec<String>> {
        let count = self.thread_count();
        (1..=count)
            .map(|n| self.user_turns(&SessionId(format!("thread_{n}"))))
            .collect()
    }
}

fn unknown(what: &str, id: &str) -> AppError {
    AppError::Api {
        status: 404,
        message: format!("No {what} found with id '{id}'."),
    }
}

#[async_trait]
impl AssistantBackend for StubBackend {
    async fn create_thread(&self) -> Result<SessionId, AppError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("thread_{}", state.next_id);
        state.threads.insert(id.clone(), Vec::new());
        Ok(SessionId(id))
    }

    async fn add_user_turn(&self, session: &SessionId, content: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        let thread = state
            .threads
            .get_mut(&session.0)
            .ok_or_else(|| unknown("thread", &session.0))?;
        thread.push((Role::User, content.to_string()));
        Ok(())
    }

    async fn start_run(&self, session: &SessionId) -> Result<RunHandle, AppError> {
        let user_turns = self.user_turns(session);
        let mut state = self.state.lock().unwrap();
        if !state.threads.contains_key(&session.0) {
            return Err(unknown("thread", &session.0));
        }

        let stalled = self.never_completes
            || self
                .stall_when
                .as_ref()
                .map(|predicate| predicate(&user_turns))
                .unwrap_or(false);

        state.runs_started += 1;
        let run_id = format!("run_{}", state.runs_started);
        let silent = self
            .replying_runs
            .map_or(false, |limit| state.runs_started > limit);
        state.runs.insert(
            run_id.clone(),
            StubRun {
                session: session.clone(),
                polls: 0,
                reply: (self.responder)(&user_turns),
                silent,
                stalled,
                delivered: false,
            },
        );

        Ok(RunHandle {
            session: session.clone(),
            run_id,
        })
    }

    async fn run_status(&self, run: &RunHandle) -> Result<RunState, AppError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.status_polls += 1;

        let stub_run = state
            .runs
            .get_mut(&run.run_id)
            .ok_or_else(|| unknown("run", &run.run_id))?;
        stub_run.polls += 1;

        if stub_run.stalled || stub_run.polls <= self.polls_before_terminal {
            return Ok(RunState {
                status: RunStatus::InProgress,
                last_error: None,
            });
        }

        if self.terminal != RunStatus::Completed {
            return Ok(RunState {
                status: self.terminal,
                last_error: self.terminal_error.clone(),
            });
        }

        if self.replies && !stub_run.silent && !stub_run.delivered {
            if let Some(thread) = state.threads.get_mut(&stub_run.session.0) {
                thread.push((Role::Assistant, stub_run.reply.clone()));
            }
        }
        stub_run.delivered = true;

        Ok(RunState {
            status: RunStatus::Completed,
            last_error: None,
        })
    }

    async fn list_turns(&self, session: &SessionId) -> Result<Vec<Turn>, AppError> {
        let state = self.state.lock().unwrap();
        let thread = state
            .threads
            .get(&session.0)
            .ok_or_else(|| unknown("thread", &session.0))?;
        Ok(thread
            .iter()
            .rev()
            .map(|(role, text)| Turn {
                role: *role,
                text: Some(text.clone()),
            })
            .collect())
    }
}
