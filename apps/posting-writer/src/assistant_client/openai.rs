//! OpenAI Assistants v2 backend over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AssistantBackend, Role, RunHandle, RunState, RunStatus, SessionId, Turn};
use crate::errors::AppError;

pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
const ASSISTANTS_BETA_HEADER: &str = "assistants=v2";
const REQUEST_TIMEOUT_SECS: u64 = 120;
/// Enough history to find the newest assistant turn behind any trailing user turns.
const MESSAGE_PAGE_LIMIT: u32 = 20;

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: RunStatus,
    #[serde(default)]
    last_error: Option<RunError>,
}

#[derive(Debug, Deserialize)]
struct RunError {
    code: Option<String>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    role: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<TextContent>,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    value: String,
}

impl MessageObject {
    fn into_turn(self) -> Option<Turn> {
        let role = match self.role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => return None,
        };
        let text = self
            .content
            .into_iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text)
            .map(|t| t.value);
        Some(Turn { role, text })
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

/// Talks to a pre-registered assistant. The assistant id is fixed for the client's lifetime.
#[derive(Clone)]
pub struct OpenAiAssistants {
    client: Client,
    base_url: String,
    api_key: String,
    assistant_id: String,
}

impl OpenAiAssistants {
    pub fn with_base_url(
        api_key: String,
        assistant_id: String,
        base_url: String,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            assistant_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA_HEADER)
    }

    /// Sends the request once and decodes a 2xx JSON body. No retries.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T, AppError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            if status.as_u16() == 429 || status.is_server_error() {
                warn!("{operation} returned {status}: {message}");
                return Err(AppError::ServiceUnavailable(format!(
                    "{operation} returned {status}: {message}"
                )));
            }

            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| transport_error(operation, e))
    }
}

fn transport_error(operation: &str, err: reqwest::Error) -> AppError {
    if err.is_decode() {
        AppError::Internal(anyhow::anyhow!(
            "{operation}: unexpected response body: {err}"
        ))
    } else {
        AppError::ServiceUnavailable(format!("{operation}: {err}"))
    }
}

#[async_trait]
impl AssistantBackend for OpenAiAssistants {
    async fn create_thread(&self) -> Result<SessionId, AppError> {
        let thread: ThreadObject = self
            .send_json(
                self.client
                    .post(self.url("/threads"))
                    .json(&serde_json::json!({})),
                "create thread",
            )
            .await?;
        Ok(SessionId(thread.id))
    }

    async fn add_user_turn(&self, session: &SessionId, content: &str) -> Result<(), AppError> {
        let _: serde_json::Value = self
            .send_json(
                self.client
                    .post(self.url(&format!("/threads/{}/messages", session.0)))
                    .json(&CreateMessageRequest {
                        role: "user",
                        content,
                    }),
                "create message",
            )
            .await?;
        Ok(())
    }

    async fn start_run(&self, session: &SessionId) -> Result<RunHandle, AppError> {
        let run: RunObject = self
            .send_json(
                self.client
                    .post(self.url(&format!("/threads/{}/runs", session.0)))
                    .json(&CreateRunRequest {
                        assistant_id: &self.assistant_id,
                    }),
                "create run",
            )
            .await?;

        debug!("Started run {} on thread {}: {}", run.id, session, run.status);

        Ok(RunHandle {
            session: session.clone(),
            run_id: run.id,
        })
    }

    async fn run_status(&self, run: &RunHandle) -> Result<RunState, AppError> {
        let object: RunObject = self
            .send_json(
                self.client.get(self.url(&format!(
                    "/threads/{}/runs/{}",
                    run.session.0, run.run_id
                ))),
                "retrieve run",
            )
            .await?;

        Ok(RunState {
            status: object.status,
            last_error: object.last_error.map(|e| match e.code {
                Some(code) => format!("{code}: {}", e.message),
                None => e.message,
            }),
        })
    }

    async fn list_turns(&self, session: &SessionId) -> Result<Vec<Turn>, AppError> {
        let list: MessageList = self
            .send_json(
                self.client
                    .get(self.url(&format!("/threads/{}/messages", session.0)))
                    .query(&[
                        ("order", "desc".to_string()),
                        ("limit", MESSAGE_PAGE_LIMIT.to_string()),
                    ]),
                "list messages",
            )
            .await?;

        Ok(list
            .data
            .into_iter()
            .filter_map(MessageObject::into_turn)
            .collect())
    }
}
