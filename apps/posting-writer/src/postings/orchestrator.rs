//! Per-row orchestration: one isolated assistant thread per job posting.
//!
//! Flow: create session → context turn → short summary → alternate short summary →
//!       day in the life → ideal candidate → assemble output record.
//!
//! No retries: the first failing step aborts the row.

use std::fmt;

use tracing::{debug, info};

use crate::assistant_client::{ConversationClient, SessionId};
use crate::errors::AppError;
use crate::postings::models::{join_short_summaries, JobPostingInput, JobPostingOutput};
use crate::postings::prompts::{
    build_context_turn, ALTERNATE_SHORT_SUMMARY_PROMPT, DAY_IN_LIFE_PROMPT,
    IDEAL_CANDIDATE_PROMPT, SHORT_SUMMARY_PROMPT,
};

/// Progress of a single row. A failure reports the last stage that was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RowStage {
    Pending,
    SessionCreated,
    ContextSent,
    Q1Answered,
    Q2Answered,
    Q3Answered,
    Q4Answered,
    Written,
}

impl fmt::Display for RowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowStage::Pending => "PENDING",
            RowStage::SessionCreated => "SESSION_CREATED",
            RowStage::ContextSent => "CONTEXT_SENT",
            RowStage::Q1Answered => "Q1_ANSWERED",
            RowStage::Q2Answered => "Q2_ANSWERED",
            RowStage::Q3Answered => "Q3_ANSWERED",
            RowStage::Q4Answered => "Q4_ANSWERED",
            RowStage::Written => "WRITTEN",
        };
        f.write_str(name)
    }
}

pub struct PostingOrchestrator {
    conversation: ConversationClient,
}

impl PostingOrchestrator {
    pub fn new(conversation: ConversationClient) -> Self {
        Self { conversation }
    }

    /// Runs the full question sequence for one posting in a fresh thread.
    pub async fn process(&self, input: &JobPostingInput) -> Result<JobPostingOutput, AppError> {
        let mut stage = RowStage::Pending;
        let result = self.run_sequence(input, &mut stage).await;
        result.map_err(|source| AppError::Row {
            hris_id: input.hris_id.clone(),
            stage,
            source: Box::new(source),
        })
    }

    async fn run_sequence(
        &self,
        input: &JobPostingInput,
        stage: &mut RowStage,
    ) -> Result<JobPostingOutput, AppError> {
        let session = self.conversation.create_session().await?;
        advance(stage, RowStage::SessionCreated, &session);

        let context = build_context_turn(
            &input.position_title,
            &input.position_summary,
            input.feedback.as_deref(),
        );
        self.conversation.send(&session, &context).await?;
        advance(stage, RowStage::ContextSent, &session);
        info!(
            "Sent job details for {} to assistant (thread {})",
            input.position_title, session
        );

        let short_summary_1 = self.conversation.ask(&session, SHORT_SUMMARY_PROMPT).await?;
        advance(stage, RowStage::Q1Answered, &session);

        let short_summary_2 = self
            .conversation
            .ask(&session, ALTERNATE_SHORT_SUMMARY_PROMPT)
            .await?;
        advance(stage, RowStage::Q2Answered, &session);

        let day_in_life = self.conversation.ask(&session, DAY_IN_LIFE_PROMPT).await?;
        advance(stage, RowStage::Q3Answered, &session);

        let ideal_candidate = self.conversation.ask(&session, IDEAL_CANDIDATE_PROMPT).await?;
        advance(stage, RowStage::Q4Answered, &session);

        Ok(JobPostingOutput {
            hris_id: input.hris_id.clone(),
            position_title: input.position_title.clone(),
            short_summary: join_short_summaries(&short_summary_1, &short_summary_2),
            day_in_life,
            ideal_candidate,
        })
    }
}

fn advance(stage: &mut RowStage, next: RowStage, session: &SessionId) {
    debug!("Thread {session}: {stage} -> {next}");
    *stage = next;
}
