// All assistant prompt text for the posting pipeline.
// Order of the questions matters: each one sees every earlier turn of the thread.

/// Context turn. Replace `{position_title}` and `{position_summary}` before sending.
pub const CONTEXT_TEMPLATE: &str = "Here is a job description for the role of {position_title}:

{position_summary}
";

/// Appended to the context turn when the row carries feedback. Replace `{feedback}`.
pub const FEEDBACK_TEMPLATE: &str = "
Additional Feedback:
{feedback}";

pub const SHORT_SUMMARY_PROMPT: &str =
    "Please provide a short summary of the job description in one engaging sentence.";

pub const ALTERNATE_SHORT_SUMMARY_PROMPT: &str =
    "Please provide a different short summary of the job description in one engaging sentence.";

pub const DAY_IN_LIFE_PROMPT: &str = "Please provide the job overview.";

pub const IDEAL_CANDIDATE_PROMPT: &str = "List key skills, soft skills, or personality traits needed for this role, with each trait being six words or fewer, separated by |.";

/// Builds the context turn for one posting.
pub fn build_context_turn(
    position_title: &str,
    position_summary: &str,
    feedback: Option<&str>,
) -> String {
    let mut turn = CONTEXT_TEMPLATE
        .replace("{position_title}", position_title)
        .replace("{position_summary}", position_summary);

    if let Some(feedback) = feedback {
        turn.push_str(&FEEDBACK_TEMPLATE.replace("{feedback}", feedback));
    }

    turn
}
