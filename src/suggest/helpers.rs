//! Client and parsers for the text-generation service.
//!
//! The model is asked for structured output, but responses arrive as free
//! text often enough that every parser has a heuristic tier below the JSON
//! one, and the step generators have fixed fallbacks below that. Parse
//! problems never reach the caller as errors.

use regex::Regex;

use std::time::Duration;

use crate::internal_error::{InternalError, InternalResult};

use super::data::*;

pub const MAX_STEP_MINUTES: i64 = 120;
pub const DEFAULT_STEP_MINUTES: i64 = 30;
const MAX_MILESTONES: usize = 5;

pub const CLARIFY_SYSTEM: &str = "You are a goal assistant for a goal-tracking productivity app. Your task is to make minor clarifications to user goals with two specific improvements:\n\n1. Fix any grammar, spelling, or punctuation errors\n2. Add specificity ONLY when the goal lacks a clear metric or timeframe\n\nKeep the original wording and length as much as possible. Don't change the core intent. Do not use quotation marks in your response.\n\nExamples:\nUser: \"loose weight by summer\"\nResponse: Lose 10 kgs by summer\n\nUser: \"read more books\"\nResponse: Read 12 books this year\n\nUser: \"finish my project proposal\"\nResponse: Finish my project proposal by Friday";

pub const MILESTONES_SYSTEM: &str = "You are a milestone generator for a goal-tracking productivity app. Your task is to break down a user's goal into 4-5 specific, actionable key outcomes or milestones that will lead to the successful completion of the goal.\n\nFor each milestone:\n1. Make it specific and measurable\n2. Focus on outcomes rather than activities\n3. Ensure it represents meaningful progress\n4. Keep it concise (10 words or less)\n\nRespond ONLY with a JSON array of milestone strings. Do not include any explanations, introductions, or additional text. Example response format: [\"Complete market research survey\", \"Draft initial proposal\", \"Get stakeholder feedback\", \"Finalize documentation\"]";

pub const STEPS_SYSTEM: &str = "You are a step generator for a goal-tracking productivity app. Your task is to break down a milestone into 3-5 specific, actionable steps that will lead to the successful completion of the milestone.\n\nFor each step:\n1. Make it specific and actionable - start with a verb\n2. Keep it small and achievable (less than 2 hours of work)\n3. Make it concrete enough that the user will know exactly when it's done\n4. Include a realistic time estimate in minutes (between 15-120 minutes)\n5. Make steps sequential and logical\n6. Be creative and interesting - avoid generic steps\n7. Use vivid, specific language that creates a clear mental image\n\nRespond with a JSON array of step objects with 'text' and 'timeEstimate' properties. Example:\n[{\"text\": \"Create a mood board with 10 inspiring examples from competitors\", \"timeEstimate\": 45}, {\"text\": \"Sketch 3 homepage wireframes with different navigation styles\", \"timeEstimate\": 60}]";

pub const NEXT_STEP_SYSTEM: &str = "You are a step-by-step goal achievement assistant. Your task is to suggest the next logical step that follows from the previous steps and moves toward the milestone and goal.\nRules for generating the next step:\n1. It must be extremely specific and concrete\n2. It should take no more than 2 hours to complete\n3. It must be the smallest possible action that moves the milestone forward\n4. It must logically follow from any completed steps\n5. It must be immediately actionable\n6. Keep the step description concise (under 15 words)\n7. Focus on one single action\n8. Include a realistic time estimate in minutes (max 120)\n9. IMPORTANT: Never repeat previous steps - each step must be unique and new\n10. IMPORTANT: Look at all previous steps to ensure you don't suggest something already done\n11. Use vivid, specific language that creates a clear mental image\n12. Be creative and interesting - avoid generic steps\n\nRespond in this format:\nStep [number]: [step description]\nTime: [estimated minutes]";

#[derive(Debug, Clone)]
pub struct SuggestionConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl SuggestionConfig {
    pub fn from_env() -> SuggestionConfig {
        SuggestionConfig {
            base_url: std::env::var("RGOALS_API_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            api_key: std::env::var("RGOALS_API_KEY").ok(),
            model: std::env::var("RGOALS_MODEL")
                .unwrap_or_else(|_| "claude-3-7-sonnet-20250219".to_string()),
            timeout_secs: 60,
        }
    }
}

pub struct SuggestionClient {
    config: SuggestionConfig,
}

impl SuggestionClient {
    pub fn new(config: SuggestionConfig) -> SuggestionClient {
        SuggestionClient { config }
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Single-turn generation against the messages API. Returns the text of
    /// the first content block.
    pub fn complete(&self, system: &str, prompt: &str, temperature: f64) -> InternalResult<String> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| InternalError::from("Suggestion service is not configured"))?;

        let url = format!("{}/v1/messages", self.config.base_url);
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build();

        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": 2000,
            "temperature": temperature,
            "system": system,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = agent
            .post(&url)
            .set("Content-Type", "application/json")
            .set("x-api-key", api_key)
            .set("anthropic-version", "2023-06-01")
            .send_string(&serde_json::to_string(&body)?)?;

        let response_str = response.into_string()?;
        let json: serde_json::Value = serde_json::from_str(&response_str)?;

        json["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| InternalError::from("Suggestion response had no text content"))
    }
}

pub fn milestones_prompt(goal: &str, purpose: Option<&str>) -> String {
    match purpose {
        Some(purpose) if !purpose.trim().is_empty() => {
            format!("Goal: {}\nPurpose: {}", goal, purpose)
        }
        _ => format!("Goal: {}", goal),
    }
}

pub fn steps_prompt(request: &GenerateStepsRequest) -> String {
    let mut prompt = format!(
        "Goal: {}\nMilestone: {}",
        request.goal_title, request.milestone_title
    );
    if let Some(purpose) = request.purpose.as_ref().filter(|p| !p.trim().is_empty()) {
        prompt.push_str(&format!("\nPurpose: {}", purpose));
    }
    if let Some(due_date) = request.due_date {
        prompt.push_str(&format!("\nDue Date: {}", due_date));
    }
    prompt.push_str("\n\nBreak down this milestone into 3-5 specific, actionable steps that will lead to completing this milestone. Each step should be clear, concrete, and achievable in a single sitting.");
    prompt
}

/// Prompt for the single next step, enumerating what has and has not been
/// done so far. Step numbers are positions in the caller's display order.
pub fn next_step_prompt(request: &NextStepRequest) -> String {
    let mut prompt = format!("Goal: {}", request.goal);
    if let Some(milestone) = request.milestone.as_ref().filter(|m| !m.trim().is_empty()) {
        prompt.push_str(&format!("\nMilestone: {}", milestone));
    }
    if let Some(purpose) = request.purpose.as_ref().filter(|p| !p.trim().is_empty()) {
        prompt.push_str(&format!("\nPurpose: {}", purpose));
    }
    if let Some(due_date) = request.due_date {
        prompt.push_str(&format!("\nDue Date: {}", due_date));
    }

    let completed: Vec<(usize, &StepContext)> = request
        .steps
        .iter()
        .enumerate()
        .filter(|(_, step)| step.completed)
        .collect();
    if !completed.is_empty() {
        prompt.push_str("\n\nCompleted Steps:");
        for (index, step) in completed {
            prompt.push_str(&format!("\nStep {}: {}", index + 1, step.text));
        }
    }

    let in_progress: Vec<(usize, &StepContext)> = request
        .steps
        .iter()
        .enumerate()
        .filter(|(_, step)| !step.completed)
        .collect();
    if !in_progress.is_empty() {
        prompt.push_str("\n\nIn Progress Steps:");
        for (index, step) in in_progress {
            prompt.push_str(&format!("\nStep {}: {}", index + 1, step.text));
        }
    }

    let next_number = request.steps.len() + 1;
    prompt.push_str(&format!(
        "\n\nWhat should be Step {} for this milestone? This step must be different from all previous steps and move the milestone forward. Also estimate how many minutes this step will take (maximum 120 minutes).\n\nRespond in this format:\nStep {}: [step description]\nTime: [estimated minutes]",
        next_number, next_number
    ));
    prompt
}

/// The first bracketed JSON array in the text, brackets included.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

pub fn parse_milestones(text: &str) -> Vec<String> {
    if let Some(raw) = extract_json_array(text) {
        if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(raw) {
            let milestones: Vec<String> = values
                .iter()
                .filter_map(|value| value.as_str())
                .map(|title| title.trim().to_string())
                .filter(|title| !title.is_empty())
                .collect();
            if !milestones.is_empty() {
                return truncated(milestones, MAX_MILESTONES);
            }
        }
    }

    let lines: Vec<String> = text
        .lines()
        .map(strip_list_prefix)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty() && !line.starts_with('[') && !line.starts_with(']'))
        .collect();

    truncated(lines, MAX_MILESTONES)
}

pub fn parse_generated_steps(text: &str) -> InternalResult<Vec<GeneratedStep>> {
    if let Some(raw) = extract_json_array(text) {
        if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(raw) {
            let steps: Vec<GeneratedStep> = values.iter().filter_map(step_from_value).collect();
            if !steps.is_empty() {
                return Ok(steps);
            }
        }
    }

    // One step per line, pulling an "N min" estimate out of the text when
    // the model wrote prose instead of JSON.
    let time_re = Regex::new(r"(\d+)\s*min(ute)?s?")?;
    let parenthesized_time_re = Regex::new(r"\(\s*\d+\s*min(ute)?s?\s*\)")?;
    let numbering_re = Regex::new(r"^\d+[.)]\s*")?;

    let mut steps = vec![];
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('[') || line.starts_with(']') {
            continue;
        }

        let time_estimate = time_re
            .captures(line)
            .and_then(|captures| captures[1].parse().ok())
            .unwrap_or(DEFAULT_STEP_MINUTES);

        let text = parenthesized_time_re.replace_all(line, "");
        let text = numbering_re.replace(text.trim(), "");
        let text = text.trim().trim_end_matches('-').trim().to_string();
        if !text.is_empty() {
            steps.push(GeneratedStep {
                text,
                time_estimate,
            });
        }
    }

    Ok(steps)
}

fn step_from_value(value: &serde_json::Value) -> Option<GeneratedStep> {
    let text = value["text"].as_str()?.trim().to_string();
    if text.is_empty() {
        return None;
    }

    let time_estimate = value["timeEstimate"]
        .as_i64()
        .or_else(|| value["time_estimate"].as_i64())
        .or_else(|| {
            value["timeEstimate"]
                .as_str()
                .and_then(|raw| raw.parse().ok())
        })
        .unwrap_or(DEFAULT_STEP_MINUTES);

    Some(GeneratedStep {
        text,
        time_estimate,
    })
}

pub fn parse_next_step(text: &str) -> InternalResult<Option<(String, i64)>> {
    let step_re = Regex::new(r"Step \d+:\s*(.+)")?;
    let time_re = Regex::new(r"Time:\s*(\d+)")?;

    let step = step_re
        .captures(text)
        .map(|captures| captures[1].trim().to_string());
    let time = time_re
        .captures(text)
        .and_then(|captures| captures[1].parse::<i64>().ok());

    Ok(match (step, time) {
        (Some(step), Some(time)) if !step.is_empty() => {
            Some((step, time.min(MAX_STEP_MINUTES)))
        }
        _ => None,
    })
}

pub fn fallback_milestones(goal: &str) -> Vec<String> {
    vec![
        format!("Define what success looks like for {}", goal),
        "Map out the first concrete piece of work".to_string(),
        "Finish a rough first version end to end".to_string(),
        "Review progress and correct course".to_string(),
    ]
}

pub fn fallback_steps(milestone_title: &str) -> Vec<GeneratedStep> {
    vec![
        GeneratedStep {
            text: format!("Research best practices for {}", milestone_title),
            time_estimate: 45,
        },
        GeneratedStep {
            text: format!("Create a detailed action plan for {}", milestone_title),
            time_estimate: 30,
        },
        GeneratedStep {
            text: format!("Complete the first key task for {}", milestone_title),
            time_estimate: 60,
        },
    ]
}

fn truncated(mut items: Vec<String>, limit: usize) -> Vec<String> {
    items.truncate(limit);
    items
}

fn strip_list_prefix(line: &str) -> &str {
    let trimmed = line.trim();
    let after_digits = trimmed.trim_start_matches(|c: char| c.is_ascii_digit());
    if after_digits.len() < trimmed.len() && (after_digits.starts_with('.') || after_digits.starts_with(')')) {
        return after_digits[1..].trim_start();
    }
    trimmed
        .trim_start_matches("- ")
        .trim_start_matches("* ")
}
