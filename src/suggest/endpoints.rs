use rocket::serde::json::Json;
use rocket::{post, State};
use tracing::warn;

use crate::internal_error::{InternalError, InternalResult};

use super::data::*;
use super::helpers::*;

#[post("/clarify_goal", format = "json", data = "<request>")]
pub fn clarify_goal(
    request: Json<ClarifyGoalRequest>,
    client: &State<SuggestionClient>,
) -> InternalResult<Json<ClarifyGoalResponse>> {
    if request.goal.trim().is_empty() {
        return Err(InternalError::bad_request("Goal is required"));
    }

    let text = client.complete(CLARIFY_SYSTEM, &request.goal, 1.0)?;

    // The prompt forbids quotation marks; scrub any that slip through.
    Ok(Json(ClarifyGoalResponse {
        clarified_goal: text.replace('"', "").trim().to_string(),
    }))
}

#[post("/generate_milestones", format = "json", data = "<request>")]
pub fn generate_milestones(
    request: Json<GenerateMilestonesRequest>,
    client: &State<SuggestionClient>,
) -> InternalResult<Json<GenerateMilestonesResponse>> {
    if request.goal.trim().is_empty() {
        return Err(InternalError::bad_request("Goal is required"));
    }

    let prompt = milestones_prompt(&request.goal, request.purpose.as_deref());
    let milestones = match client.complete(MILESTONES_SYSTEM, &prompt, 0.7) {
        Ok(text) => {
            let parsed = parse_milestones(&text);
            if parsed.is_empty() {
                warn!("milestone generation returned nothing usable, using fallbacks");
                fallback_milestones(&request.goal)
            } else {
                parsed
            }
        }
        Err(e) => {
            warn!("milestone generation failed: {}", e);
            fallback_milestones(&request.goal)
        }
    };

    Ok(Json(GenerateMilestonesResponse { milestones }))
}

#[post("/generate_milestone_steps", format = "json", data = "<request>")]
pub fn generate_milestone_steps(
    request: Json<GenerateStepsRequest>,
    client: &State<SuggestionClient>,
) -> InternalResult<Json<GenerateStepsResponse>> {
    if request.goal_title.trim().is_empty() || request.milestone_title.trim().is_empty() {
        return Err(InternalError::bad_request(
            "Goal title and milestone title are required",
        ));
    }

    let prompt = steps_prompt(&request);
    let steps = match client.complete(STEPS_SYSTEM, &prompt, 0.7) {
        Ok(text) => match parse_generated_steps(&text) {
            Ok(steps) if !steps.is_empty() => steps,
            _ => {
                warn!("step generation returned nothing usable, using fallbacks");
                fallback_steps(&request.milestone_title)
            }
        },
        Err(e) => {
            warn!("step generation failed: {}", e);
            fallback_steps(&request.milestone_title)
        }
    };

    Ok(Json(GenerateStepsResponse { steps }))
}

#[post("/generate_next_step", format = "json", data = "<request>")]
pub fn generate_next_step(
    request: Json<NextStepRequest>,
    client: &State<SuggestionClient>,
) -> InternalResult<Json<NextStepResponse>> {
    if request.goal.trim().is_empty() {
        return Err(InternalError::bad_request("Goal is required"));
    }

    let prompt = next_step_prompt(&request);
    let text = client.complete(NEXT_STEP_SYSTEM, &prompt, 0.7)?;

    let (next_step, time_estimate) = match parse_next_step(&text)? {
        Some(parsed) => parsed,
        None => {
            warn!("next-step response had an unexpected format, using fallback");
            (
                format!("Plan the next concrete action for {}", request.goal),
                DEFAULT_STEP_MINUTES,
            )
        }
    };

    Ok(Json(NextStepResponse {
        next_step,
        time_estimate,
    }))
}
