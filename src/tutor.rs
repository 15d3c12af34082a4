//! AI tutor helpers: free-form answers and multiple-choice question sets.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::ai::{complete_text, extract_object, response_text, CompletionRequest, CompletionService, ModelTier};
use crate::config::Prompts;
use crate::domain::McqSet;
use crate::error::AiError;
use crate::util::{fill_template, trunc_for_log};

pub const EMPTY_PROMPT_REPLY: &str = "Please provide a valid question.";
pub const DEFAULT_MCQ_COUNT: u32 = 5;
pub const DEFAULT_MCQ_DIFFICULTY: &str = "medium";
const MAX_MCQ_COUNT: u32 = 20;

/// Answer one learner question. Blank prompts are answered locally.
#[instrument(level = "info", skip(ai, prompts, prompt), fields(prompt_len = prompt.len()))]
pub async fn answer(ai: &dyn CompletionService, prompts: &Prompts, prompt: &str) -> Result<String, AiError> {
  let prompt = prompt.trim();
  if prompt.is_empty() {
    return Ok(EMPTY_PROMPT_REPLY.to_string());
  }
  let request = CompletionRequest {
    tier: ModelTier::Fast,
    system: prompts.tutor_system.clone(),
    user: prompt.to_string(),
    temperature: 0.7,
    max_output_tokens: Some(450),
    structured: false,
  };
  let reply = complete_text(ai, request).await?;
  debug!(target: "tutor", reply_len = reply.len(), "Tutor answered");
  Ok(reply)
}

/// Either a parsed question set or the model's text when it could not be read.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum McqOutcome {
  Set(McqSet),
  Raw { raw: String },
}

pub fn clamp_mcq_count(count: Option<i64>) -> u32 {
  count.unwrap_or(DEFAULT_MCQ_COUNT as i64).clamp(1, MAX_MCQ_COUNT as i64) as u32
}

#[instrument(level = "info", skip_all, fields(%topic, %difficulty, count = count))]
pub async fn generate_mcq(
  ai: &dyn CompletionService,
  prompts: &Prompts,
  topic: &str,
  difficulty: &str,
  count: u32,
) -> Result<McqOutcome, AiError> {
  let count_s = count.to_string();
  let request = CompletionRequest {
    tier: ModelTier::Fast,
    system: prompts.mcq_system.clone(),
    user: fill_template(
      &prompts.mcq_user_template,
      &[("count", &count_s), ("topic", topic), ("difficulty", difficulty)],
    ),
    temperature: 0.2,
    max_output_tokens: Some(800),
    structured: true,
  };
  let raw = ai.complete(request).await?;

  let parsed = extract_object(&raw)
    .map_err(|e| e.to_string())
    .and_then(|doc| serde_json::from_value::<McqSet>(Value::Object(doc)).map_err(|e| e.to_string()));

  match parsed {
    Ok(mut set) => {
      if set.topic.is_empty() { set.topic = topic.to_string(); }
      if set.difficulty.is_empty() { set.difficulty = difficulty.to_string(); }
      debug!(target: "tutor", questions = set.questions.len(), "MCQ set generated");
      Ok(McqOutcome::Set(set))
    }
    Err(reason) => {
      let text = response_text(&raw);
      warn!(target: "tutor", %topic, %reason, raw = %trunc_for_log(&text, 300), "MCQ response not usable; returning raw text");
      Ok(McqOutcome::Raw { raw: text })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ai::testing::{Reply, ScriptedService};
  use serde_json::json;

  #[tokio::test]
  async fn blank_prompt_skips_the_model() {
    let svc = ScriptedService::new(Reply::text("unused"), Reply::text("unused"));
    let out = answer(&svc, &Prompts::default(), "   ").await.unwrap();
    assert_eq!(out, EMPTY_PROMPT_REPLY);
    assert!(svc.calls.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn answer_uses_fast_tier_and_tutor_prompt() {
    let svc = ScriptedService::new(Reply::text("unused"), Reply::text("  A vector has magnitude and direction. "));
    let out = answer(&svc, &Prompts::default(), "What is a vector?").await.unwrap();
    assert_eq!(out, "A vector has magnitude and direction.");
    let calls = svc.calls.lock().unwrap();
    assert_eq!(calls[0].tier, ModelTier::Fast);
    assert_eq!(calls[0].system, Prompts::default().tutor_system);
    assert_eq!(calls[0].max_output_tokens, Some(450));
  }

  #[test]
  fn count_is_clamped() {
    assert_eq!(clamp_mcq_count(None), 5);
    assert_eq!(clamp_mcq_count(Some(0)), 1);
    assert_eq!(clamp_mcq_count(Some(100)), 20);
  }

  #[tokio::test]
  async fn fenced_mcq_json_is_parsed() {
    let body = format!(
      "```json\n{}\n```",
      json!({ "questions": [{ "question": "2+2?", "choices": ["3", "4", "5", "6"], "answer_index": 1, "explanation": "Basic." }] })
    );
    let svc = ScriptedService::new(Reply::text("unused"), Reply::text(body));
    let out = generate_mcq(&svc, &Prompts::default(), "Arithmetic", "easy", 1).await.unwrap();
    match out {
      McqOutcome::Set(set) => {
        assert_eq!(set.topic, "Arithmetic");
        assert_eq!(set.difficulty, "easy");
        assert_eq!(set.questions[0].answer_index, 1);
      }
      other => panic!("unexpected {other:?}"),
    }
    assert!(svc.calls.lock().unwrap()[0].user.contains("Create 1 multiple-choice questions for topic 'Arithmetic'"));
  }

  #[tokio::test]
  async fn unreadable_mcq_falls_back_to_raw() {
    let svc = ScriptedService::new(Reply::text("unused"), Reply::text("Here are some questions: none."));
    let out = generate_mcq(&svc, &Prompts::default(), "Rust", "medium", 3).await.unwrap();
    assert_eq!(serde_json::to_value(&out).unwrap(), json!({ "raw": "Here are some questions: none." }));
  }
}
