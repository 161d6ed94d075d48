//! Scripted answer engine for tests.
//!
//! Rules are matched in insertion order against the prompt; the first rule whose
//! needle occurs in the prompt supplies the answer. Rules may carry a delay so
//! tests can force out-of-order completion.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{AnswerEngine, LlmError};

struct Rule {
    needle: String,
    answer: Result<String, ()>,
    delay: Duration,
}

#[derive(Default)]
pub struct ScriptedEngine {
    rules: Vec<Rule>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, needle: &str, answer: &str) -> Self {
        self.answer_after(needle, answer, Duration::ZERO)
    }

    pub fn answer_after(mut self, needle: &str, answer: &str, delay: Duration) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            answer: Ok(answer.to_string()),
            delay,
        });
        self
    }

    /// Prompts containing `needle` fail at the transport level.
    pub fn fail(mut self, needle: &str) -> Self {
        self.rules.push(Rule {
            needle: needle.to_string(),
            answer: Err(()),
            delay: Duration::ZERO,
        });
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AnswerEngine for ScriptedEngine {
    async fn submit(&self, prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let rule = self.rules.iter().find(|r| prompt.contains(&r.needle));
        let delay = rule.map(|r| r.delay).unwrap_or(Duration::ZERO);
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match rule {
            Some(Rule { answer: Ok(text), .. }) => Ok(text.clone()),
            Some(Rule { answer: Err(()), .. }) => Err(LlmError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            }),
            None => Err(LlmError::EmptyContent),
        }
    }
}
